//! Loam CLI - Command-line interface for seeding staged content
//!
//! Parses arguments and environment configuration, then drives the
//! reconciliation pipeline from `loam-core` over the `loam-client`
//! transport.

pub mod config;

pub use config::{Command, Config, StageArg};
