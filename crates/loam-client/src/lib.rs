//! Loam Client - GraphQL access to the staged content API
//!
//! This crate provides the HTTP layer between the reconciliation pipeline
//! and the content repository:
//!
//! - [`graphql`] - low-level GraphQL-over-HTTP transport with bounded retry
//! - [`cms`] - the [`loam_core::reconcile::ContentStore`] implementation
//!
//! # Overview
//!
//! The transport handles authentication, per-call stage selection, retry on
//! transient failures, and splitting transport-level from service-level
//! errors. The CMS client builds the operation documents from collection
//! bindings and parses their payloads.

pub mod cms;
pub mod graphql;

// Re-export main client types
pub use cms::CmsClient;
pub use graphql::GraphQlClient;
