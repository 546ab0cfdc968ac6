//! Loam Core - Domain types, reconciliation pipeline, and configuration.

pub mod config;
pub mod error;
pub mod outcome;
pub mod reconcile;
pub mod record;
pub mod source;

pub use config::{default_bindings_path, load_bindings, BindingsCatalog, HttpConfig};
pub use error::SeedError;
pub use outcome::{RecordReport, RunOutcome, RunSummary};
pub use reconcile::{ContentStore, Reconciler};
pub use record::{
    CollectionBinding, RecordDescriptor, RelationBinding, RemoteId, RemoteRecord, Stage,
};
pub use source::{DatasetSource, InMemorySource, JsonSource};
