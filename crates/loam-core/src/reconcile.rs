//! The reconciliation pipeline.
//!
//! Every record makes a strict four-phase trip: resolve relation
//! prerequisites, check existence by natural key in DRAFT, create or update,
//! publish. Each phase is gated on the previous one, failures are isolated
//! at the record boundary, and the pipeline is idempotent: a re-run turns a
//! second create into an update and republishing is a no-op on the remote
//! side.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::SeedError;
use crate::outcome::{RecordReport, RunOutcome, RunSummary};
use crate::record::{CollectionBinding, RecordDescriptor, RemoteId, RemoteRecord, Stage};

/// Remote operations the pipeline needs from the content repository.
///
/// The GraphQL client implements this against the real API; tests script it
/// with an in-memory stub.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Returns the IDs of entries whose `key_field` equals `key` at `stage`.
    async fn lookup(
        &self,
        query_field: &str,
        key_field: &str,
        key: &str,
        stage: Stage,
    ) -> Result<Vec<RemoteId>, SeedError>;

    /// Creates a draft entry and returns its ID.
    async fn create(
        &self,
        binding: &CollectionBinding,
        data: Value,
    ) -> Result<RemoteId, SeedError>;

    /// Converges the fields of an existing draft entry.
    async fn update(
        &self,
        binding: &CollectionBinding,
        id: &RemoteId,
        data: Value,
    ) -> Result<(), SeedError>;

    /// Promotes a draft entry to PUBLISHED.
    async fn publish(&self, binding: &CollectionBinding, id: &RemoteId) -> Result<(), SeedError>;

    /// Lists entries of a collection at the given stage.
    async fn list(
        &self,
        binding: &CollectionBinding,
        stage: Stage,
        limit: usize,
    ) -> Result<Vec<RemoteRecord>, SeedError>;
}

/// Outcome of the prerequisite phase.
enum Resolution {
    Resolved(BTreeMap<String, Vec<RemoteId>>),
    Missing { field: String, key: String },
}

/// Drives dataset records to "exists in DRAFT with these values, and is
/// PUBLISHED" against one collection of the content repository.
pub struct Reconciler<'a, S: ContentStore> {
    store: &'a S,
    binding: &'a CollectionBinding,
}

impl<'a, S: ContentStore> Reconciler<'a, S> {
    pub fn new(store: &'a S, binding: &'a CollectionBinding) -> Self {
        Self { store, binding }
    }

    /// Reconciles a dataset record by record.
    ///
    /// Records are processed strictly in order; one record finishes its
    /// publish before the next starts. Per-record failures are folded into
    /// the summary and never abort the run.
    pub async fn run(&self, records: &[RecordDescriptor]) -> RunSummary {
        let total = records.len();
        info!(
            "Reconciling {} records into collection '{}'",
            total, self.binding.name
        );

        let mut summary = RunSummary::new();
        for (i, record) in records.iter().enumerate() {
            info!("[{}/{}] Processing '{}'", i + 1, total, record.key);
            let report = self.reconcile(record).await;
            summary.record_report(&report);
        }
        summary
    }

    /// Runs a single record through the four phases.
    pub async fn reconcile(&self, record: &RecordDescriptor) -> RecordReport {
        // Static descriptor checks run before any remote call.
        if let Err(e) = self.binding.validate_record(record) {
            warn!("Skipping '{}': {}", record.key, e);
            return RecordReport::halted(RunOutcome::Skipped);
        }

        // Phase 1: resolve relation prerequisites in DRAFT.
        let resolved = match self.resolve_relations(record).await {
            Ok(Resolution::Resolved(resolved)) => resolved,
            Ok(Resolution::Missing { field, key }) => {
                warn!(
                    "Prerequisite missing for '{}': relation '{}' has no draft entry '{}'",
                    record.key, field, key
                );
                return RecordReport::halted(RunOutcome::PrereqMissing);
            }
            Err(e) => {
                warn!("Skipping '{}': relation lookup failed: {}", record.key, e);
                return RecordReport::halted(RunOutcome::Skipped);
            }
        };

        // Phase 2: existence check by natural key in DRAFT.
        let matches = match self
            .store
            .lookup(
                &self.binding.query_field,
                &self.binding.key_field,
                &record.key,
                Stage::Draft,
            )
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Skipping '{}': existence check failed: {}", record.key, e);
                return RecordReport::halted(RunOutcome::Skipped);
            }
        };

        let existing = match matches.as_slice() {
            [] => None,
            [id] => Some(id.clone()),
            _ => {
                // Writing against an ambiguous key could hit the wrong entry.
                let e = SeedError::AmbiguousKey {
                    key: record.key.clone(),
                    matches: matches.len(),
                };
                warn!("Skipping '{}': {}", record.key, e);
                return RecordReport::halted(RunOutcome::Skipped);
            }
        };

        // Phase 3: create with connect or update with set.
        let (id, write) = match existing {
            Some(id) => {
                let data = match self.binding.update_payload(record, &resolved) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("Skipping '{}': {}", record.key, e);
                        return RecordReport::halted(RunOutcome::Skipped);
                    }
                };
                match self.store.update(self.binding, &id, data).await {
                    Ok(()) => {
                        info!("Updated '{}' (ID {})", record.key, id);
                        (id, RunOutcome::Updated)
                    }
                    Err(e) => {
                        error!("Failed to update '{}' (ID {}): {}", record.key, id, e);
                        return RecordReport::halted(RunOutcome::UpdateFailed);
                    }
                }
            }
            None => {
                let data = match self.binding.create_payload(record, &resolved) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("Skipping '{}': {}", record.key, e);
                        return RecordReport::halted(RunOutcome::Skipped);
                    }
                };
                match self.store.create(self.binding, data).await {
                    Ok(id) => {
                        info!("Created '{}' with ID {}", record.key, id);
                        (id, RunOutcome::Created)
                    }
                    Err(e) => {
                        error!("Failed to create '{}': {}", record.key, e);
                        return RecordReport::halted(RunOutcome::CreateFailed);
                    }
                }
            }
        };

        // Phase 4: promote to PUBLISHED. A failure here leaves the draft
        // write standing; a re-run converges it.
        match self.store.publish(self.binding, &id).await {
            Ok(()) => {
                info!("Published '{}' (ID {})", record.key, id);
                RecordReport::published(write)
            }
            Err(e) => {
                warn!("Failed to publish '{}' (ID {}): {}", record.key, id, e);
                RecordReport::publish_failed(write)
            }
        }
    }

    /// Resolves every relation reference to a remote ID in DRAFT.
    ///
    /// A lookup returning several entries takes the first; only the record's
    /// own existence check treats a multi-match as fatal.
    async fn resolve_relations(
        &self,
        record: &RecordDescriptor,
    ) -> Result<Resolution, SeedError> {
        let mut resolved = BTreeMap::new();

        for (field, keys) in &record.relations {
            let relation = self.binding.relation(field).ok_or_else(|| {
                SeedError::Data(format!(
                    "collection '{}' has no relation field '{}'",
                    self.binding.name, field
                ))
            })?;

            let mut ids = Vec::with_capacity(keys.len());
            for key in keys {
                let matches = self
                    .store
                    .lookup(
                        &relation.target_query_field,
                        &relation.target_key_field,
                        key,
                        Stage::Draft,
                    )
                    .await?;

                match matches.first() {
                    Some(id) => ids.push(id.clone()),
                    None => {
                        return Ok(Resolution::Missing {
                            field: field.clone(),
                            key: key.clone(),
                        })
                    }
                }
            }
            resolved.insert(field.clone(), ids);
        }

        Ok(Resolution::Resolved(resolved))
    }
}
