//! Per-record outcomes and run-level aggregate reporting.
//!
//! Each record contributes one write-phase outcome, and additionally one
//! publish outcome when a write succeeded. The summary is the only state
//! that outlives a run besides the remote mutations already committed.

use std::fmt;

/// Outcome of processing a single record during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Record could not be processed before a write was attempted
    Skipped,
    /// No draft entry matched the natural key - a new entry was created
    Created,
    /// A draft entry matched the natural key - its fields were converged
    Updated,
    /// The entry was promoted from DRAFT to PUBLISHED
    Published,
    /// The create mutation failed
    CreateFailed,
    /// The update mutation failed
    UpdateFailed,
    /// The entry was written but could not be published
    PublishFailed,
    /// A relation reference did not resolve to an existing entry
    PrereqMissing,
}

/// Result of one record's trip through the pipeline.
///
/// The write outcome and the publish outcome land in separate summary
/// buckets, so a created and published record counts once as `Created` and
/// once as `Published`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordReport {
    pub write: RunOutcome,
    pub publish: Option<RunOutcome>,
}

impl RecordReport {
    /// Creates a report for a record that never reached the publish phase.
    pub fn halted(write: RunOutcome) -> Self {
        Self {
            write,
            publish: None,
        }
    }

    /// Creates a report for a written and successfully published record.
    pub fn published(write: RunOutcome) -> Self {
        Self {
            write,
            publish: Some(RunOutcome::Published),
        }
    }

    /// Creates a report for a written record whose publish failed.
    pub fn publish_failed(write: RunOutcome) -> Self {
        Self {
            write,
            publish: Some(RunOutcome::PublishFailed),
        }
    }

    /// Returns true if the record did not fully converge.
    pub fn is_failure(&self) -> bool {
        !matches!(self.write, RunOutcome::Created | RunOutcome::Updated)
            || self.publish != Some(RunOutcome::Published)
    }
}

/// Counters for one seeding run.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    pub published: usize,
    pub create_failed: usize,
    pub update_failed: usize,
    pub publish_failed: usize,
    pub prereq_missing: usize,
}

impl RunSummary {
    /// Creates a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Skipped => self.skipped += 1,
            RunOutcome::Created => self.created += 1,
            RunOutcome::Updated => self.updated += 1,
            RunOutcome::Published => self.published += 1,
            RunOutcome::CreateFailed => self.create_failed += 1,
            RunOutcome::UpdateFailed => self.update_failed += 1,
            RunOutcome::PublishFailed => self.publish_failed += 1,
            RunOutcome::PrereqMissing => self.prereq_missing += 1,
        }
    }

    /// Folds one record's report into the summary.
    pub fn record_report(&mut self, report: &RecordReport) {
        self.record(report.write);
        if let Some(publish) = report.publish {
            self.record(publish);
        }
    }

    /// Returns the number of records that went through the write phase.
    ///
    /// Publish outcomes count into a separate bucket, so this equals the
    /// dataset size.
    pub fn processed(&self) -> usize {
        self.skipped
            + self.created
            + self.updated
            + self.create_failed
            + self.update_failed
            + self.prereq_missing
    }

    /// Returns the number of records that did not fully converge.
    pub fn failures(&self) -> usize {
        self.skipped
            + self.prereq_missing
            + self.create_failed
            + self.update_failed
            + self.publish_failed
    }

    /// Returns true if any record failed; drives the process exit code.
    pub fn has_failures(&self) -> bool {
        self.failures() > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Skipped={}, Created={}, Updated={}, Published={}, CreateFailed={}, UpdateFailed={}, PublishFailed={}, PrereqMissing={}",
            self.skipped,
            self.created,
            self.updated,
            self.published,
            self.create_failed,
            self.update_failed,
            self.publish_failed,
            self.prereq_missing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_default() {
        let summary = RunSummary::new();
        assert_eq!(summary.processed(), 0);
        assert_eq!(summary.failures(), 0);
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_summary_record() {
        let mut summary = RunSummary::new();
        summary.record(RunOutcome::Skipped);
        summary.record(RunOutcome::Created);
        summary.record(RunOutcome::Updated);
        summary.record(RunOutcome::Published);
        summary.record(RunOutcome::CreateFailed);
        summary.record(RunOutcome::UpdateFailed);
        summary.record(RunOutcome::PublishFailed);
        summary.record(RunOutcome::PrereqMissing);

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.published, 1);
        assert_eq!(summary.create_failed, 1);
        assert_eq!(summary.update_failed, 1);
        assert_eq!(summary.publish_failed, 1);
        assert_eq!(summary.prereq_missing, 1);
    }

    #[test]
    fn test_processed_counts_write_bucket_only() {
        let mut summary = RunSummary::new();
        summary.record_report(&RecordReport::published(RunOutcome::Created));
        summary.record_report(&RecordReport::published(RunOutcome::Updated));
        summary.record_report(&RecordReport::halted(RunOutcome::PrereqMissing));

        // Three records, two of which also produced a publish outcome.
        assert_eq!(summary.processed(), 3);
        assert_eq!(summary.published, 2);
    }

    #[test]
    fn test_failures() {
        let mut summary = RunSummary::new();
        summary.record_report(&RecordReport::published(RunOutcome::Created));
        summary.record_report(&RecordReport::halted(RunOutcome::CreateFailed));
        summary.record_report(&RecordReport::publish_failed(RunOutcome::Updated));
        summary.record_report(&RecordReport::halted(RunOutcome::Skipped));

        assert_eq!(summary.failures(), 3);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_report_constructors() {
        let report = RecordReport::published(RunOutcome::Created);
        assert_eq!(report.write, RunOutcome::Created);
        assert_eq!(report.publish, Some(RunOutcome::Published));
        assert!(!report.is_failure());

        let report = RecordReport::publish_failed(RunOutcome::Updated);
        assert_eq!(report.publish, Some(RunOutcome::PublishFailed));
        assert!(report.is_failure());

        let report = RecordReport::halted(RunOutcome::Skipped);
        assert_eq!(report.publish, None);
        assert!(report.is_failure());
    }

    #[test]
    fn test_summary_display() {
        let mut summary = RunSummary::new();
        summary.record(RunOutcome::Created);
        summary.record(RunOutcome::Created);
        summary.record(RunOutcome::Published);

        assert_eq!(
            summary.to_string(),
            "Skipped=0, Created=2, Updated=0, Published=1, CreateFailed=0, UpdateFailed=0, PublishFailed=0, PrereqMissing=0"
        );
    }
}
