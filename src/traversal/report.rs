use std::fmt;
use std::ops::AddAssign;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::ImportError;
use crate::sinks::SinkOp;
use crate::traversal::extensions::ExtensionPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "since")]
pub enum ImportMode {
    /// everything, append-only
    Full,
    /// only the per-employment assignments, append-only
    EmploymentAssignments,
    /// everything changed since the watermark, delete-then-save
    ChangesSince(NaiveDate),
}

impl ImportMode {
    pub fn sink_op(&self) -> SinkOp {
        match self {
            ImportMode::Full | ImportMode::EmploymentAssignments => SinkOp::Save,
            ImportMode::ChangesSince(_) => SinkOp::DeleteAndSave,
        }
    }

    pub fn since(&self) -> Option<NaiveDate> {
        match self {
            ImportMode::ChangesSince(since) => Some(*since),
            _ => None,
        }
    }

    /// Catalogs and organisations are part of the walk
    pub fn includes_catalogs(&self) -> bool {
        !matches!(self, ImportMode::EmploymentAssignments)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Full => "full",
            ImportMode::EmploymentAssignments => "employment_assignments",
            ImportMode::ChangesSince(_) => "changes_since",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::ChangesSince(since) => write!(f, "changes_since({})", since),
            other => f.write_str(other.as_str()),
        }
    }
}

/// What reached the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchCount {
    pub collections: usize,
    pub records: usize,
}

impl DispatchCount {
    pub fn one(records: usize) -> Self {
        Self { collections: 1, records }
    }
}

impl AddAssign for DispatchCount {
    fn add_assign(&mut self, rhs: Self) {
        self.collections += rhs.collections;
        self.records += rhs.records;
    }
}

/// Failure of one organisation, personnel-category or employment branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchError {
    pub branch: String,
    pub error: String,
    pub status: Option<u16>,
}

/// Result of walking a group of branches; errors are still typed here so the
/// engine can tell fatal ones apart.
#[derive(Debug, Default)]
pub struct BranchTally {
    pub walked: usize,
    pub dispatched: DispatchCount,
    pub failures: Vec<(String, ImportError)>,
}

impl BranchTally {
    pub fn fail(&mut self, branch: impl ToString, error: ImportError) {
        self.failures.push((branch.to_string(), error));
    }

    pub fn merge(&mut self, other: BranchTally) {
        self.walked += other.walked;
        self.dispatched += other.dispatched;
        self.failures.extend(other.failures);
    }

    pub fn has_fatal(&self) -> bool {
        self.failures.iter().any(|(_, e)| e.is_fatal())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub mode: ImportMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub dispatched: DispatchCount,
    pub branches_walked: usize,
    pub errors: Vec<BranchError>,
    /// extension points that were reached but are not supported yet
    pub extensions: Vec<ExtensionPoint>,
}

impl SyncReport {
    pub fn new(mode: ImportMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            completed_at: None,
            dispatched: DispatchCount::default(),
            branches_walked: 0,
            errors: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_error(&mut self, branch: &str, error: &ImportError) {
        self.errors.push(BranchError {
            branch: branch.to_string(),
            error: error.to_string(),
            status: error.status(),
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mode_selects_sink_operation() {
        let since = NaiveDate::from_ymd_opt(2016, 5, 15).unwrap();
        assert_eq!(ImportMode::Full.sink_op(), SinkOp::Save);
        assert_eq!(ImportMode::EmploymentAssignments.sink_op(), SinkOp::Save);
        assert_eq!(ImportMode::ChangesSince(since).sink_op(), SinkOp::DeleteAndSave);
        assert_eq!(ImportMode::ChangesSince(since).since(), Some(since));
        assert!(!ImportMode::EmploymentAssignments.includes_catalogs());
        assert_eq!(ImportMode::ChangesSince(since).to_string(), "changes_since(2016-05-15)");
    }

    #[test]
    fn tallies_merge() {
        let mut a = BranchTally { walked: 1, dispatched: DispatchCount::one(3), ..Default::default() };
        let mut b = BranchTally { walked: 2, dispatched: DispatchCount::one(4), ..Default::default() };
        b.fail("organisation:O2", ImportError::Fetch { url: "u".into(), status: 500 });
        a.merge(b);
        assert_eq!(a.walked, 3);
        assert_eq!(a.dispatched, DispatchCount { collections: 2, records: 7 });
        assert_eq!(a.failures.len(), 1);
        assert!(!a.has_fatal());

        a.fail("organisation:O3", ImportError::Auth("revoked".into()));
        assert!(a.has_fatal());
    }
}
