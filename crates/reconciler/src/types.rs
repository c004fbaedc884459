//! Core types for the reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// One membership change that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Display name of the person.
    pub name: String,
    /// Title of the room.
    pub room: String,
    /// Membership created or deleted.
    pub membership_id: String,
}

impl ChangeEntry {
    pub fn new(name: impl Into<String>, room: impl Into<String>, membership_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            room: room.into(),
            membership_id: membership_id.into(),
        }
    }
}

/// A removal the platform did not confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalFailure {
    pub name: String,
    pub room: String,
    pub membership_id: String,
    /// Status code or error message returned for the removal.
    pub reason: String,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Run identifier, also recorded on the run's tracing span.
    pub run_id: Ulid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Memberships created, in application order.
    pub added: Vec<ChangeEntry>,
    /// Memberships deleted, in application order.
    pub removed: Vec<ChangeEntry>,
    /// Removals that returned anything other than success.
    pub failed_removals: Vec<RemovalFailure>,
}

impl ChangeReport {
    /// Start an empty report for a new run.
    pub fn new(run_id: Ulid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            added: Vec::new(),
            removed: Vec::new(),
            failed_removals: Vec::new(),
        }
    }

    /// Stamp the completion time.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// True when the run changed nothing and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.failed_removals.is_empty()
    }

    /// Number of applied changes.
    pub fn total_changes(&self) -> usize {
        self.added.len().saturating_add(self.removed.len())
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_removals.is_empty()
    }
}

/// A group member missing from the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAdd {
    pub member_id: String,
    /// Name as the group reports it.
    pub name: String,
}

/// A room occupant who is not in the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedRemoval {
    pub person_id: String,
    /// Name as the room reports it.
    pub name: String,
    pub membership_id: String,
}

/// Planned changes for one mapping pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairPlan {
    pub group: String,
    pub room: String,
    pub group_id: String,
    pub room_id: String,
    /// In group member order.
    pub to_add: Vec<PlannedAdd>,
    /// In room membership order.
    pub to_remove: Vec<PlannedRemoval>,
}

impl PairPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Planned changes for a whole mapping, in mapping order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub pairs: Vec<PairPlan>,
}

impl SyncPlan {
    /// True when every pair is already converged.
    pub fn is_empty(&self) -> bool {
        self.pairs.iter().all(PairPlan::is_empty)
    }

    pub fn add_count(&self) -> usize {
        self.pairs.iter().map(|p| p.to_add.len()).sum()
    }

    pub fn remove_count(&self) -> usize {
        self.pairs.iter().map(|p| p.to_remove.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(adds: usize, removes: usize) -> PairPlan {
        PairPlan {
            group: "Engineering".to_string(),
            room: "Eng Room".to_string(),
            group_id: "g-1".to_string(),
            room_id: "r-1".to_string(),
            to_add: (0..adds)
                .map(|i| PlannedAdd {
                    member_id: format!("p-{i}"),
                    name: format!("Person {i}"),
                })
                .collect(),
            to_remove: (0..removes)
                .map(|i| PlannedRemoval {
                    person_id: format!("q-{i}"),
                    name: format!("Other {i}"),
                    membership_id: format!("m-{i}"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_new_report_is_empty() {
        let report = ChangeReport::new(Ulid::new());
        assert!(report.is_empty());
        assert!(report.finished_at.is_none());
        assert_eq!(report.total_changes(), 0);
    }

    #[test]
    fn test_finish_stamps_time() {
        let report = ChangeReport::new(Ulid::new()).finish();
        assert!(report.finished_at.is_some_and(|t| t >= report.started_at));
    }

    #[test]
    fn test_failed_removal_makes_report_non_empty() {
        let mut report = ChangeReport::new(Ulid::new());
        report.failed_removals.push(RemovalFailure {
            name: "Dee".to_string(),
            room: "Eng Room".to_string(),
            membership_id: "m-4".to_string(),
            reason: "HTTP 404".to_string(),
        });

        assert!(!report.is_empty());
        assert!(report.has_failures());
        assert_eq!(report.total_changes(), 0);
    }

    #[test]
    fn test_plan_counts() {
        let plan = SyncPlan {
            pairs: vec![pair(2, 1), pair(0, 0), pair(1, 3)],
        };
        assert_eq!(plan.add_count(), 3);
        assert_eq!(plan.remove_count(), 4);
        assert!(!plan.is_empty());
        assert!(SyncPlan { pairs: vec![pair(0, 0)] }.is_empty());
    }

    #[test]
    fn test_report_serializes_fields() {
        let mut report = ChangeReport::new(Ulid::new());
        report.added.push(ChangeEntry::new("Ada", "Eng Room", "m-9"));
        let value = serde_json::to_value(&report).ok();

        let added_name = value
            .as_ref()
            .and_then(|v| v.pointer("/added/0/name"))
            .and_then(|v| v.as_str());
        assert_eq!(added_name, Some("Ada"));
        assert!(value.as_ref().and_then(|v| v.get("run_id")).is_some());
    }
}
