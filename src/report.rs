//! Rendering of run reports and dry-run plans.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use roomsync_reconciler::{ChangeReport, SyncPlan};
use serde::Serialize;

/// Human-readable update time, e.g. `18 Oct 2026, 09:30 AM UTC`.
pub fn format_update_time(time: DateTime<Utc>) -> String {
    time.format("%d %b %Y, %I:%M %p UTC").to_string()
}

/// One line per change, then a summary line with the update time.
pub fn render_text(report: &ChangeReport) -> String {
    let added = report.added.iter().map(|entry| {
        format!(
            "added {} to {} (membership {})",
            entry.name, entry.room, entry.membership_id
        )
    });
    let removed = report.removed.iter().map(|entry| {
        format!(
            "removed {} from {} (membership {})",
            entry.name, entry.room, entry.membership_id
        )
    });
    let failed = report.failed_removals.iter().map(|failure| {
        format!(
            "failed to remove {} from {} (membership {}): {}",
            failure.name, failure.room, failure.membership_id, failure.reason
        )
    });

    let updated = format_update_time(report.finished_at.unwrap_or(report.started_at));
    let summary = format!(
        "{} added, {} removed, {} failed removals; rooms updated {updated}",
        report.added.len(),
        report.removed.len(),
        report.failed_removals.len()
    );

    added
        .chain(removed)
        .chain(failed)
        .chain(std::iter::once(summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Planned changes of a dry run.
pub fn render_plan_text(plan: &SyncPlan) -> String {
    let lines = plan.pairs.iter().flat_map(|pair| {
        let adds = pair
            .to_add
            .iter()
            .map(move |add| format!("would add {} to {}", add.name, pair.room));
        let removes = pair.to_remove.iter().map(move |removal| {
            format!(
                "would remove {} from {} (membership {})",
                removal.name, pair.room, removal.membership_id
            )
        });
        adds.chain(removes)
    });

    let summary = format!(
        "dry run: {} to add, {} to remove",
        plan.add_count(),
        plan.remove_count()
    );

    lines
        .chain(std::iter::once(summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-printed JSON of a report or plan.
///
/// # Errors
///
/// Fails only if serialization fails.
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
