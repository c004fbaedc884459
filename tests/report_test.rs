//! Text and JSON rendering of reports and plans.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{TimeZone, Utc};
use roomsync::report::{format_update_time, render_json, render_plan_text, render_text};
use roomsync_reconciler::{
    ChangeEntry, ChangeReport, PairPlan, PlannedAdd, PlannedRemoval, RemovalFailure, SyncPlan,
};
use ulid::Ulid;

fn finished_report() -> ChangeReport {
    let mut report = ChangeReport::new(Ulid::new());
    report.added.push(ChangeEntry::new("Ada", "Eng Room", "m-new-1"));
    report.removed.push(ChangeEntry::new("Dee", "Eng Room", "m-d"));
    report.failed_removals.push(RemovalFailure {
        name: "Eve".to_string(),
        room: "Eng Room".to_string(),
        membership_id: "m-e".to_string(),
        reason: "HTTP 404".to_string(),
    });
    report.finished_at = Utc.with_ymd_and_hms(2026, 10, 18, 14, 5, 0).single();
    report
}

#[test]
fn test_update_time_format() {
    let Some(time) = Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).single() else {
        panic!("valid timestamp");
    };
    assert_eq!(format_update_time(time), "04 Mar 2026, 09:30 AM UTC");
}

#[test]
fn test_text_report_lines() {
    let text = render_text(&finished_report());
    let lines: Vec<_> = text.lines().collect();

    assert_eq!(
        lines,
        vec![
            "added Ada to Eng Room (membership m-new-1)",
            "removed Dee from Eng Room (membership m-d)",
            "failed to remove Eve from Eng Room (membership m-e): HTTP 404",
            "1 added, 1 removed, 1 failed removals; rooms updated 18 Oct 2026, 02:05 PM UTC",
        ]
    );
}

#[test]
fn test_empty_report_is_only_summary() {
    let text = render_text(&ChangeReport::new(Ulid::new()).finish());
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("0 added, 0 removed, 0 failed removals; rooms updated "));
}

#[test]
fn test_json_report_round_trips() {
    let report = finished_report();
    let json = match render_json(&report) {
        Ok(json) => json,
        Err(e) => panic!("report should serialize: {e}"),
    };

    let parsed: ChangeReport = match serde_json::from_str(&json) {
        Ok(parsed) => parsed,
        Err(e) => panic!("report JSON should parse: {e}"),
    };
    assert_eq!(parsed, report);
}

#[test]
fn test_plan_text() {
    let plan = SyncPlan {
        pairs: vec![PairPlan {
            group: "Engineering".to_string(),
            room: "Eng Room".to_string(),
            group_id: "g-eng".to_string(),
            room_id: "r-eng".to_string(),
            to_add: vec![PlannedAdd {
                member_id: "A".to_string(),
                name: "Ada".to_string(),
            }],
            to_remove: vec![PlannedRemoval {
                person_id: "D".to_string(),
                name: "Dee".to_string(),
                membership_id: "m-d".to_string(),
            }],
        }],
    };

    assert_eq!(
        render_plan_text(&plan),
        "would add Ada to Eng Room\nwould remove Dee from Eng Room (membership m-d)\ndry run: 1 to add, 1 to remove"
    );
}
