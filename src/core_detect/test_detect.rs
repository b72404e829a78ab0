// Detection engine tests: fixed event histories, fixed thresholds.

use crate::config::DetectionConfig;
use crate::core_detect::analyzer::analyze;
use crate::core_log::{EventKind, LogEvent};

fn ev(timestamp: &str, kind: EventKind, client: &str) -> LogEvent {
    LogEvent::at(timestamp.to_string(), kind, client)
}

fn burst(kind: EventKind, client: &str, seconds_apart: u32, count: u32) -> Vec<LogEvent> {
    (0..count)
        .map(|i| {
            let total = i * seconds_apart;
            ev(
                &format!("2026-04-28 12:{:02}:{:02}", total / 60, total % 60),
                kind,
                client,
            )
        })
        .collect()
}

#[test]
fn test_brute_force_five_failures_in_window() {
    // Five failures within a five minute span, one per minute.
    let events = burst(EventKind::LoginFailed, "10.0.0.1", 60, 5);
    let report = analyze(&events, &DetectionConfig::default());
    assert_eq!(report.brute_force, vec!["10.0.0.1".to_string()]);
}

#[test]
fn test_brute_force_spread_out_not_flagged() {
    // Same five failures stretched to 90 second gaps: the full span is six
    // minutes, and no five of them fit inside the window.
    let events = burst(EventKind::LoginFailed, "10.0.0.1", 90, 5);
    let report = analyze(&events, &DetectionConfig::default());
    assert!(report.brute_force.is_empty());
}

#[test]
fn test_brute_force_ignores_insertion_order() {
    let mut events = burst(EventKind::LoginFailed, "10.0.0.1", 30, 5);
    events.reverse();
    // Interleave another client's noise between the failures.
    events.insert(2, ev("2026-04-28 12:01:00", EventKind::CommandReceived, "10.9.9.9"));
    let report = analyze(&events, &DetectionConfig::default());
    assert_eq!(report.brute_force, vec!["10.0.0.1".to_string()]);
}

#[test]
fn test_user_invalid_is_not_a_brute_force_signal() {
    let events = burst(EventKind::UserInvalid, "10.0.0.1", 10, 20);
    let report = analyze(&events, &DetectionConfig::default());
    assert!(report.brute_force.is_empty());
}

#[test]
fn test_dir_traversal_threshold() {
    let mut events = burst(EventKind::CwdFailed, "10.0.0.2", 10, 9);
    let report = analyze(&events, &DetectionConfig::default());
    assert!(report.dir_traversal.is_empty());

    events.push(ev("2026-04-28 12:10:00", EventKind::CwdFailed, "10.0.0.2"));
    let report = analyze(&events, &DetectionConfig::default());
    assert_eq!(report.dir_traversal, vec!["10.0.0.2".to_string()]);
}

#[test]
fn test_pasv_scan_flagged_without_follow_through() {
    // Five listeners opened, one listing started: 1 < 5 / 2.
    let mut events = burst(EventKind::Pasv, "10.0.0.3", 10, 5);
    events.push(ev("2026-04-28 12:05:00", EventKind::ListStart, "10.0.0.3"));
    let report = analyze(&events, &DetectionConfig::default());
    assert_eq!(report.pasv_scan, vec!["10.0.0.3".to_string()]);
}

#[test]
fn test_pasv_scan_not_flagged_with_follow_through() {
    // Three listings against five listeners: 3 is not < 2.
    let mut events = burst(EventKind::Pasv, "10.0.0.3", 10, 5);
    events.extend(burst(EventKind::ListStart, "10.0.0.3", 10, 3));
    let report = analyze(&events, &DetectionConfig::default());
    assert!(report.pasv_scan.is_empty());
}

#[test]
fn test_pasv_scan_ignores_stor_retr_data_usage() {
    // STOR/RETR starts are deliberately not counted as data connections.
    let mut events = burst(EventKind::Pasv, "10.0.0.3", 10, 6);
    events.extend(burst(EventKind::StorStart, "10.0.0.3", 10, 6));
    events.extend(burst(EventKind::RetrStart, "10.0.0.3", 10, 6));
    let report = analyze(&events, &DetectionConfig::default());
    assert_eq!(report.pasv_scan, vec!["10.0.0.3".to_string()]);
}

#[test]
fn test_file_enum_exact_threshold_boundary() {
    let config = DetectionConfig::default();
    let events = burst(EventKind::ListDone, "10.0.0.4", 10, config.lst_threshold as u32 - 1);
    assert!(analyze(&events, &config).file_enum.is_empty());

    let events = burst(EventKind::ListDone, "10.0.0.4", 10, config.lst_threshold as u32);
    assert_eq!(
        analyze(&events, &config).file_enum,
        vec!["10.0.0.4".to_string()]
    );
}

#[test]
fn test_tamper_combines_mkd_and_rmd() {
    let mut events = burst(EventKind::Mkd, "10.0.0.5", 10, 3);
    events.extend(burst(EventKind::Rmd, "10.0.0.5", 10, 1));
    assert!(analyze(&events, &DetectionConfig::default()).mkdir_rmdir.is_empty());

    events.extend(burst(EventKind::Rmd, "10.0.0.5", 20, 1));
    assert_eq!(
        analyze(&events, &DetectionConfig::default()).mkdir_rmdir,
        vec!["10.0.0.5".to_string()]
    );
}

#[test]
fn test_malformed_timestamps_are_skipped() {
    let mut events = burst(EventKind::CwdFailed, "10.0.0.6", 10, 10);
    for e in events.iter_mut().take(3) {
        e.timestamp = "not a timestamp".to_string();
    }
    // Three of the ten records no longer parse; the count drops below the
    // threshold instead of the whole run aborting.
    let report = analyze(&events, &DetectionConfig::default());
    assert!(report.dir_traversal.is_empty());
}

#[test]
fn test_report_is_deterministic() {
    let mut events = burst(EventKind::LoginFailed, "10.0.0.7", 30, 6);
    events.extend(burst(EventKind::CwdFailed, "10.0.0.8", 10, 12));
    events.extend(burst(EventKind::ListDone, "10.0.0.9", 10, 25));
    let config = DetectionConfig::default();

    let first = analyze(&events, &config);
    let second = analyze(&events, &config);
    assert_eq!(first.brute_force, second.brute_force);
    assert_eq!(first.dir_traversal, second.dir_traversal);
    assert_eq!(first.pasv_scan, second.pasv_scan);
    assert_eq!(first.file_enum, second.file_enum);
    assert_eq!(first.mkdir_rmdir, second.mkdir_rmdir);
}

#[test]
fn test_sets_are_sorted_and_deduplicated() {
    let mut events = burst(EventKind::CwdFailed, "10.0.0.20", 10, 10);
    events.extend(burst(EventKind::CwdFailed, "10.0.0.11", 10, 10));
    let report = analyze(&events, &DetectionConfig::default());
    assert_eq!(
        report.dir_traversal,
        vec!["10.0.0.11".to_string(), "10.0.0.20".to_string()]
    );
}

#[test]
fn test_thresholds_are_overridable() {
    let config = DetectionConfig {
        dt_threshold: 2,
        ..DetectionConfig::default()
    };
    let events = burst(EventKind::CwdFailed, "10.0.0.12", 10, 2);
    assert_eq!(
        analyze(&events, &config).dir_traversal,
        vec!["10.0.0.12".to_string()]
    );
}
