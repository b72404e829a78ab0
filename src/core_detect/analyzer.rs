use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::{Duration, Local, NaiveDateTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::constants::TIMESTAMP_FORMAT;
use crate::core_log::{EventKind, EventLogError, EventSource, LogEvent};

/// Classification sets produced by one analysis run. Purely derived from
/// the event history; each set is deduplicated and sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: String,
    pub brute_force: Vec<String>,
    pub dir_traversal: Vec<String>,
    pub pasv_scan: Vec<String>,
    pub file_enum: Vec<String>,
    pub mkdir_rmdir: Vec<String>,
}

/// Replays the full event history through the five heuristics.
///
/// Stateless and re-run from scratch on every invocation. Events are
/// ordered by their own timestamps before anything is counted -- records
/// for one client may arrive interleaved with others, and the file order
/// is never trusted. Records whose timestamp does not parse are dropped.
pub fn analyze(events: &[LogEvent], config: &DetectionConfig) -> AnalysisReport {
    let mut timed: Vec<(NaiveDateTime, &LogEvent)> = events
        .iter()
        .filter_map(|e| e.parsed_timestamp().map(|t| (t, e)))
        .collect();
    timed.sort_by_key(|(t, _)| *t);

    // 1) Brute force: sliding window over failed logins, per client.
    let mut failed_logins: BTreeMap<&str, Vec<NaiveDateTime>> = BTreeMap::new();
    for (t, e) in &timed {
        if e.event == EventKind::LoginFailed {
            failed_logins.entry(e.client.as_str()).or_default().push(*t);
        }
    }
    let window = Duration::minutes(config.bf_window_mins);
    let mut brute_force = BTreeSet::new();
    for (client, times) in &failed_logins {
        // `times` is ascending already; two-pointer expansion. The client
        // is flagged on the first qualifying window and not scanned further.
        let mut start = 0;
        for end in 0..times.len() {
            while times[end] - times[start] > window {
                start += 1;
            }
            if end - start + 1 >= config.bf_threshold {
                brute_force.insert(client.to_string());
                break;
            }
        }
    }

    // 2) Directory traversal: repeated CWD into nonexistent directories.
    let mut cwd_failures: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, e) in &timed {
        if e.event == EventKind::CwdFailed {
            *cwd_failures.entry(e.client.as_str()).or_default() += 1;
        }
    }
    let dir_traversal: BTreeSet<String> = cwd_failures
        .iter()
        .filter(|(_, &count)| count >= config.dt_threshold)
        .map(|(client, _)| client.to_string())
        .collect();

    // 3) Port-scan style PASV abuse: passive listeners opened without the
    // data transfer that should follow. Only LIST follow-through counts as
    // a real data connection here; widening to STOR/RETR would change the
    // detector's sensitivity.
    let mut pasv_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut data_conn_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, e) in &timed {
        match e.event {
            EventKind::Pasv => *pasv_counts.entry(e.client.as_str()).or_default() += 1,
            EventKind::ListStart => {
                *data_conn_counts.entry(e.client.as_str()).or_default() += 1
            }
            _ => {}
        }
    }
    let pasv_scan: BTreeSet<String> = pasv_counts
        .iter()
        .filter(|(client, &pasv)| {
            pasv >= config.bf_threshold
                && data_conn_counts.get(*client).copied().unwrap_or(0) < pasv / 2
        })
        .map(|(client, _)| client.to_string())
        .collect();

    // 4) Enumeration: completed listings past the threshold.
    let mut list_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, e) in &timed {
        if e.event == EventKind::ListDone {
            *list_counts.entry(e.client.as_str()).or_default() += 1;
        }
    }
    let file_enum: BTreeSet<String> = list_counts
        .iter()
        .filter(|(_, &count)| count >= config.lst_threshold)
        .map(|(client, _)| client.to_string())
        .collect();

    // 5) Directory tampering: combined MKD/RMD churn.
    let mut tamper_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, e) in &timed {
        if matches!(e.event, EventKind::Mkd | EventKind::Rmd) {
            *tamper_counts.entry(e.client.as_str()).or_default() += 1;
        }
    }
    let mkdir_rmdir: BTreeSet<String> = tamper_counts
        .iter()
        .filter(|(_, &count)| count >= config.tamper_threshold)
        .map(|(client, _)| client.to_string())
        .collect();

    AnalysisReport {
        generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        brute_force: brute_force.into_iter().collect(),
        dir_traversal: dir_traversal.into_iter().collect(),
        pasv_scan: pasv_scan.into_iter().collect(),
        file_enum: file_enum.into_iter().collect(),
        mkdir_rmdir: mkdir_rmdir.into_iter().collect(),
    }
}

/// Writes the report as a pretty-printed JSON document.
pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<(), EventLogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

/// One full read-analyze-write pass. A sink or source failure is reported
/// to the operator and the server keeps running.
pub fn run_analysis(source: &dyn EventSource, config: &DetectionConfig, report_path: &Path) {
    let events = match source.read_all() {
        Ok(events) => events,
        Err(e) => {
            warn!("analysis skipped, could not read event history: {}", e);
            return;
        }
    };
    let report = analyze(&events, config);
    info!(
        "analysis over {} events: {} brute-force, {} traversal, {} pasv-scan, {} enum, {} tamper",
        events.len(),
        report.brute_force.len(),
        report.dir_traversal.len(),
        report.pasv_scan.len(),
        report.file_enum.len(),
        report.mkdir_rmdir.len()
    );
    if let Err(e) = write_report(&report, report_path) {
        warn!("failed to write analysis report to {:?}: {}", report_path, e);
    }
}
