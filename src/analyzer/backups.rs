//! Backup health evaluation
//!
//! Backup objects arrive as loosely-typed custom resources. Decoding is an
//! explicit validate-or-skip step: an object without a status block or a
//! parseable start timestamp is dropped silently, and everything after the
//! decode operates on typed records only.

use chrono::{DateTime, Duration, Utc};
use kube::api::DynamicObject;

/// Phases that count as failures.
const FAILED_PHASES: &[&str] = &["Failed", "PartiallyFailed"];

/// A decoded backup custom resource.
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub start_time: DateTime<Utc>,
    /// Absent while the backup is still in progress.
    pub completion_time: Option<DateTime<Utc>>,
    pub errors: i64,
    pub warnings: i64,
}

impl BackupRecord {
    /// Wall-clock duration, once the backup completed.
    pub fn duration(&self) -> Option<Duration> {
        self.completion_time.map(|end| end - self.start_time)
    }

    pub fn failed(&self) -> bool {
        FAILED_PHASES.contains(&self.phase.as_str())
    }
}

/// Backup records windowed over 24h/48h, with failure counters.
#[derive(Debug, Clone, Default)]
pub struct BackupReport {
    pub last_24h: Vec<BackupRecord>,
    pub last_48h: Vec<BackupRecord>,
    pub failed_24h: usize,
    pub failed_48h: usize,
}

/// Decode one loose backup object, or signal "skip".
///
/// Drops the object when the status block is absent or the start timestamp
/// is missing/unparseable. The completion timestamp is optional and only
/// kept when it parses.
pub fn decode_backup(obj: &DynamicObject) -> Option<BackupRecord> {
    let status = obj.data.get("status")?;

    let start_time = status
        .get("startTimestamp")
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp)?;

    let completion_time = status
        .get("completionTimestamp")
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp);

    Some(BackupRecord {
        name: obj.metadata.name.clone().unwrap_or_default(),
        namespace: obj.metadata.namespace.clone().unwrap_or_default(),
        phase: status
            .get("phase")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        start_time,
        completion_time,
        errors: status.get("errors").and_then(|v| v.as_i64()).unwrap_or(0),
        warnings: status.get("warnings").and_then(|v| v.as_i64()).unwrap_or(0),
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Evaluate backup health over the last 48 hours.
///
/// Only backups started within 48h are retained; those within 24h also
/// land in the narrower window. Each window is sorted by start time,
/// most recent first.
pub fn evaluate_backups(backups: &[DynamicObject], now: DateTime<Utc>) -> BackupReport {
    let mut report = BackupReport::default();

    for record in backups.iter().filter_map(decode_backup) {
        if record.start_time <= now - Duration::hours(48) {
            continue;
        }

        if record.start_time > now - Duration::hours(24) {
            if record.failed() {
                report.failed_24h += 1;
            }
            report.last_24h.push(record.clone());
        }
        if record.failed() {
            report.failed_48h += 1;
        }
        report.last_48h.push(record);
    }

    report
        .last_24h
        .sort_by(|a, b| b.start_time.cmp(&a.start_time));
    report
        .last_48h
        .sort_by(|a, b| b.start_time.cmp(&a.start_time));
    report
}
