//! Cluster event classification
//!
//! Partitions raw events into three streams: OOM-kill records, GitOps
//! reconciliation records (Flux-tagged), and generic warning records.
//! The GitOps and warning streams are windowed into 24h/48h views; the
//! OOM stream is kept whole and windowed by its consumers.

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::Event;

/// A container terminated by the kernel for exceeding its memory limit.
#[derive(Debug, Clone)]
pub struct OomEvent {
    pub node: String,
    pub namespace: String,
    pub pod: String,
    pub container: String,
    /// Absent when the source event carried no parseable timestamp; such
    /// records sort last and are excluded from every windowed count.
    pub timestamp: Option<DateTime<Utc>>,
    pub reason: String,
}

/// One classified event, retained only when its last-seen timestamp parsed.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub namespace: String,
    pub involved_object: String,
    pub count: i32,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: DateTime<Utc>,
}

/// GitOps reconciliation events in 24h/48h windows.
#[derive(Debug, Clone, Default)]
pub struct GitopsEventReport {
    pub last_24h: Vec<EventRecord>,
    pub last_48h: Vec<EventRecord>,
    pub warnings_24h: usize,
    pub warnings_48h: usize,
    pub errors_24h: usize,
    pub errors_48h: usize,
}

/// Generic warning events in 24h/48h windows.
#[derive(Debug, Clone, Default)]
pub struct WarningEventReport {
    pub last_24h: Vec<EventRecord>,
    pub last_48h: Vec<EventRecord>,
    pub warnings_24h: usize,
    pub warnings_48h: usize,
}

/// True when the event originates from the GitOps toolkit.
///
/// Matches the reconciler's source component, the reconciled object kinds,
/// and the fluxcd API group, all case-insensitively.
pub fn is_gitops_event(event: &Event) -> bool {
    let component = event
        .source
        .as_ref()
        .and_then(|s| s.component.as_deref())
        .unwrap_or("")
        .to_lowercase();
    if component.contains("flux") {
        return true;
    }

    let kind = event
        .involved_object
        .kind
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    if kind == "kustomization" || kind == "helmrelease" {
        return true;
    }

    event
        .involved_object
        .api_version
        .as_deref()
        .unwrap_or("")
        .to_lowercase()
        .contains("fluxcd")
}

/// True when the event records an OOM kill, wherever it was tagged.
fn is_oom_event(event: &Event) -> bool {
    event
        .reason
        .as_deref()
        .is_some_and(|r| r.contains("OOMKilled"))
        || event
            .message
            .as_deref()
            .is_some_and(|m| m.contains("OOMKilled"))
}

fn last_seen(event: &Event) -> Option<DateTime<Utc>> {
    event.last_timestamp.as_ref().map(|t| t.0)
}

fn record(event: &Event) -> Option<EventRecord> {
    let last = last_seen(event)?;
    Some(EventRecord {
        event_type: event.type_.clone().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        namespace: event.metadata.namespace.clone().unwrap_or_default(),
        involved_object: format!(
            "{}/{}",
            event.involved_object.kind.as_deref().unwrap_or(""),
            event.involved_object.name.as_deref().unwrap_or("")
        ),
        count: event.count.unwrap_or(0),
        first_seen: event.first_timestamp.as_ref().map(|t| t.0),
        last_seen: last,
    })
}

fn within(last: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    last > now - window
}

fn sort_recent_first(records: &mut [EventRecord]) {
    records.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
}

/// Extract every OOM-kill record, most recent first.
///
/// Records without a parseable timestamp are kept (the incident is still
/// worth surfacing) but sort to the tail and never enter a window.
pub fn extract_oom_events(events: &[Event]) -> Vec<OomEvent> {
    let mut ooms: Vec<OomEvent> = events
        .iter()
        .filter(|e| is_oom_event(e))
        .map(|e| OomEvent {
            node: e
                .source
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or_default(),
            namespace: e.involved_object.namespace.clone().unwrap_or_default(),
            pod: e.involved_object.name.clone().unwrap_or_default(),
            container: e.involved_object.field_path.clone().unwrap_or_default(),
            timestamp: last_seen(e),
            reason: e.reason.clone().unwrap_or_default(),
        })
        .collect();

    ooms.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    ooms
}

/// Window GitOps reconciliation events into 24h/48h views.
///
/// Events without a parseable last-seen timestamp are dropped from both
/// windows. Warning and error counts are tracked per window.
pub fn classify_gitops_events(events: &[Event], now: DateTime<Utc>) -> GitopsEventReport {
    let mut report = GitopsEventReport::default();

    for event in events.iter().filter(|e| is_gitops_event(e)) {
        let Some(rec) = record(event) else {
            continue;
        };
        if within(rec.last_seen, now, Duration::hours(24)) {
            match rec.event_type.as_str() {
                "Warning" => report.warnings_24h += 1,
                "Error" => report.errors_24h += 1,
                _ => {}
            }
            report.last_24h.push(rec.clone());
        }
        if within(rec.last_seen, now, Duration::hours(48)) {
            match rec.event_type.as_str() {
                "Warning" => report.warnings_48h += 1,
                "Error" => report.errors_48h += 1,
                _ => {}
            }
            report.last_48h.push(rec);
        }
    }

    sort_recent_first(&mut report.last_24h);
    sort_recent_first(&mut report.last_48h);
    report
}

/// Window generic (non-GitOps) warning events into 24h/48h views.
pub fn classify_warning_events(events: &[Event], now: DateTime<Utc>) -> WarningEventReport {
    let mut report = WarningEventReport::default();

    for event in events {
        if is_gitops_event(event) {
            continue;
        }
        if event.type_.as_deref() != Some("Warning") {
            continue;
        }
        let Some(rec) = record(event) else {
            continue;
        };
        if within(rec.last_seen, now, Duration::hours(24)) {
            report.warnings_24h += 1;
            report.last_24h.push(rec.clone());
        }
        if within(rec.last_seen, now, Duration::hours(48)) {
            report.warnings_48h += 1;
            report.last_48h.push(rec);
        }
    }

    sort_recent_first(&mut report.last_24h);
    sort_recent_first(&mut report.last_48h);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{EventSource, ObjectReference};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    fn event(
        event_type: &str,
        reason: &str,
        kind: &str,
        component: &str,
        last: Option<DateTime<Utc>>,
    ) -> Event {
        Event {
            metadata: ObjectMeta {
                namespace: Some("abc".to_string()),
                name: Some("ev".to_string()),
                ..Default::default()
            },
            involved_object: ObjectReference {
                kind: Some(kind.to_string()),
                name: Some("obj".to_string()),
                namespace: Some("abc".to_string()),
                ..Default::default()
            },
            source: Some(EventSource {
                component: Some(component.to_string()),
                ..Default::default()
            }),
            type_: Some(event_type.to_string()),
            reason: Some(reason.to_string()),
            message: Some(String::new()),
            last_timestamp: last.map(Time),
            ..Default::default()
        }
    }

    #[test]
    fn test_helmrelease_kind_is_gitops_without_component() {
        let e = event("Warning", "ReconciliationFailed", "HelmRelease", "", None);
        assert!(is_gitops_event(&e));
    }

    #[test]
    fn test_flux_component_is_gitops() {
        let e = event("Normal", "Progressing", "Pod", "kustomize-controller-flux", None);
        assert!(is_gitops_event(&e));
    }

    #[test]
    fn test_fluxcd_api_group_is_gitops() {
        let mut e = event("Normal", "Progressing", "Widget", "", None);
        e.involved_object.api_version = Some("source.toolkit.fluxcd.io/v1".to_string());
        assert!(is_gitops_event(&e));
    }

    #[test]
    fn test_missing_timestamp_excluded_from_windows() {
        let now = Utc::now();
        let report = classify_gitops_events(
            &[event("Warning", "ReconciliationFailed", "Kustomization", "", None)],
            now,
        );
        assert!(report.last_24h.is_empty());
        assert!(report.last_48h.is_empty());
        assert_eq!(report.warnings_24h, 0);
    }

    #[test]
    fn test_event_in_both_windows_counts_twice() {
        let now = Utc::now();
        let report = classify_gitops_events(
            &[event(
                "Warning",
                "ReconciliationFailed",
                "Kustomization",
                "",
                Some(now - Duration::hours(2)),
            )],
            now,
        );
        assert_eq!(report.last_24h.len(), 1);
        assert_eq!(report.last_48h.len(), 1);
        assert_eq!(report.warnings_24h, 1);
        assert_eq!(report.warnings_48h, 1);
    }

    #[test]
    fn test_stale_event_only_in_wider_window() {
        let now = Utc::now();
        let report = classify_gitops_events(
            &[event(
                "Warning",
                "ReconciliationFailed",
                "HelmRelease",
                "",
                Some(now - Duration::hours(30)),
            )],
            now,
        );
        assert!(report.last_24h.is_empty());
        assert_eq!(report.last_48h.len(), 1);
    }

    #[test]
    fn test_warning_stream_excludes_gitops_and_normals() {
        let now = Utc::now();
        let report = classify_warning_events(
            &[
                event("Warning", "BackOff", "Pod", "", Some(now - Duration::hours(1))),
                event(
                    "Warning",
                    "ReconciliationFailed",
                    "Kustomization",
                    "",
                    Some(now - Duration::hours(1)),
                ),
                event("Normal", "Pulled", "Pod", "", Some(now - Duration::hours(1))),
            ],
            now,
        );
        assert_eq!(report.last_24h.len(), 1);
        assert_eq!(report.last_24h[0].reason, "BackOff");
    }

    #[test]
    fn test_windowed_lists_sort_recent_first() {
        let now = Utc::now();
        let report = classify_warning_events(
            &[
                event("Warning", "a", "Pod", "", Some(now - Duration::hours(1))),
                event("Warning", "b", "Pod", "", Some(now - Duration::hours(3))),
                event("Warning", "c", "Pod", "", Some(now - Duration::hours(2))),
            ],
            now,
        );
        let reasons: Vec<&str> = report.last_24h.iter().map(|r| r.reason.as_str()).collect();
        assert_eq!(reasons, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_oom_extraction_matches_reason_and_message() {
        let now = Utc::now();
        let mut by_message = event("Warning", "Killing", "Pod", "", Some(now));
        by_message.message = Some("container was OOMKilled".to_string());
        let by_reason = event("Warning", "OOMKilled", "Pod", "", Some(now - Duration::hours(1)));
        let untagged = event("Warning", "BackOff", "Pod", "", Some(now));

        let ooms = extract_oom_events(&[by_message.clone(), by_reason, untagged]);
        assert_eq!(ooms.len(), 2);
        // most recent first
        assert_eq!(ooms[0].reason, "Killing");
    }

    #[test]
    fn test_oom_without_timestamp_sorts_last() {
        let now = Utc::now();
        let ooms = extract_oom_events(&[
            event("Warning", "OOMKilled", "Pod", "", None),
            event("Warning", "OOMKilled", "Pod", "", Some(now)),
        ]);
        assert_eq!(ooms.len(), 2);
        assert!(ooms[0].timestamp.is_some());
        assert!(ooms[1].timestamp.is_none());
    }
}
