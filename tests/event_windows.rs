//! Event classification and windowing integration tests

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::{Event, EventSource, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

use kubescout::analyzer::events::{
    classify_gitops_events, classify_warning_events, extract_oom_events, is_gitops_event,
};

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

struct EventSpec<'a> {
    event_type: &'a str,
    reason: &'a str,
    message: &'a str,
    kind: &'a str,
    api_version: &'a str,
    component: &'a str,
    last_seen: Option<DateTime<Utc>>,
}

impl Default for EventSpec<'_> {
    fn default() -> Self {
        EventSpec {
            event_type: "Normal",
            reason: "",
            message: "",
            kind: "Pod",
            api_version: "v1",
            component: "",
            last_seen: None,
        }
    }
}

fn event(spec: EventSpec) -> Event {
    Event {
        metadata: ObjectMeta {
            namespace: Some("app".to_string()),
            name: Some("event".to_string()),
            ..Default::default()
        },
        involved_object: ObjectReference {
            kind: Some(spec.kind.to_string()),
            name: Some("object".to_string()),
            namespace: Some("app".to_string()),
            api_version: Some(spec.api_version.to_string()),
            ..Default::default()
        },
        source: Some(EventSource {
            component: Some(spec.component.to_string()),
            ..Default::default()
        }),
        type_: Some(spec.event_type.to_string()),
        reason: Some(spec.reason.to_string()),
        message: Some(spec.message.to_string()),
        last_timestamp: spec.last_seen.map(Time),
        ..Default::default()
    }
}

#[test]
fn helmrelease_kind_alone_tags_gitops() {
    let e = event(EventSpec {
        kind: "HelmRelease",
        ..Default::default()
    });
    assert!(is_gitops_event(&e));
}

#[test]
fn kustomization_kind_is_case_insensitive() {
    let e = event(EventSpec {
        kind: "kustomization",
        ..Default::default()
    });
    assert!(is_gitops_event(&e));
}

#[test]
fn fluxcd_api_group_tags_gitops() {
    let e = event(EventSpec {
        kind: "Widget",
        api_version: "helm.toolkit.fluxcd.io/v2",
        ..Default::default()
    });
    assert!(is_gitops_event(&e));
}

#[test]
fn plain_pod_event_is_not_gitops() {
    let e = event(EventSpec::default());
    assert!(!is_gitops_event(&e));
}

#[test]
fn windows_are_computed_from_the_supplied_capture_time() {
    let now = base_time();
    let events = vec![
        event(EventSpec {
            event_type: "Warning",
            reason: "fresh",
            kind: "Kustomization",
            last_seen: Some(now - Duration::hours(12)),
            ..Default::default()
        }),
        event(EventSpec {
            event_type: "Warning",
            reason: "stale",
            kind: "Kustomization",
            last_seen: Some(now - Duration::hours(36)),
            ..Default::default()
        }),
        event(EventSpec {
            event_type: "Warning",
            reason: "ancient",
            kind: "Kustomization",
            last_seen: Some(now - Duration::hours(72)),
            ..Default::default()
        }),
    ];

    let report = classify_gitops_events(&events, now);
    assert_eq!(report.last_24h.len(), 1);
    assert_eq!(report.last_48h.len(), 2);
    assert_eq!(report.warnings_24h, 1);
    assert_eq!(report.warnings_48h, 2);
}

#[test]
fn event_lists_sort_descending_by_last_seen() {
    let now = base_time();
    let make = |reason: &'static str, hours: i64| {
        event(EventSpec {
            event_type: "Warning",
            reason,
            last_seen: Some(now - Duration::hours(hours)),
            ..Default::default()
        })
    };
    // timestamps [T-1h, T-3h, T-2h] sort to [T-1h, T-2h, T-3h]
    let report = classify_warning_events(&[make("t1", 1), make("t3", 3), make("t2", 2)], now);
    let order: Vec<&str> = report.last_24h.iter().map(|r| r.reason.as_str()).collect();
    assert_eq!(order, vec!["t1", "t2", "t3"]);
}

#[test]
fn oom_stream_crosses_classification_boundaries() {
    let now = base_time();
    // an OOM mention on a Flux-tagged object still lands in the OOM stream
    let flux_oom = event(EventSpec {
        event_type: "Warning",
        reason: "ReconciliationFailed",
        message: "pod worker-1 OOMKilled during upgrade",
        kind: "HelmRelease",
        last_seen: Some(now - Duration::hours(1)),
        ..Default::default()
    });
    let ooms = extract_oom_events(&[flux_oom]);
    assert_eq!(ooms.len(), 1);
}

#[test]
fn gitops_events_never_appear_in_the_warning_stream() {
    let now = base_time();
    let events = vec![
        event(EventSpec {
            event_type: "Warning",
            reason: "ReconciliationFailed",
            kind: "HelmRelease",
            last_seen: Some(now - Duration::hours(1)),
            ..Default::default()
        }),
        event(EventSpec {
            event_type: "Warning",
            reason: "FailedScheduling",
            last_seen: Some(now - Duration::hours(1)),
            ..Default::default()
        }),
    ];
    let warnings = classify_warning_events(&events, now);
    assert_eq!(warnings.last_24h.len(), 1);
    assert_eq!(warnings.last_24h[0].reason, "FailedScheduling");

    let gitops = classify_gitops_events(&events, now);
    assert_eq!(gitops.last_24h.len(), 1);
    assert_eq!(gitops.last_24h[0].reason, "ReconciliationFailed");
}

#[test]
fn unparseable_timestamps_drop_from_every_window_but_not_the_oom_stream() {
    let now = base_time();
    let no_time = event(EventSpec {
        event_type: "Warning",
        reason: "OOMKilled",
        ..Default::default()
    });

    assert!(classify_warning_events(&[no_time.clone()], now).last_48h.is_empty());
    let ooms = extract_oom_events(&[no_time]);
    assert_eq!(ooms.len(), 1);
    assert!(ooms[0].timestamp.is_none());
}
