//! Container restart aggregation
//!
//! Extracts per-container restart history and attributes a best-effort
//! last-restart time and reason, then windows the records over 24h, 48h
//! and 7 days.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::{ContainerStatus, Pod};

/// One container with a non-zero restart count.
#[derive(Debug, Clone)]
pub struct PodRestart {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub restart_count: i32,
    /// Best-effort; absent when no termination record and no pod start
    /// time were available. Absent times keep the record out of every
    /// window.
    pub last_restart: Option<DateTime<Utc>>,
    pub reason: String,
}

/// Restart records windowed over 24h/48h/7d, plus unique-pod counts.
#[derive(Debug, Clone, Default)]
pub struct RestartReport {
    pub last_24h: Vec<PodRestart>,
    pub last_48h: Vec<PodRestart>,
    pub last_7d: Vec<PodRestart>,
    pub pods_24h: usize,
    pub pods_48h: usize,
    pub pods_7d: usize,
}

/// Last-restart evidence, in decreasing order of confidence:
/// the previous termination record, the current termination record,
/// then the pod start time with reason "Unknown".
fn restart_evidence(pod: &Pod, status: &ContainerStatus) -> (Option<DateTime<Utc>>, String) {
    if let Some(terminated) = status
        .last_state
        .as_ref()
        .and_then(|s| s.terminated.as_ref())
    {
        let reason = terminated
            .reason
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        return (terminated.finished_at.as_ref().map(|t| t.0), reason);
    }

    if let Some(terminated) = status.state.as_ref().and_then(|s| s.terminated.as_ref()) {
        let reason = terminated
            .reason
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        return (terminated.finished_at.as_ref().map(|t| t.0), reason);
    }

    let start = pod
        .status
        .as_ref()
        .and_then(|s| s.start_time.as_ref())
        .map(|t| t.0);
    (start, "Unknown".to_string())
}

/// Aggregate restart activity across all pods.
///
/// Each windowed list is sorted by restart count, highest first; the
/// unique-pod count per window is the number of distinct
/// `(namespace, pod)` pairs in that window's list.
pub fn aggregate_restarts(pods: &[Pod], now: DateTime<Utc>) -> RestartReport {
    let mut report = RestartReport::default();

    for pod in pods {
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();
        let name = pod.metadata.name.clone().unwrap_or_default();
        let statuses = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_ref());
        let Some(statuses) = statuses else {
            continue;
        };

        for status in statuses {
            if status.restart_count <= 0 {
                continue;
            }
            let (last_restart, reason) = restart_evidence(pod, status);
            let restart = PodRestart {
                namespace: namespace.clone(),
                pod: name.clone(),
                container: status.name.clone(),
                restart_count: status.restart_count,
                last_restart,
                reason,
            };

            let Some(at) = last_restart else {
                continue;
            };
            if at > now - Duration::hours(24) {
                report.last_24h.push(restart.clone());
            }
            if at > now - Duration::hours(48) {
                report.last_48h.push(restart.clone());
            }
            if at > now - Duration::days(7) {
                report.last_7d.push(restart);
            }
        }
    }

    for list in [
        &mut report.last_24h,
        &mut report.last_48h,
        &mut report.last_7d,
    ] {
        list.sort_by(|a, b| b.restart_count.cmp(&a.restart_count));
    }

    report.pods_24h = unique_pods(&report.last_24h);
    report.pods_48h = unique_pods(&report.last_48h);
    report.pods_7d = unique_pods(&report.last_7d);
    report
}

fn unique_pods(restarts: &[PodRestart]) -> usize {
    restarts
        .iter()
        .map(|r| (r.namespace.as_str(), r.pod.as_str()))
        .collect::<HashSet<_>>()
        .len()
}
