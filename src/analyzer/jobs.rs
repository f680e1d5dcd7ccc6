//! Short-lived Job churn
//!
//! Batch pods that finish in under two minutes create constant
//! scheduling churn. This counts them against the total Job-owned pod
//! population so the report can call out the ratio.

use chrono::Duration;
use k8s_openapi::api::core::v1::Pod;

/// Job-owned pod churn counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobChurn {
    pub short_jobs: usize,
    pub total_jobs: usize,
}

/// Count Job-owned pods and how many of them completed quickly.
///
/// A pod is short-lived when it succeeded and any container terminated
/// within two minutes of the pod's start time.
pub fn assess_job_churn(pods: &[Pod]) -> JobChurn {
    let mut churn = JobChurn::default();

    for pod in pods {
        let owned_by_job = pod
            .metadata
            .owner_references
            .as_ref()
            .is_some_and(|owners| owners.iter().any(|o| o.kind == "Job"));
        if !owned_by_job {
            continue;
        }
        churn.total_jobs += 1;

        let Some(status) = pod.status.as_ref() else {
            continue;
        };
        if status.phase.as_deref() != Some("Succeeded") {
            continue;
        }
        let Some(started) = status.start_time.as_ref().map(|t| t.0) else {
            continue;
        };

        let finished_fast = status
            .container_statuses
            .iter()
            .flatten()
            .filter_map(|cs| cs.state.as_ref())
            .filter_map(|s| s.terminated.as_ref())
            .filter_map(|t| t.finished_at.as_ref())
            .any(|finished| finished.0 - started < Duration::minutes(2));
        if finished_fast {
            churn.short_jobs += 1;
        }
    }

    churn
}
