//! Namespace risk scoring
//!
//! Scores each application namespace by how many of its pods run without
//! resource requests. Which namespaces count as "application" is a
//! pluggable policy; the shipped default keeps the 3-letter-code
//! convention this tool grew up with.

use std::fmt;

use k8s_openapi::api::core::v1::{Namespace, Pod};

use crate::model::quantity::nonzero;

/// Decides which namespaces are scored.
pub trait NamespacePolicy: Send + Sync {
    fn is_application(&self, name: &str) -> bool;
}

/// Default policy: exactly three characters, not a `kube-` namespace.
pub struct ShortCodePolicy;

impl NamespacePolicy for ShortCodePolicy {
    fn is_application(&self, name: &str) -> bool {
        name.len() == 3 && !name.starts_with("kube-")
    }
}

/// Ordinal risk classification, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskTier {
    /// Tier for a given request-gap percentage. Strict thresholds: exactly
    /// 75% is high, anything above is critical.
    pub fn from_gap_percent(percent: f64) -> Self {
        if percent > 75.0 {
            RiskTier::Critical
        } else if percent > 50.0 {
            RiskTier::High
        } else if percent > 25.0 {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Critical => "critical",
            RiskTier::High => "high",
            RiskTier::Medium => "medium",
            RiskTier::Low => "low",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-namespace resource-configuration completeness.
#[derive(Debug, Clone)]
pub struct NamespaceRisk {
    pub namespace: String,
    pub total_pods: usize,
    pub pods_without_requests: usize,
    pub pods_without_limits: usize,
    pub tier: RiskTier,
}

/// True when at least one container carries a non-zero request.
fn pod_has_requests(pod: &Pod) -> bool {
    pod.spec.iter().flat_map(|s| s.containers.iter()).any(|c| {
        let requests = c.resources.as_ref().and_then(|r| r.requests.as_ref());
        nonzero(requests, "cpu") || nonzero(requests, "memory")
    })
}

fn pod_has_limits(pod: &Pod) -> bool {
    pod.spec.iter().flat_map(|s| s.containers.iter()).any(|c| {
        let limits = c.resources.as_ref().and_then(|r| r.limits.as_ref());
        nonzero(limits, "cpu") || nonzero(limits, "memory")
    })
}

/// Score every qualifying namespace.
///
/// Namespaces without pods are skipped (no meaningful ratio). The result
/// is ordered by tier severity; the sort is stable, so namespaces within
/// one tier keep snapshot order.
pub fn score_namespaces(
    pods: &[Pod],
    namespaces: &[Namespace],
    policy: &dyn NamespacePolicy,
) -> Vec<NamespaceRisk> {
    let mut risks: Vec<NamespaceRisk> = namespaces
        .iter()
        .filter_map(|ns| ns.metadata.name.as_deref())
        .filter(|name| policy.is_application(name))
        .filter_map(|name| {
            let in_namespace = || {
                pods.iter()
                    .filter(move |p| p.metadata.namespace.as_deref() == Some(name))
            };

            let total_pods = in_namespace().count();
            if total_pods == 0 {
                return None;
            }
            let pods_without_requests =
                in_namespace().filter(|p| !pod_has_requests(p)).count();
            let pods_without_limits = in_namespace().filter(|p| !pod_has_limits(p)).count();

            let gap_percent = pods_without_requests as f64 / total_pods as f64 * 100.0;
            Some(NamespaceRisk {
                namespace: name.to_string(),
                total_pods,
                pods_without_requests,
                pods_without_limits,
                tier: RiskTier::from_gap_percent(gap_percent),
            })
        })
        .collect();

    risks.sort_by_key(|r| r.tier);
    risks
}
