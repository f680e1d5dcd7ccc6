//! Finding synthesis
//!
//! Reduces the detector outputs to a fixed-priority issue list and an
//! overall health rating. Stateless: the same findings always produce the
//! same issues and the same rating.

use std::fmt;

use crate::analyzer::events::OomEvent;
use crate::analyzer::gaps::ResourceGap;
use crate::analyzer::nodes::NodeIssue;

/// Representative examples embedded per issue.
const MAX_EXAMPLES: usize = 3;

/// Overall cluster health rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterHealth {
    Healthy,
    Degraded,
    Critical,
}

impl ClusterHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterHealth::Healthy => "healthy",
            ClusterHealth::Degraded => "degraded",
            ClusterHealth::Critical => "critical",
        }
    }
}

impl fmt::Display for ClusterHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One synthesized, ranked issue.
#[derive(Debug, Clone)]
pub struct CriticalIssue {
    /// 1 is the highest priority.
    pub priority: u8,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub examples: Vec<String>,
}

/// Build the ranked issue list.
///
/// The priority scheme is fixed: resource gaps (1), OOM events (2), node
/// pressure (3). Each issue carries the first few entries of its source
/// list as examples.
pub fn synthesize_issues(
    gaps: &[ResourceGap],
    ooms: &[OomEvent],
    node_issues: &[NodeIssue],
) -> Vec<CriticalIssue> {
    let mut issues = Vec::new();

    if !gaps.is_empty() {
        let examples = gaps
            .iter()
            .take(MAX_EXAMPLES)
            .map(|g| format!("{}/{} (container: {})", g.namespace, g.pod, g.container))
            .collect();
        issues.push(CriticalIssue {
            priority: 1,
            title: "Missing Resource Requests and Limits".to_string(),
            description: format!(
                "{} containers are missing resource requests or limits",
                gaps.len()
            ),
            impact: "Prevents proper scheduling, impacts backups, and can cause cluster \
                     instability"
                .to_string(),
            recommendation: "Set resource requests and limits for all containers based on \
                             observed usage patterns"
                .to_string(),
            examples,
        });
    }

    if !ooms.is_empty() {
        let examples = ooms
            .iter()
            .take(MAX_EXAMPLES)
            .map(|o| {
                let at = o
                    .timestamp
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown time".to_string());
                format!("{}/{} at {}", o.namespace, o.pod, at)
            })
            .collect();
        issues.push(CriticalIssue {
            priority: 2,
            title: "OOMKilled Events Detected".to_string(),
            description: format!("{} OOMKilled events found in recent history", ooms.len()),
            impact: "Workload disruptions, data loss, and degraded application performance"
                .to_string(),
            recommendation: "Increase memory limits for affected pods or optimize application \
                             memory usage"
                .to_string(),
            examples,
        });
    }

    if !node_issues.is_empty() {
        let examples = node_issues
            .iter()
            .take(MAX_EXAMPLES)
            .map(|n| match n.utilization_percent() {
                Some(pct) => format!("{}: {} ({:.1}% requested)", n.node, n.kind, pct),
                None => format!("{}: {}", n.node, n.kind),
            })
            .collect();
        issues.push(CriticalIssue {
            priority: 3,
            title: "High Node Resource Utilization".to_string(),
            description: format!(
                "{} nodes showing high resource utilization",
                node_issues.len()
            ),
            impact: "Limited scheduling capacity, potential cascading failures during node \
                     issues"
                .to_string(),
            recommendation: "Scale node pool or rebalance workloads across nodes".to_string(),
            examples,
        });
    }

    issues
}

/// Derive the overall health rating from the synthesized issues.
pub fn rate_health(issues: &[CriticalIssue], oom_count: usize) -> ClusterHealth {
    let high_priority = issues.iter().filter(|i| i.priority <= 2).count();

    if high_priority > 3 || oom_count > 10 {
        ClusterHealth::Critical
    } else if high_priority > 0 || oom_count > 0 {
        ClusterHealth::Degraded
    } else {
        ClusterHealth::Healthy
    }
}
