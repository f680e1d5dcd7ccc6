//! Node request-pressure evaluation
//!
//! Sums scheduled pod requests per node and compares them against the
//! node's allocatable capacity. A node over 80% requested on a dimension
//! is flagged on that dimension; the two dimensions are independent.

use std::fmt;

use k8s_openapi::api::core::v1::{Node, Pod};

use crate::model::quantity::{cpu_millicores, memory_bytes};

/// Fraction of allocatable capacity above which requests are flagged.
const PRESSURE_THRESHOLD_PERCENT: f64 = 80.0;

/// The dimension a node was flagged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePressureKind {
    HighCpuRequests,
    HighMemoryRequests,
}

impl fmt::Display for NodePressureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodePressureKind::HighCpuRequests => write!(f, "high CPU requests"),
            NodePressureKind::HighMemoryRequests => write!(f, "high memory requests"),
        }
    }
}

/// One violated dimension on one node.
///
/// CPU values are millicores, memory values are bytes.
#[derive(Debug, Clone)]
pub struct NodeIssue {
    pub node: String,
    pub kind: NodePressureKind,
    pub requested_cpu: i64,
    pub requested_memory: i64,
    pub allocatable_cpu: i64,
    pub allocatable_memory: i64,
}

impl NodeIssue {
    /// Requested-over-allocatable percentage for the flagged dimension.
    pub fn utilization_percent(&self) -> Option<f64> {
        let (requested, allocatable) = match self.kind {
            NodePressureKind::HighCpuRequests => (self.requested_cpu, self.allocatable_cpu),
            NodePressureKind::HighMemoryRequests => {
                (self.requested_memory, self.allocatable_memory)
            }
        };
        if allocatable <= 0 {
            return None;
        }
        Some(requested as f64 / allocatable as f64 * 100.0)
    }
}

/// Evaluate request pressure for every node.
///
/// A pod contributes the requests of all its containers to the node it is
/// assigned to; absent requests contribute zero. Nodes reporting zero
/// allocatable on a dimension are skipped on that dimension — the ratio is
/// undefined there, not an issue.
pub fn evaluate_node_pressure(nodes: &[Node], pods: &[Pod]) -> Vec<NodeIssue> {
    let mut issues = Vec::new();

    for node in nodes {
        let node_name = node.metadata.name.clone().unwrap_or_default();

        let (requested_cpu, requested_memory) = pods
            .iter()
            .filter(|pod| {
                pod.spec
                    .as_ref()
                    .and_then(|s| s.node_name.as_deref())
                    .is_some_and(|assigned| assigned == node_name)
            })
            .flat_map(|pod| pod.spec.iter().flat_map(|s| s.containers.iter()))
            .fold((0i64, 0i64), |(cpu, memory), container| {
                let requests = container
                    .resources
                    .as_ref()
                    .and_then(|r| r.requests.as_ref());
                let c = requests
                    .and_then(|r| r.get("cpu"))
                    .and_then(cpu_millicores)
                    .unwrap_or(0);
                let m = requests
                    .and_then(|r| r.get("memory"))
                    .and_then(memory_bytes)
                    .unwrap_or(0);
                (cpu + c, memory + m)
            });

        let allocatable = node.status.as_ref().and_then(|s| s.allocatable.as_ref());
        let allocatable_cpu = allocatable
            .and_then(|a| a.get("cpu"))
            .and_then(cpu_millicores)
            .unwrap_or(0);
        let allocatable_memory = allocatable
            .and_then(|a| a.get("memory"))
            .and_then(memory_bytes)
            .unwrap_or(0);

        let mut flag = |kind: NodePressureKind, requested: i64, capacity: i64| {
            if capacity <= 0 {
                return;
            }
            if requested as f64 / capacity as f64 * 100.0 > PRESSURE_THRESHOLD_PERCENT {
                issues.push(NodeIssue {
                    node: node_name.clone(),
                    kind,
                    requested_cpu,
                    requested_memory,
                    allocatable_cpu,
                    allocatable_memory,
                });
            }
        };

        flag(
            NodePressureKind::HighCpuRequests,
            requested_cpu,
            allocatable_cpu,
        );
        flag(
            NodePressureKind::HighMemoryRequests,
            requested_memory,
            allocatable_memory,
        );
    }

    issues
}
