//! Immutable cluster snapshot
//!
//! One point-in-time capture of cluster object state, assembled by the
//! collector and consumed by the analysis engine. The capture timestamp is
//! carried explicitly so every windowing computation is deterministic and
//! no detector ever reads the wall clock.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Event, Namespace, Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::DynamicObject;

/// Live usage sample for one container, as reported by the metrics API.
///
/// Values are kept as the raw quantity strings the API returned; they are
/// display/annotation material, not inputs to any decision.
#[derive(Debug, Clone, Default)]
pub struct ContainerUsage {
    pub cpu: String,
    pub memory: String,
}

/// Live usage samples for one pod, keyed by container name.
#[derive(Debug, Clone, Default)]
pub struct PodUsage {
    pub containers: HashMap<String, ContainerUsage>,
}

/// Map key for per-pod lookups: `namespace/name`.
pub fn pod_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// One immutable, point-in-time capture of cluster state.
///
/// Optional resource kinds (backups, usage samples) may be empty when the
/// cluster does not expose them; that is a valid snapshot, not an error.
#[derive(Debug, Clone)]
pub struct ClusterSnapshot {
    pub cluster_name: String,
    pub pods: Vec<Pod>,
    pub nodes: Vec<Node>,
    pub events: Vec<Event>,
    pub namespaces: Vec<Namespace>,
    /// Backup custom resources, loosely typed; decoded failure-soft by the
    /// backup evaluator.
    pub backups: Vec<DynamicObject>,
    /// Live usage samples keyed by `namespace/pod`.
    pub pod_usage: HashMap<String, PodUsage>,
    /// Capture timestamp; the engine's only notion of "now".
    pub captured_at: DateTime<Utc>,
}

/// Configured-vs-observed resource values for one running container.
///
/// Presentation and annotation material (report appendix, suggestion
/// prompts); unset values render as "Not Set" and unavailable usage as
/// "N/A", mirroring what operators expect to read.
#[derive(Debug, Clone)]
pub struct PodResourceRow {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub phase: String,
    pub cpu_request: String,
    pub cpu_limit: String,
    pub memory_request: String,
    pub memory_limit: String,
    pub current_cpu: String,
    pub current_memory: String,
}

impl ClusterSnapshot {
    /// Per-container resource rows for running pods, optionally restricted
    /// to one namespace. Sorted by namespace, pod, container.
    pub fn resource_rows(&self, namespace: Option<&str>) -> Vec<PodResourceRow> {
        let mut rows = Vec::new();

        for pod in &self.pods {
            let ns = pod.metadata.namespace.as_deref().unwrap_or("");
            let name = pod.metadata.name.as_deref().unwrap_or("");
            if let Some(wanted) = namespace {
                if ns != wanted {
                    continue;
                }
            }
            let phase = pod
                .status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .unwrap_or("");
            if phase != "Running" {
                continue;
            }
            let Some(spec) = pod.spec.as_ref() else {
                continue;
            };

            let usage = self.pod_usage.get(&pod_key(ns, name));

            for container in &spec.containers {
                let resources = container.resources.as_ref();
                let requests = resources.and_then(|r| r.requests.as_ref());
                let limits = resources.and_then(|r| r.limits.as_ref());
                let sample = usage.and_then(|u| u.containers.get(&container.name));

                rows.push(PodResourceRow {
                    namespace: ns.to_string(),
                    pod: name.to_string(),
                    container: container.name.clone(),
                    phase: phase.to_string(),
                    cpu_request: configured(requests, "cpu"),
                    cpu_limit: configured(limits, "cpu"),
                    memory_request: configured(requests, "memory"),
                    memory_limit: configured(limits, "memory"),
                    current_cpu: observed(sample.map(|s| s.cpu.as_str())),
                    current_memory: observed(sample.map(|s| s.memory.as_str())),
                });
            }
        }

        rows.sort_by(|a, b| {
            (&a.namespace, &a.pod, &a.container).cmp(&(&b.namespace, &b.pod, &b.container))
        });
        rows
    }
}

/// Configured quantity under `key`, or "Not Set".
fn configured(map: Option<&BTreeMap<String, Quantity>>, key: &str) -> String {
    map.and_then(|m| m.get(key))
        .map(|q| q.0.clone())
        .unwrap_or_else(|| "Not Set".to_string())
}

/// Observed usage value, or "N/A" when metrics were unavailable.
fn observed(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec, PodStatus, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn running_pod(ns: &str, name: &str, cpu_request: Option<&str>) -> Pod {
        let requests = cpu_request.map(|v| {
            let mut m = BTreeMap::new();
            m.insert("cpu".to_string(), Quantity(v.to_string()));
            m
        });
        Pod {
            metadata: ObjectMeta {
                namespace: Some(ns.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "app".to_string(),
                    resources: requests.map(|r| ResourceRequirements {
                        requests: Some(r),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                ..Default::default()
            }),
        }
    }

    fn snapshot(pods: Vec<Pod>) -> ClusterSnapshot {
        ClusterSnapshot {
            cluster_name: "test".to_string(),
            pods,
            nodes: Vec::new(),
            events: Vec::new(),
            namespaces: Vec::new(),
            backups: Vec::new(),
            pod_usage: HashMap::new(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_resource_rows_marks_unset_values() {
        let snap = snapshot(vec![running_pod("abc", "web-1", None)]);
        let rows = snap.resource_rows(None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cpu_request, "Not Set");
        assert_eq!(rows[0].memory_limit, "Not Set");
        assert_eq!(rows[0].current_cpu, "N/A");
    }

    #[test]
    fn test_resource_rows_namespace_filter_and_order() {
        let snap = snapshot(vec![
            running_pod("zzz", "b", Some("100m")),
            running_pod("abc", "a", Some("100m")),
            running_pod("abc", "b", Some("100m")),
        ]);
        let all = snap.resource_rows(None);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].namespace, "abc");
        assert_eq!(all[0].pod, "a");

        let scoped = snap.resource_rows(Some("abc"));
        assert_eq!(scoped.len(), 2);
        assert!(scoped.iter().all(|r| r.namespace == "abc"));
    }

    #[test]
    fn test_resource_rows_skips_non_running() {
        let mut pod = running_pod("abc", "done", Some("100m"));
        pod.status.as_mut().unwrap().phase = Some("Succeeded".to_string());
        let snap = snapshot(vec![pod]);
        assert!(snap.resource_rows(None).is_empty());
    }
}
