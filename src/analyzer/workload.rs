//! Protected-workload stability assessment
//!
//! Some workloads (message brokers, most prominently) must be the last
//! thing the cluster sacrifices under memory pressure. Identity is a
//! pluggable classifier; the shipped default matches RabbitMQ pods by
//! name. The rubric is fixed: priority class present, memory limits
//! present, no recent OOM kills.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::Pod;

use crate::analyzer::events::OomEvent;
use crate::model::quantity::nonzero;

/// Decides which pods receive special stability treatment.
#[cfg_attr(test, mockall::automock)]
pub trait WorkloadClassifier: Send + Sync {
    /// True when the pod belongs to the protected workload.
    fn matches(&self, pod: &Pod) -> bool;

    /// Human-readable workload name for report headings.
    fn label(&self) -> &str;
}

/// Case-insensitive pod-name substring classifier.
pub struct NameContains {
    needle: String,
    label: String,
}

impl NameContains {
    pub fn new(needle: &str, label: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
            label: label.to_string(),
        }
    }

    /// The default protected workload.
    pub fn rabbitmq() -> Self {
        Self::new("rabbit", "RabbitMQ")
    }
}

impl WorkloadClassifier for NameContains {
    fn matches(&self, pod: &Pod) -> bool {
        pod.metadata
            .name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&self.needle))
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Aggregate stability posture of the protected workload.
#[derive(Debug, Clone, Default)]
pub struct WorkloadStability {
    /// Matched pods as `namespace/name`, in snapshot order.
    pub pods: Vec<String>,
    pub has_priority_class: bool,
    pub has_resource_limits: bool,
    /// OOM kills involving matched pods within the last 7 days.
    pub recent_oom_count: usize,
}

/// Assess the protected workload across all matched pods.
///
/// One summary, not per-pod: the question is "is this workload protected",
/// and a single unprotected replica already answers it.
pub fn assess_workload(
    pods: &[Pod],
    ooms: &[OomEvent],
    now: DateTime<Utc>,
    classifier: &dyn WorkloadClassifier,
) -> WorkloadStability {
    let mut stability = WorkloadStability::default();
    let mut matched: HashSet<(String, String)> = HashSet::new();

    for pod in pods.iter().filter(|p| classifier.matches(p)) {
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();
        let name = pod.metadata.name.clone().unwrap_or_default();
        stability.pods.push(format!("{}/{}", namespace, name));
        matched.insert((namespace, name));

        let Some(spec) = pod.spec.as_ref() else {
            continue;
        };
        if spec
            .priority_class_name
            .as_deref()
            .is_some_and(|p| !p.is_empty())
        {
            stability.has_priority_class = true;
        }
        if spec.containers.iter().any(|c| {
            nonzero(
                c.resources.as_ref().and_then(|r| r.limits.as_ref()),
                "memory",
            )
        }) {
            stability.has_resource_limits = true;
        }
    }

    stability.recent_oom_count = ooms
        .iter()
        .filter(|oom| {
            oom.timestamp
                .is_some_and(|t| t > now - Duration::days(7))
        })
        .filter(|oom| matched.contains(&(oom.namespace.clone(), oom.pod.clone())))
        .count();

    stability
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn pod(ns: &str, name: &str, priority_class: Option<&str>, memory_limit: Option<&str>) -> Pod {
        let limits = memory_limit.map(|v| {
            let mut m = BTreeMap::new();
            m.insert("memory".to_string(), Quantity(v.to_string()));
            m
        });
        Pod {
            metadata: ObjectMeta {
                namespace: Some(ns.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                priority_class_name: priority_class.map(String::from),
                containers: vec![Container {
                    name: "app".to_string(),
                    resources: limits.map(|l| ResourceRequirements {
                        limits: Some(l),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn oom(ns: &str, pod: &str, at: Option<DateTime<Utc>>) -> OomEvent {
        OomEvent {
            node: String::new(),
            namespace: ns.to_string(),
            pod: pod.to_string(),
            container: String::new(),
            timestamp: at,
            reason: "OOMKilled".to_string(),
        }
    }

    #[test]
    fn test_default_classifier_matches_case_insensitively() {
        let classifier = NameContains::rabbitmq();
        assert!(classifier.matches(&pod("mq", "RabbitMQ-server-0", None, None)));
        assert!(classifier.matches(&pod("mq", "my-rabbit-1", None, None)));
        assert!(!classifier.matches(&pod("mq", "kafka-0", None, None)));
    }

    #[test]
    fn test_any_matched_pod_can_satisfy_each_rubric_item() {
        let now = Utc::now();
        let stability = assess_workload(
            &[
                pod("mq", "rabbitmq-0", Some("critical"), None),
                pod("mq", "rabbitmq-1", None, Some("2Gi")),
            ],
            &[],
            now,
            &NameContains::rabbitmq(),
        );
        assert_eq!(stability.pods.len(), 2);
        assert!(stability.has_priority_class);
        assert!(stability.has_resource_limits);
    }

    #[test]
    fn test_oom_count_limited_to_matched_pods_and_window() {
        let now = Utc::now();
        let stability = assess_workload(
            &[pod("mq", "rabbitmq-0", None, None)],
            &[
                oom("mq", "rabbitmq-0", Some(now - Duration::days(1))),
                oom("mq", "rabbitmq-0", Some(now - Duration::days(10))),
                oom("web", "frontend-0", Some(now - Duration::days(1))),
                oom("mq", "rabbitmq-0", None),
            ],
            now,
            &NameContains::rabbitmq(),
        );
        assert_eq!(stability.recent_oom_count, 1);
    }

    #[test]
    fn test_custom_classifier_via_mock() {
        let mut classifier = MockWorkloadClassifier::new();
        classifier
            .expect_matches()
            .returning(|pod| pod.metadata.namespace.as_deref() == Some("db"));

        let stability = assess_workload(
            &[
                pod("db", "postgres-0", Some("critical"), None),
                pod("mq", "rabbitmq-0", None, None),
            ],
            &[],
            Utc::now(),
            &classifier,
        );
        assert_eq!(stability.pods, vec!["db/postgres-0".to_string()]);
        assert!(stability.has_priority_class);
    }

    #[test]
    fn test_empty_match_set_is_all_defaults() {
        let stability = assess_workload(&[], &[], Utc::now(), &NameContains::rabbitmq());
        assert!(stability.pods.is_empty());
        assert!(!stability.has_priority_class);
        assert!(!stability.has_resource_limits);
        assert_eq!(stability.recent_oom_count, 0);
    }
}
