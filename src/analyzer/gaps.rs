//! Resource configuration gap detection
//!
//! Flags every container that runs without resource requests or limits.
//! Missing maps and all-zero maps are the same gap: neither gives the
//! scheduler anything to work with.

use k8s_openapi::api::core::v1::Pod;

use crate::model::quantity::nonzero;

/// A container missing resource requests and/or limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGap {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub missing_requests: bool,
    pub missing_limits: bool,
}

/// Scan all containers for missing requests/limits.
///
/// A request (or limit) map counts as missing when it is absent or when
/// both its CPU and memory quantities are zero. Containers with at least
/// one gap are emitted once; fully configured containers are skipped.
pub fn detect_resource_gaps(pods: &[Pod]) -> Vec<ResourceGap> {
    let mut gaps = Vec::new();

    for pod in pods {
        let namespace = pod.metadata.namespace.clone().unwrap_or_default();
        let name = pod.metadata.name.clone().unwrap_or_default();
        let Some(spec) = pod.spec.as_ref() else {
            continue;
        };

        for container in &spec.containers {
            let resources = container.resources.as_ref();
            let requests = resources.and_then(|r| r.requests.as_ref());
            let limits = resources.and_then(|r| r.limits.as_ref());

            let missing_requests =
                !nonzero(requests, "cpu") && !nonzero(requests, "memory");
            let missing_limits = !nonzero(limits, "cpu") && !nonzero(limits, "memory");

            if missing_requests || missing_limits {
                gaps.push(ResourceGap {
                    namespace: namespace.clone(),
                    pod: name.clone(),
                    container: container.name.clone(),
                    missing_requests,
                    missing_limits,
                });
            }
        }
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn quantities(pairs: &[(&str, &str)]) -> BTreeMap<String, Quantity> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
            .collect()
    }

    fn pod(containers: Vec<Container>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                namespace: Some("abc".to_string()),
                name: Some("web-1".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_resources_block_is_both_gaps() {
        let gaps = detect_resource_gaps(&[pod(vec![Container {
            name: "app".to_string(),
            ..Default::default()
        }])]);
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].missing_requests);
        assert!(gaps[0].missing_limits);
    }

    #[test]
    fn test_all_zero_requests_count_as_missing() {
        let gaps = detect_resource_gaps(&[pod(vec![Container {
            name: "app".to_string(),
            resources: Some(ResourceRequirements {
                requests: Some(quantities(&[("cpu", "0"), ("memory", "0")])),
                limits: Some(quantities(&[("cpu", "500m"), ("memory", "1Gi")])),
                ..Default::default()
            }),
            ..Default::default()
        }])]);
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].missing_requests);
        assert!(!gaps[0].missing_limits);
    }

    #[test]
    fn test_fully_configured_container_emits_nothing() {
        let gaps = detect_resource_gaps(&[pod(vec![Container {
            name: "app".to_string(),
            resources: Some(ResourceRequirements {
                requests: Some(quantities(&[("cpu", "100m"), ("memory", "128Mi")])),
                limits: Some(quantities(&[("memory", "256Mi")])),
                ..Default::default()
            }),
            ..Default::default()
        }])]);
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_one_entry_per_gapped_container() {
        let gaps = detect_resource_gaps(&[pod(vec![
            Container {
                name: "app".to_string(),
                ..Default::default()
            },
            Container {
                name: "sidecar".to_string(),
                ..Default::default()
            },
        ])]);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].container, "app");
        assert_eq!(gaps[1].container, "sidecar");
    }
}
