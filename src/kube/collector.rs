//! Snapshot collection
//!
//! Lists the cluster state the engine analyzes and packages it as one
//! immutable snapshot. Required kinds (pods, nodes, events, namespaces)
//! fail the snapshot when unavailable; optional kinds (backup custom
//! resources, live metrics) degrade to empty collections so a cluster
//! without them still produces a full report.

use std::collections::HashMap;
use std::fmt::Debug;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::try_join;
use k8s_openapi::api::core::v1::{ConfigMap, Event, Namespace, Node, Pod};
use kube::Client;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use serde::de::DeserializeOwned;

use crate::model::{ClusterSnapshot, ContainerUsage, PodUsage, pod_key};

/// Page size for list calls; large clusters paginate via continue tokens.
const PAGE_LIMIT: u32 = 500;

/// Node labels that commonly carry a human cluster name.
const CLUSTER_NAME_LABELS: &[&str] = &[
    "cluster-name",
    "alpha.eksctl.io/cluster-name",
    "kubernetes.azure.com/cluster",
];

/// Collects one point-in-time snapshot of cluster state.
pub struct Collector {
    client: Client,
}

impl Collector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Capture a snapshot of the cluster.
    ///
    /// The capture timestamp is stamped once here; everything downstream
    /// windows against it.
    pub async fn snapshot(&self) -> Result<ClusterSnapshot> {
        let (pods, nodes, events, namespaces) = try_join!(
            self.list_all::<Pod>("pods"),
            self.list_all::<Node>("nodes"),
            self.list_all::<Event>("events"),
            self.list_all::<Namespace>("namespaces"),
        )?;

        let backups = self.backups().await;
        let pod_usage = self.pod_usage().await;
        let cluster_name = self.cluster_name(&nodes).await;

        tracing::info!(
            pods = pods.len(),
            nodes = nodes.len(),
            events = events.len(),
            backups = backups.len(),
            "collected cluster snapshot"
        );

        Ok(ClusterSnapshot {
            cluster_name,
            pods,
            nodes,
            events,
            namespaces,
            backups,
            pod_usage,
            captured_at: Utc::now(),
        })
    }

    /// List a resource kind cluster-wide, following continue tokens.
    async fn list_all<K>(&self, what: &str) -> Result<Vec<K>>
    where
        K: kube::Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let mut items = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut params = ListParams::default().limit(PAGE_LIMIT);
            if let Some(t) = &token {
                params = params.continue_token(t);
            }
            let page = api
                .list(&params)
                .await
                .with_context(|| format!("failed to list {}", what))?;
            items.extend(page.items);
            token = page.metadata.continue_.filter(|t| !t.is_empty());
            if token.is_none() {
                break;
            }
        }

        tracing::debug!(count = items.len(), "listed {}", what);
        Ok(items)
    }

    /// Velero backup custom resources, empty when Velero is not installed.
    async fn backups(&self) -> Vec<DynamicObject> {
        let gvk = GroupVersionKind::gvk("velero.io", "v1", "Backup");
        let resource = ApiResource::from_gvk(&gvk);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        match api.list(&ListParams::default()).await {
            Ok(list) => list.items,
            Err(err) => {
                tracing::debug!(error = %err, "backup resources unavailable, skipping");
                Vec::new()
            }
        }
    }

    /// Live usage samples from the metrics API, empty when metrics-server
    /// is not running.
    async fn pod_usage(&self) -> HashMap<String, PodUsage> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "pods");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let list = match api.list(&ListParams::default()).await {
            Ok(list) => list,
            Err(err) => {
                tracing::debug!(error = %err, "pod metrics unavailable, skipping");
                return HashMap::new();
            }
        };

        let mut usage = HashMap::new();
        for item in list.items {
            let namespace = item.metadata.namespace.as_deref().unwrap_or("");
            let name = item.metadata.name.as_deref().unwrap_or("");
            let Some(containers) = item.data.get("containers").and_then(|c| c.as_array()) else {
                continue;
            };

            let mut pod = PodUsage::default();
            for container in containers {
                let Some(container_name) = container.get("name").and_then(|n| n.as_str()) else {
                    continue;
                };
                let sample = ContainerUsage {
                    cpu: container
                        .pointer("/usage/cpu")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    memory: container
                        .pointer("/usage/memory")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                };
                pod.containers.insert(container_name.to_string(), sample);
            }
            usage.insert(pod_key(namespace, name), pod);
        }
        usage
    }

    /// Best-effort cluster name: the `cluster-info` ConfigMap first, then
    /// well-known node labels.
    async fn cluster_name(&self, nodes: &[Node]) -> String {
        for namespace in ["kube-system", "kube-public"] {
            let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
            if let Ok(Some(cm)) = api.get_opt("cluster-info").await {
                if let Some(name) = cm.data.as_ref().and_then(|d| d.get("cluster-name")) {
                    return name.clone();
                }
            }
        }

        if let Some(labels) = nodes.first().and_then(|n| n.metadata.labels.as_ref()) {
            for key in CLUSTER_NAME_LABELS {
                if let Some(name) = labels.get(*key) {
                    return name.clone();
                }
            }
        }

        "Unknown Cluster".to_string()
    }
}
