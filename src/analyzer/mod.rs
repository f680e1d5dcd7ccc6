//! Cluster analysis engine
//!
//! A pure, synchronous transformation: one immutable snapshot in, one
//! immutable findings structure out. The detectors read disjoint views of
//! the snapshot and never depend on each other; only the final synthesis
//! step reads across their outputs. Nothing here performs I/O, reads the
//! clock, or retries — the snapshot's capture timestamp is the engine's
//! entire notion of time.

pub mod backups;
pub mod events;
pub mod gaps;
pub mod issues;
pub mod jobs;
pub mod namespaces;
pub mod nodes;
pub mod restarts;
pub mod workload;

pub use backups::{BackupRecord, BackupReport, decode_backup};
pub use events::{EventRecord, GitopsEventReport, OomEvent, WarningEventReport};
pub use gaps::ResourceGap;
pub use issues::{ClusterHealth, CriticalIssue};
pub use jobs::JobChurn;
pub use namespaces::{NamespacePolicy, NamespaceRisk, RiskTier, ShortCodePolicy};
pub use nodes::{NodeIssue, NodePressureKind};
pub use restarts::{PodRestart, RestartReport};
pub use workload::{NameContains, WorkloadClassifier, WorkloadStability};

use crate::model::ClusterSnapshot;

/// Complete findings for one snapshot.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub cluster_health: ClusterHealth,
    pub critical_issues: Vec<CriticalIssue>,
    pub resource_gaps: Vec<ResourceGap>,
    pub node_issues: Vec<NodeIssue>,
    pub oom_events: Vec<OomEvent>,
    pub namespace_risks: Vec<NamespaceRisk>,
    pub workload_label: String,
    pub workload_stability: WorkloadStability,
    pub job_churn: JobChurn,
    pub restarts: RestartReport,
    pub gitops_events: GitopsEventReport,
    pub warning_events: WarningEventReport,
    pub backups: BackupReport,
}

/// The analysis engine, holding its two replaceable policies.
///
/// Defaults reproduce the conventions this tool was built around: RabbitMQ
/// as the protected workload and 3-letter application namespaces.
pub struct Analyzer {
    workload: Box<dyn WorkloadClassifier>,
    namespaces: Box<dyn NamespacePolicy>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            workload: Box::new(NameContains::rabbitmq()),
            namespaces: Box::new(ShortCodePolicy),
        }
    }
}

impl Analyzer {
    pub fn new(
        workload: Box<dyn WorkloadClassifier>,
        namespaces: Box<dyn NamespacePolicy>,
    ) -> Self {
        Self {
            workload,
            namespaces,
        }
    }

    /// Run every detector over the snapshot and synthesize the findings.
    ///
    /// Always returns a (possibly empty) findings set; malformed individual
    /// records are dropped by the detectors, never surfaced as errors.
    pub fn analyze(&self, snapshot: &ClusterSnapshot) -> Analysis {
        let now = snapshot.captured_at;

        let resource_gaps = gaps::detect_resource_gaps(&snapshot.pods);
        let node_issues = nodes::evaluate_node_pressure(&snapshot.nodes, &snapshot.pods);
        let oom_events = events::extract_oom_events(&snapshot.events);
        let gitops_events = events::classify_gitops_events(&snapshot.events, now);
        let warning_events = events::classify_warning_events(&snapshot.events, now);
        let restarts = restarts::aggregate_restarts(&snapshot.pods, now);
        let backups = backups::evaluate_backups(&snapshot.backups, now);
        let namespace_risks = namespaces::score_namespaces(
            &snapshot.pods,
            &snapshot.namespaces,
            self.namespaces.as_ref(),
        );
        let workload_stability = workload::assess_workload(
            &snapshot.pods,
            &oom_events,
            now,
            self.workload.as_ref(),
        );
        let job_churn = jobs::assess_job_churn(&snapshot.pods);

        let critical_issues = issues::synthesize_issues(&resource_gaps, &oom_events, &node_issues);
        let cluster_health = issues::rate_health(&critical_issues, oom_events.len());

        Analysis {
            cluster_health,
            critical_issues,
            resource_gaps,
            node_issues,
            oom_events,
            namespace_risks,
            workload_label: self.workload.label().to_string(),
            workload_stability,
            job_churn,
            restarts,
            gitops_events,
            warning_events,
            backups,
        }
    }
}
