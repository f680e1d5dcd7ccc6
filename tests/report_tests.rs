//! Report rendering and file output tests

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use kubescout::ai::{AiInsights, ResourceSuggestion};
use kubescout::analyzer::Analyzer;
use kubescout::model::ClusterSnapshot;
use kubescout::report;
use kubescout::report::markdown::SuggestionsByNamespace;

fn capture_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn bare_pod(ns: &str, name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "app".to_string(),
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

fn snapshot() -> ClusterSnapshot {
    ClusterSnapshot {
        cluster_name: "prod-east".to_string(),
        pods: vec![bare_pod("abc", "web-1")],
        nodes: Vec::new(),
        events: Vec::new(),
        namespaces: Vec::new(),
        backups: Vec::new(),
        pod_usage: HashMap::new(),
        captured_at: capture_time(),
    }
}

#[test]
fn report_contains_every_section_heading() {
    let snap = snapshot();
    let analysis = Analyzer::default().analyze(&snap);
    let markdown = report::markdown::render(&snap, &analysis, None, &Default::default());

    for heading in [
        "# Kubernetes Cluster Analysis Report",
        "## 1. Cluster Health Summary",
        "## 2. Critical Issues",
        "## 3. Resource Configuration Gaps",
        "## 4. Node Analysis",
        "## 5. Pod Restarts",
        "## 6. GitOps Reconciliation Events",
        "## 7. Warning Events",
        "## 8. Backups",
        "## 9. RabbitMQ Stability",
        "## 10. Namespace Risk Analysis",
        "## Appendix: Pod Resource Details",
    ] {
        assert!(markdown.contains(heading), "missing heading: {}", heading);
    }
}

#[test]
fn clean_cluster_renders_positive_messages() {
    let mut snap = snapshot();
    snap.pods.clear();
    let analysis = Analyzer::default().analyze(&snap);
    let markdown = report::markdown::render(&snap, &analysis, None, &Default::default());

    assert!(markdown.contains("Overall Health**: HEALTHY"));
    assert!(markdown.contains("No critical issues detected"));
    assert!(markdown.contains("All containers have resource requests and limits configured"));
    assert!(markdown.contains("No nodes show high request pressure"));
}

#[test]
fn gapped_cluster_reports_issue_and_examples() {
    let snap = snapshot();
    let analysis = Analyzer::default().analyze(&snap);
    let markdown = report::markdown::render(&snap, &analysis, None, &Default::default());

    assert!(markdown.contains("Overall Health**: DEGRADED"));
    assert!(markdown.contains("Missing Resource Requests and Limits"));
    assert!(markdown.contains("abc/web-1"));
}

#[test]
fn insights_render_when_present() {
    let snap = snapshot();
    let analysis = Analyzer::default().analyze(&snap);
    let insights = AiInsights {
        summary: "The cluster is mostly fine.".to_string(),
        recommendations: Vec::new(),
        risk_assessment: String::new(),
        automation_suggestions: vec!["Implement ResourceQuota policies".to_string()],
    };
    let markdown = report::markdown::render(&snap, &analysis, Some(&insights), &Default::default());
    assert!(markdown.contains("## 11. AI Insights"));
    assert!(markdown.contains("The cluster is mostly fine."));

    let without = report::markdown::render(&snap, &analysis, None, &Default::default());
    assert!(!without.contains("## 11. AI Insights"));
}

#[test]
fn suggestions_appear_in_the_appendix() {
    let snap = snapshot();
    let analysis = Analyzer::default().analyze(&snap);

    let mut by_container = HashMap::new();
    by_container.insert(
        "web-1/app".to_string(),
        ResourceSuggestion {
            cpu_request: "100m".to_string(),
            cpu_limit: "KEEP".to_string(),
            memory_request: "256Mi".to_string(),
            memory_limit: "KEEP".to_string(),
        },
    );
    let mut suggestions = SuggestionsByNamespace::new();
    suggestions.insert("abc".to_string(), by_container);

    let markdown = report::markdown::render(&snap, &analysis, None, &suggestions);
    assert!(markdown.contains("Suggested"));
    assert!(markdown.contains("cpu req 100m, mem req 256Mi"));
}

#[test]
fn reports_written_to_named_directory() {
    let snap = snapshot();
    let analysis = Analyzer::default().analyze(&snap);
    let markdown = report::markdown::render(&snap, &analysis, None, &Default::default());

    let tmp = tempfile::tempdir().unwrap();
    let basename = report::report_basename(&snap.cluster_name, snap.captured_at);
    assert_eq!(basename, "prod-east-20250601-120000");

    let paths = report::write_reports(tmp.path(), &basename, &markdown).unwrap();
    assert!(paths.markdown.exists());
    assert!(paths.html.exists());

    let html = std::fs::read_to_string(&paths.html).unwrap();
    assert!(html.contains("<h1>Kubernetes Cluster Analysis Report</h1>"));
    assert!(html.contains("<table>"));
}

#[test]
fn backup_duration_renders_in_progress_for_incomplete_backups() {
    let mut snap = snapshot();
    snap.pods.clear();
    let started = capture_time() - Duration::hours(1);
    snap.backups = vec![
        serde_json::from_value(serde_json::json!({
            "apiVersion": "velero.io/v1",
            "kind": "Backup",
            "metadata": { "name": "running", "namespace": "velero" },
            "status": { "phase": "InProgress", "startTimestamp": started.to_rfc3339() },
        }))
        .unwrap(),
    ];

    let analysis = Analyzer::default().analyze(&snap);
    let markdown = report::markdown::render(&snap, &analysis, None, &Default::default());
    assert!(markdown.contains("in progress"));
}
