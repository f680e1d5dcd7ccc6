//! Markdown rendering of the findings
//!
//! Section ordering mirrors how operators triage: overall health first,
//! then the ranked issues, then each detector's detail. Every empty list
//! renders a positive "no issues" line rather than disappearing.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;

use crate::ai::{AiInsights, KEEP, ResourceSuggestion};
use crate::analyzer::{Analysis, ClusterHealth, RiskTier};
use crate::model::ClusterSnapshot;

/// Cap for detail tables; full counts are always stated alongside.
const MAX_TABLE_ROWS: usize = 20;

/// Suggestions keyed by namespace, then by `pod/container`.
pub type SuggestionsByNamespace = BTreeMap<String, HashMap<String, ResourceSuggestion>>;

/// Render the complete markdown report.
pub fn render(
    snapshot: &ClusterSnapshot,
    analysis: &Analysis,
    insights: Option<&AiInsights>,
    suggestions: &SuggestionsByNamespace,
) -> String {
    let mut out = String::new();

    out.push_str("# Kubernetes Cluster Analysis Report\n\n");
    out.push_str(&format!("**Cluster:** `{}`\n\n", snapshot.cluster_name));
    out.push_str(&format!(
        "**Generated:** {}\n\n",
        snapshot.captured_at.to_rfc3339()
    ));
    out.push_str("---\n\n");

    health_section(&mut out, snapshot, analysis);
    critical_issues_section(&mut out, analysis);
    resource_gaps_section(&mut out, analysis);
    node_section(&mut out, analysis);
    restarts_section(&mut out, analysis);
    gitops_section(&mut out, analysis);
    warnings_section(&mut out, analysis);
    backups_section(&mut out, analysis);
    workload_section(&mut out, analysis);
    namespace_section(&mut out, analysis);
    if let Some(insights) = insights {
        insights_section(&mut out, insights);
    }
    appendix_section(&mut out, snapshot, suggestions);

    out
}

fn health_badge(health: ClusterHealth) -> &'static str {
    match health {
        ClusterHealth::Healthy => "🟢",
        ClusterHealth::Degraded => "🟡",
        ClusterHealth::Critical => "🔴",
    }
}

fn health_section(out: &mut String, snapshot: &ClusterSnapshot, analysis: &Analysis) {
    out.push_str("## 1. Cluster Health Summary\n\n");
    out.push_str(&format!(
        "{} **Overall Health**: {}\n\n",
        health_badge(analysis.cluster_health),
        analysis.cluster_health.as_str().to_uppercase()
    ));

    let at_risk = analysis
        .namespace_risks
        .iter()
        .filter(|r| matches!(r.tier, RiskTier::Critical | RiskTier::High))
        .count();

    out.push_str("### Key Metrics\n\n");
    out.push_str("| Metric | Value |\n");
    out.push_str("|--------|-------|\n");
    out.push_str(&format!("| Total Pods | {} |\n", snapshot.pods.len()));
    out.push_str(&format!("| Total Nodes | {} |\n", snapshot.nodes.len()));
    out.push_str(&format!(
        "| Containers Missing Resources | {} |\n",
        analysis.resource_gaps.len()
    ));
    out.push_str(&format!(
        "| OOM Events (Recent) | {} |\n",
        analysis.oom_events.len()
    ));
    out.push_str(&format!(
        "| Pods with Restarts (24h) | {} |\n",
        analysis.restarts.pods_24h
    ));
    out.push_str(&format!(
        "| Pods with Restarts (7d) | {} |\n",
        analysis.restarts.pods_7d
    ));
    out.push_str(&format!("| Node Issues | {} |\n", analysis.node_issues.len()));
    out.push_str(&format!("| Namespaces at Risk | {} |\n\n", at_risk));

    if !analysis.critical_issues.is_empty() {
        out.push_str("### ⚠️ Potential Issues Identified\n\n");
        for issue in &analysis.critical_issues {
            out.push_str(&format!("- **{}**: {}\n", issue.title, issue.description));
        }
        out.push('\n');
    }
}

fn critical_issues_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 2. Critical Issues\n\n");
    if analysis.critical_issues.is_empty() {
        out.push_str("✅ No critical issues detected.\n\n");
        return;
    }

    for (i, issue) in analysis.critical_issues.iter().take(5).enumerate() {
        out.push_str(&format!("### Issue #{}: {}\n\n", i + 1, issue.title));
        out.push_str(&format!("**Priority**: {} (1=Highest)\n\n", issue.priority));
        out.push_str(&format!("**Description**: {}\n\n", issue.description));
        out.push_str(&format!("**Impact**: {}\n\n", issue.impact));
        out.push_str(&format!("**Recommendation**: {}\n\n", issue.recommendation));
        if !issue.examples.is_empty() {
            out.push_str("**Examples**:\n\n");
            for example in &issue.examples {
                out.push_str(&format!("- `{}`\n", example));
            }
            out.push('\n');
        }
    }
}

fn resource_gaps_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 3. Resource Configuration Gaps\n\n");
    if analysis.resource_gaps.is_empty() {
        out.push_str("✅ All containers have resource requests and limits configured.\n\n");
        return;
    }

    out.push_str(&format!(
        "{} containers are missing resource configuration.\n\n",
        analysis.resource_gaps.len()
    ));
    out.push_str("| Namespace | Pod | Container | Missing Requests | Missing Limits |\n");
    out.push_str("|---|---|---|---|---|\n");
    for gap in analysis.resource_gaps.iter().take(MAX_TABLE_ROWS) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            gap.namespace,
            gap.pod,
            gap.container,
            yes_no(gap.missing_requests),
            yes_no(gap.missing_limits)
        ));
    }
    more_rows(out, analysis.resource_gaps.len());
}

fn node_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 4. Node Analysis\n\n");
    if analysis.node_issues.is_empty() {
        out.push_str("✅ No nodes show high request pressure.\n\n");
        return;
    }

    out.push_str("| Node | Issue | Requested CPU | Allocatable CPU | Requested Memory | Allocatable Memory |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for issue in &analysis.node_issues {
        out.push_str(&format!(
            "| {} | {} | {:.2} cores | {:.2} cores | {:.2} GiB | {:.2} GiB |\n",
            issue.node,
            issue.kind,
            issue.requested_cpu as f64 / 1000.0,
            issue.allocatable_cpu as f64 / 1000.0,
            gib(issue.requested_memory),
            gib(issue.allocatable_memory)
        ));
    }
    out.push('\n');
}

fn restarts_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 5. Pod Restarts\n\n");
    out.push_str(&format!(
        "Pods with restarts: {} (24h), {} (48h), {} (7d)\n\n",
        analysis.restarts.pods_24h, analysis.restarts.pods_48h, analysis.restarts.pods_7d
    ));

    if analysis.restarts.last_7d.is_empty() {
        out.push_str("✅ No container restarts in the last 7 days.\n\n");
        return;
    }

    out.push_str("### Last 24 Hours\n\n");
    if analysis.restarts.last_24h.is_empty() {
        out.push_str("No restarts in the last 24 hours.\n\n");
    } else {
        out.push_str("| Namespace | Pod | Container | Restarts | Last Restart | Reason |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for restart in analysis.restarts.last_24h.iter().take(MAX_TABLE_ROWS) {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                restart.namespace,
                restart.pod,
                restart.container,
                restart.restart_count,
                restart
                    .last_restart
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string()),
                restart.reason
            ));
        }
        more_rows(out, analysis.restarts.last_24h.len());
    }

    out.push_str("### Last 7 Days (Top Restarters)\n\n");
    out.push_str("| Namespace | Pod | Container | Restarts | Reason |\n");
    out.push_str("|---|---|---|---|---|\n");
    for restart in analysis.restarts.last_7d.iter().take(10) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            restart.namespace, restart.pod, restart.container, restart.restart_count, restart.reason
        ));
    }
    out.push('\n');
}

fn gitops_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 6. GitOps Reconciliation Events\n\n");
    let report = &analysis.gitops_events;
    out.push_str(&format!(
        "Last 24h: {} events ({} warnings, {} errors) — Last 48h: {} events ({} warnings, {} errors)\n\n",
        report.last_24h.len(),
        report.warnings_24h,
        report.errors_24h,
        report.last_48h.len(),
        report.warnings_48h,
        report.errors_48h
    ));

    if report.last_48h.is_empty() {
        out.push_str("✅ No GitOps reconciliation events in the last 48 hours.\n\n");
        return;
    }

    out.push_str("| Last Seen | Type | Namespace | Object | Reason | Count |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for event in report.last_48h.iter().take(MAX_TABLE_ROWS) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            event.last_seen.to_rfc3339(),
            event.event_type,
            event.namespace,
            event.involved_object,
            event.reason,
            event.count
        ));
    }
    more_rows(out, report.last_48h.len());
}

fn warnings_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 7. Warning Events\n\n");
    let report = &analysis.warning_events;
    out.push_str(&format!(
        "Warnings: {} (24h), {} (48h)\n\n",
        report.warnings_24h, report.warnings_48h
    ));

    if report.last_48h.is_empty() {
        out.push_str("✅ No warning events in the last 48 hours.\n\n");
        return;
    }

    out.push_str("| Last Seen | Namespace | Object | Reason | Message | Count |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for event in report.last_48h.iter().take(MAX_TABLE_ROWS) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            event.last_seen.to_rfc3339(),
            event.namespace,
            event.involved_object,
            event.reason,
            truncate(&event.message, 80),
            event.count
        ));
    }
    more_rows(out, report.last_48h.len());
}

fn backups_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 8. Backups\n\n");
    let report = &analysis.backups;

    if report.last_48h.is_empty() {
        out.push_str("No backups recorded in the last 48 hours.\n\n");
        return;
    }

    out.push_str(&format!(
        "Backups: {} (24h, {} failed), {} (48h, {} failed)\n\n",
        report.last_24h.len(),
        report.failed_24h,
        report.last_48h.len(),
        report.failed_48h
    ));

    out.push_str("| Name | Namespace | Status | Started | Duration | Errors | Warnings |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for backup in report.last_48h.iter().take(MAX_TABLE_ROWS) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            backup.name,
            backup.namespace,
            backup.phase,
            backup.start_time.to_rfc3339(),
            backup
                .duration()
                .map(human_duration)
                .unwrap_or_else(|| "in progress".to_string()),
            backup.errors,
            backup.warnings
        ));
    }
    more_rows(out, report.last_48h.len());
}

fn workload_section(out: &mut String, analysis: &Analysis) {
    out.push_str(&format!("## 9. {} Stability\n\n", analysis.workload_label));
    let stability = &analysis.workload_stability;

    if stability.pods.is_empty() {
        out.push_str(&format!(
            "No {} pods found in this cluster.\n\n",
            analysis.workload_label
        ));
        return;
    }

    out.push_str(&format!("Pods: {}\n\n", stability.pods.join(", ")));
    out.push_str(&format!(
        "- Priority class configured: {}\n",
        yes_no(stability.has_priority_class)
    ));
    out.push_str(&format!(
        "- Memory limits configured: {}\n",
        yes_no(stability.has_resource_limits)
    ));
    out.push_str(&format!(
        "- OOM kills in the last 7 days: {}\n\n",
        stability.recent_oom_count
    ));

    if analysis.job_churn.total_jobs > 0 {
        out.push_str(&format!(
            "Short-lived jobs (<2min): {} of {} job pods — high churn competes with this \
             workload for scheduling.\n\n",
            analysis.job_churn.short_jobs, analysis.job_churn.total_jobs
        ));
    }
}

fn namespace_section(out: &mut String, analysis: &Analysis) {
    out.push_str("## 10. Namespace Risk Analysis\n\n");
    if analysis.namespace_risks.is_empty() {
        out.push_str("No qualifying application namespaces with pods were found.\n\n");
        return;
    }

    out.push_str("| Namespace | Risk | Total Pods | Without Requests | Without Limits |\n");
    out.push_str("|---|---|---|---|---|\n");
    for risk in &analysis.namespace_risks {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            risk.namespace,
            risk.tier,
            risk.total_pods,
            risk.pods_without_requests,
            risk.pods_without_limits
        ));
    }
    out.push('\n');
}

fn insights_section(out: &mut String, insights: &AiInsights) {
    out.push_str("## 11. AI Insights\n\n");
    out.push_str(&insights.summary);
    out.push_str("\n\n");

    if !insights.automation_suggestions.is_empty() {
        out.push_str("### Automation Suggestions\n\n");
        for suggestion in &insights.automation_suggestions {
            out.push_str(&format!("- {}\n", suggestion));
        }
        out.push('\n');
    }
}

fn appendix_section(
    out: &mut String,
    snapshot: &ClusterSnapshot,
    suggestions: &SuggestionsByNamespace,
) {
    out.push_str("## Appendix: Pod Resource Details\n\n");
    let rows = snapshot.resource_rows(None);
    if rows.is_empty() {
        out.push_str("No running pods.\n\n");
        return;
    }

    let has_suggestions = !suggestions.is_empty();
    if has_suggestions {
        out.push_str(
            "| Namespace | Pod | Container | CPU Req | CPU Lim | Mem Req | Mem Lim | CPU Now | Mem Now | Suggested |\n",
        );
        out.push_str("|---|---|---|---|---|---|---|---|---|---|\n");
    } else {
        out.push_str(
            "| Namespace | Pod | Container | CPU Req | CPU Lim | Mem Req | Mem Lim | CPU Now | Mem Now |\n",
        );
        out.push_str("|---|---|---|---|---|---|---|---|---|\n");
    }

    for row in &rows {
        let base = format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            row.namespace,
            row.pod,
            row.container,
            row.cpu_request,
            row.cpu_limit,
            row.memory_request,
            row.memory_limit,
            row.current_cpu,
            row.current_memory
        );
        if has_suggestions {
            let suggested = suggestions
                .get(&row.namespace)
                .and_then(|ns| ns.get(&format!("{}/{}", row.pod, row.container)))
                .map(format_suggestion)
                .unwrap_or_else(|| "—".to_string());
            out.push_str(&format!("{} {} |\n", base, suggested));
        } else {
            out.push_str(&base);
            out.push('\n');
        }
    }
    out.push('\n');
}

fn format_suggestion(s: &ResourceSuggestion) -> String {
    if s.keeps_everything() {
        return "keep current".to_string();
    }
    let part = |label: &str, value: &str| {
        if value == KEEP {
            None
        } else {
            Some(format!("{} {}", label, value))
        }
    };
    [
        part("cpu req", &s.cpu_request),
        part("cpu lim", &s.cpu_limit),
        part("mem req", &s.memory_request),
        part("mem lim", &s.memory_limit),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ")
}

fn yes_no(v: bool) -> &'static str {
    if v { "Yes" } else { "No" }
}

fn gib(bytes: i64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max).collect();
        format!("{}…", kept)
    }
}

fn human_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn more_rows(out: &mut String, total: usize) {
    if total > MAX_TABLE_ROWS {
        out.push_str(&format!("\n_… and {} more._\n", total - MAX_TABLE_ROWS));
    }
    out.push('\n');
}
