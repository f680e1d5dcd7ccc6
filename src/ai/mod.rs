//! AI annotation of findings
//!
//! An opaque, strictly additive layer: it receives the finished findings,
//! returns free-text insight and optional per-container resource
//! suggestions, and is never allowed to fail a run — callers log and move
//! on. Speaks the OpenAI-compatible chat-completions protocol, against
//! either the public endpoint or an Azure deployment.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::Analysis;
use crate::model::{ClusterSnapshot, PodResourceRow};

/// Sentinel suggestion value meaning "do not override the current setting".
pub const KEEP: &str = "KEEP";

#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion endpoint returned no choices")]
    EmptyResponse,
    #[error("could not parse suggestions: {0}")]
    BadSuggestions(#[from] serde_json::Error),
    #[error("azure provider requires an endpoint URL")]
    MissingEndpoint,
}

/// Free-text insight produced from a findings summary.
#[derive(Debug, Clone)]
pub struct AiInsights {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub risk_assessment: String,
    pub automation_suggestions: Vec<String>,
}

/// Suggested resource values for one container, keyed upstream by
/// `pod/container`. A value of [`KEEP`] leaves the current setting alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSuggestion {
    pub cpu_request: String,
    pub cpu_limit: String,
    #[serde(alias = "memRequest")]
    pub memory_request: String,
    #[serde(alias = "memLimit")]
    pub memory_limit: String,
}

impl ResourceSuggestion {
    pub fn keeps_everything(&self) -> bool {
        [
            &self.cpu_request,
            &self.cpu_limit,
            &self.memory_request,
            &self.memory_limit,
        ]
        .iter()
        .all(|v| v.as_str() == KEEP)
    }
}

/// The annotation seam; production uses [`AiClient`].
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Free-text insight over the findings.
    async fn cluster_insights(
        &self,
        snapshot: &ClusterSnapshot,
        analysis: &Analysis,
    ) -> Result<AiInsights, AnnotatorError>;

    /// Per-container suggestions for one namespace, keyed `pod/container`.
    async fn suggest_resource_limits(
        &self,
        rows: &[PodResourceRow],
        namespace: &str,
    ) -> Result<HashMap<String, ResourceSuggestion>, AnnotatorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Azure,
}

impl Provider {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("azure") {
            Provider::Azure
        } else {
            Provider::OpenAi
        }
    }
}

/// Chat-completions client.
pub struct AiClient {
    http: reqwest::Client,
    provider: Provider,
    api_key: String,
    endpoint: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl AiClient {
    pub fn new(
        api_key: String,
        provider: Provider,
        endpoint: Option<String>,
        model: String,
    ) -> Result<Self, AnnotatorError> {
        if provider == Provider::Azure && endpoint.is_none() {
            return Err(AnnotatorError::MissingEndpoint);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            provider,
            api_key,
            endpoint,
            model,
        })
    }

    fn completion_url(&self) -> String {
        match self.provider {
            Provider::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version=2024-02-01",
                self.endpoint.as_deref().unwrap_or("").trim_end_matches('/'),
                self.model
            ),
            Provider::OpenAi => {
                let base = self
                    .endpoint
                    .as_deref()
                    .unwrap_or("https://api.openai.com/v1");
                format!("{}/chat/completions", base.trim_end_matches('/'))
            }
        }
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, AnnotatorError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
            max_tokens: 2000,
        };

        let mut builder = self.http.post(self.completion_url()).json(&request);
        builder = match self.provider {
            Provider::Azure => builder.header("api-key", &self.api_key),
            Provider::OpenAi => builder.bearer_auth(&self.api_key),
        };

        let response: ChatResponse = builder
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AnnotatorError::EmptyResponse)
    }
}

#[async_trait]
impl Annotator for AiClient {
    async fn cluster_insights(
        &self,
        snapshot: &ClusterSnapshot,
        analysis: &Analysis,
    ) -> Result<AiInsights, AnnotatorError> {
        let prompt = build_analysis_prompt(snapshot, analysis);
        let summary = self.chat(INSIGHTS_SYSTEM_PROMPT, &prompt).await?;

        // The completion itself is the insight; the structured fields carry
        // the standing guidance that applies to any cluster in this state.
        Ok(AiInsights {
            summary,
            recommendations: vec!["AI analysis provided in summary section".to_string()],
            risk_assessment: "See AI summary for detailed risk assessment".to_string(),
            automation_suggestions: vec![
                "Implement ResourceQuota policies".to_string(),
                "Set up LimitRange defaults for namespaces".to_string(),
                "Configure PodDisruptionBudgets for critical workloads".to_string(),
            ],
        })
    }

    async fn suggest_resource_limits(
        &self,
        rows: &[PodResourceRow],
        namespace: &str,
    ) -> Result<HashMap<String, ResourceSuggestion>, AnnotatorError> {
        let prompt = build_suggestion_prompt(rows, namespace);
        let content = self.chat(SUGGESTIONS_SYSTEM_PROMPT, &prompt).await?;
        let suggestions = serde_json::from_str(strip_code_fences(&content))?;
        Ok(suggestions)
    }
}

/// Findings summary fed to the insight completion.
pub fn build_analysis_prompt(snapshot: &ClusterSnapshot, analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str("# Kubernetes Cluster Analysis Data\n\n");
    out.push_str("## Cluster Overview\n");
    out.push_str(&format!("- Total Pods: {}\n", snapshot.pods.len()));
    out.push_str(&format!("- Total Nodes: {}\n", snapshot.nodes.len()));
    out.push_str(&format!("- Health Status: {}\n", analysis.cluster_health));
    out.push_str(&format!("- OOM Events: {}\n", analysis.oom_events.len()));
    out.push_str(&format!(
        "- Pods Missing Resources: {}\n\n",
        analysis.resource_gaps.len()
    ));

    out.push_str("## Critical Issues Detected\n");
    for (i, issue) in analysis.critical_issues.iter().enumerate() {
        out.push_str(&format!(
            "{}. **{}** (Priority {})\n",
            i + 1,
            issue.title,
            issue.priority
        ));
        out.push_str(&format!("   - Impact: {}\n", issue.impact));
        out.push_str(&format!(
            "   - Current Recommendation: {}\n",
            issue.recommendation
        ));
    }
    out.push('\n');

    out.push_str("## Namespace Risk Analysis\n");
    for ns in &analysis.namespace_risks {
        out.push_str(&format!(
            "- {}: {} risk ({}/{} pods missing resources)\n",
            ns.namespace, ns.tier, ns.pods_without_requests, ns.total_pods
        ));
    }
    out.push('\n');

    out.push_str(&format!("## {} Status\n", analysis.workload_label));
    out.push_str(&format!(
        "- Pods Found: {}\n",
        analysis.workload_stability.pods.len()
    ));
    out.push_str(&format!(
        "- Has Priority Class: {}\n",
        analysis.workload_stability.has_priority_class
    ));
    out.push_str(&format!(
        "- Has Resource Limits: {}\n",
        analysis.workload_stability.has_resource_limits
    ));
    out.push_str(&format!(
        "- OOM Kills (7d): {}\n\n",
        analysis.workload_stability.recent_oom_count
    ));

    out.push_str("## Short-Lived Jobs\n");
    out.push_str(&format!(
        "- Short Jobs (<2min): {}\n",
        analysis.job_churn.short_jobs
    ));
    out.push_str(&format!("- Total Jobs: {}\n\n", analysis.job_churn.total_jobs));

    out.push_str("Please provide:\n");
    out.push_str("1. Enhanced insights and strategic recommendations\n");
    out.push_str("2. Risk assessment with specific remediation priorities\n");
    out.push_str("3. Suggestions for automation and preventive measures\n");

    out
}

fn build_suggestion_prompt(rows: &[PodResourceRow], namespace: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Suggest resource values for containers in namespace '{}'.\n\n",
        namespace
    ));
    out.push_str("| Pod | Container | CPU Req | CPU Lim | Mem Req | Mem Lim | CPU Now | Mem Now |\n");
    out.push_str("|---|---|---|---|---|---|---|---|\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            row.pod,
            row.container,
            row.cpu_request,
            row.cpu_limit,
            row.memory_request,
            row.memory_limit,
            row.current_cpu,
            row.current_memory
        ));
    }
    out.push_str(
        "\nRespond with a single JSON object mapping \"pod/container\" to \
         {\"cpuRequest\", \"cpuLimit\", \"memoryRequest\", \"memoryLimit\"}. \
         Use the exact value \"KEEP\" for any setting that should not be overridden. \
         No prose, no markdown fences.\n",
    );
    out
}

/// Models often wrap JSON in markdown fences despite instructions.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

const INSIGHTS_SYSTEM_PROMPT: &str = "\
You are an expert Kubernetes Site Reliability Engineer (SRE) analyzing production cluster data.

1. Cluster Health Summary: provide a concise, high-level overview of the cluster's health.
2. Critical Issues: identify the top 3-5 most critical issues with specific, actionable recommendations.
3. Resource Management: focus on resource gaps (missing requests/limits), their effect on backups,
   system pods and cluster stability, and the impact of short-lived jobs on scheduling churn.
4. Node Analysis: review OOMKilled events, nodes with high resource requests, and autoscaling bottlenecks.
5. Protected Workload Stability: recommend priority class and resource allocation strategies that make
   the protected workload the last thing evicted under memory pressure.
6. Namespace Analysis: for each application namespace, prioritize which pods most need resource
   constraints and group namespaces by risk level.

Format your response in clear, well-structured Markdown.";

const SUGGESTIONS_SYSTEM_PROMPT: &str = "\
You are a Kubernetes capacity planner. Given configured and observed resource values for containers,
suggest concrete request/limit values. Be conservative: only override a value when the observed data
justifies it; otherwise answer KEEP. Respond with pure JSON.";
