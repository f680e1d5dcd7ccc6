//! kubescout - snapshot-based cluster health analysis
//!
//! Captures one snapshot of cluster state, runs the analysis engine over
//! it, optionally annotates the findings with an AI completion, and writes
//! a markdown/HTML report to an output directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kubescout::ai::{AiClient, AiInsights, Annotator, Provider};
use kubescout::analyzer::{Analysis, Analyzer};
use kubescout::kube::Collector;
use kubescout::model::ClusterSnapshot;
use kubescout::report;
use kubescout::report::markdown::SuggestionsByNamespace;

/// Snapshot-based Kubernetes cluster health analyzer
#[derive(Parser, Debug)]
#[command(name = "kubescout")]
#[command(about = "Analyze a Kubernetes cluster snapshot and write a health report", long_about = None)]
struct Args {
    /// Path to the kubeconfig file (defaults to in-cluster config, then
    /// KUBECONFIG / ~/.kube/config)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    context: Option<String>,

    /// AI provider (openai or azure)
    #[arg(long, default_value = "openai")]
    ai_provider: String,

    /// AI endpoint URL (required for Azure, optional override otherwise)
    #[arg(long)]
    ai_endpoint: Option<String>,

    /// AI model to use
    #[arg(long, default_value = "gpt-4o")]
    ai_model: String,

    /// Skip AI annotation even when an API key is available
    #[arg(long)]
    no_ai: bool,

    /// Directory to create the report directory in
    #[arg(long, short = 'o', default_value = ".")]
    output: PathBuf,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,
}

/// Initialize logging to stderr; stdout carries progress output.
fn init_logging(debug: bool) {
    let default_filter = if debug { "kubescout=debug,kube=info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

/// Build the annotator when a key is configured and annotation is wanted.
fn build_annotator(args: &Args) -> Option<Box<dyn Annotator>> {
    if args.no_ai {
        return None;
    }
    let api_key = std::env::var("OPENAI_API_KEY")
        .or_else(|_| std::env::var("AZURE_OPENAI_API_KEY"))
        .ok()?;

    match AiClient::new(
        api_key,
        Provider::parse(&args.ai_provider),
        args.ai_endpoint.clone(),
        args.ai_model.clone(),
    ) {
        Ok(client) => Some(Box::new(client)),
        Err(err) => {
            tracing::warn!(error = %err, "could not initialize AI client, continuing without it");
            None
        }
    }
}

/// Namespaces that contain at least one container with a resource gap.
fn namespaces_with_gaps(analysis: &Analysis) -> Vec<String> {
    let mut seen = Vec::new();
    for gap in &analysis.resource_gaps {
        if !seen.contains(&gap.namespace) {
            seen.push(gap.namespace.clone());
        }
    }
    seen
}

/// Run the annotation calls; failures degrade to "no annotation".
async fn annotate(
    annotator: &dyn Annotator,
    snapshot: &ClusterSnapshot,
    analysis: &Analysis,
) -> (Option<AiInsights>, SuggestionsByNamespace) {
    let insights = match annotator.cluster_insights(snapshot, analysis).await {
        Ok(insights) => Some(insights),
        Err(err) => {
            tracing::warn!(error = %err, "AI analysis failed, continuing without insights");
            None
        }
    };

    let mut suggestions: SuggestionsByNamespace = Default::default();
    for namespace in namespaces_with_gaps(analysis) {
        let rows = snapshot.resource_rows(Some(&namespace));
        if rows.is_empty() {
            continue;
        }
        match annotator.suggest_resource_limits(&rows, &namespace).await {
            Ok(result) if !result.is_empty() => {
                println!(
                    "   Generated suggestions for {} containers in namespace '{}'",
                    result.len(),
                    namespace
                );
                suggestions.insert(namespace, result);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    namespace = %namespace,
                    error = %err,
                    "resource suggestion failed for namespace"
                );
            }
        }
    }

    (insights, suggestions)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    println!("Analyzing Kubernetes cluster...");

    let client =
        kubescout::kube::create_client(args.kubeconfig.as_deref(), args.context.as_deref()).await?;
    let context = kubescout::kube::current_context(args.kubeconfig.as_deref());
    tracing::debug!(context = %context, "connected");

    println!("Collecting cluster data...");
    let collector = Collector::new(client);
    let snapshot = collector.snapshot().await?;
    println!(
        "Collected data: {} pods, {} nodes, {} events",
        snapshot.pods.len(),
        snapshot.nodes.len(),
        snapshot.events.len()
    );

    println!("Analyzing cluster resources...");
    let analyzer = Analyzer::default();
    let analysis = analyzer.analyze(&snapshot);

    let annotator = build_annotator(&args);
    if annotator.is_none() && !args.no_ai {
        eprintln!(
            "No AI API key found, skipping AI analysis. Set OPENAI_API_KEY or \
             AZURE_OPENAI_API_KEY to enable it."
        );
    }

    let (insights, suggestions) = match annotator.as_deref() {
        Some(annotator) => {
            println!("Generating AI insights...");
            annotate(annotator, &snapshot, &analysis).await
        }
        None => (None, SuggestionsByNamespace::new()),
    };

    println!("Generating report...");
    let markdown =
        report::markdown::render(&snapshot, &analysis, insights.as_ref(), &suggestions);
    let basename = report::report_basename(&snapshot.cluster_name, snapshot.captured_at);
    let paths = report::write_reports(&args.output, &basename, &markdown)?;

    println!("Markdown report saved to: {}", paths.markdown.display());
    println!("HTML report saved to: {}", paths.html.display());
    println!(
        "Analysis complete. Cluster health: {}",
        analysis.cluster_health
    );

    Ok(())
}
