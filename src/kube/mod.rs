//! Kubernetes client bootstrap
//!
//! Builds a configured client for the collector. Configuration resolution
//! follows the usual ladder: explicit kubeconfig path, explicit context,
//! then inference (in-cluster config when running in a pod, otherwise
//! KUBECONFIG / ~/.kube/config).

pub mod collector;

pub use collector::Collector;

use std::path::Path;

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

/// Build a client from an optional kubeconfig path and context name.
pub async fn create_client(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Client> {
    let config = match kubeconfig {
        Some(path) => {
            let kc = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig: {}", path.display()))?;
            Config::from_custom_kubeconfig(
                kc,
                &KubeConfigOptions {
                    context: context.map(str::to_string),
                    ..Default::default()
                },
            )
            .await
            .context("failed to build client config from kubeconfig")?
        }
        None => match context {
            Some(ctx) => Config::from_kubeconfig(&KubeConfigOptions {
                context: Some(ctx.to_string()),
                ..Default::default()
            })
            .await
            .with_context(|| format!("failed to load context '{}'", ctx))?,
            None => Config::infer()
                .await
                .context("failed to infer cluster configuration")?,
        },
    };

    Client::try_from(config).context("failed to create Kubernetes client")
}

/// Name of the kubeconfig context the client will use, for display.
pub fn current_context(kubeconfig: Option<&Path>) -> String {
    let read = match kubeconfig {
        Some(path) => Kubeconfig::read_from(path),
        None => Kubeconfig::read(),
    };
    read.ok()
        .and_then(|kc| kc.current_context)
        .unwrap_or_else(|| "default".to_string())
}
