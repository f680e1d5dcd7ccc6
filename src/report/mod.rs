//! Report output
//!
//! Pure presentation: renders the findings into documents and writes them
//! under a per-run output directory named after the cluster and capture
//! time. No decision logic lives here.

pub mod html;
pub mod markdown;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Written report file locations.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub dir: PathBuf,
    pub markdown: PathBuf,
    pub html: PathBuf,
}

/// Directory/file base name: sanitized cluster name plus capture time.
pub fn report_basename(cluster_name: &str, captured_at: DateTime<Utc>) -> String {
    let sanitized: String = cluster_name
        .chars()
        .map(|c| if c == '/' || c == ':' { '-' } else { c })
        .collect();
    format!("{}-{}", sanitized, captured_at.format("%Y%m%d-%H%M%S"))
}

/// Write the markdown report and its HTML rendering.
pub fn write_reports(output_root: &Path, basename: &str, markdown: &str) -> Result<ReportPaths> {
    let dir = output_root.join(basename);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    let markdown_path = dir.join(format!("{}.md", basename));
    fs::write(&markdown_path, markdown)
        .with_context(|| format!("failed to write {}", markdown_path.display()))?;

    let html_path = dir.join(format!("{}.html", basename));
    let document = html::render_document(basename, markdown);
    fs::write(&html_path, document)
        .with_context(|| format!("failed to write {}", html_path.display()))?;

    Ok(ReportPaths {
        dir,
        markdown: markdown_path,
        html: html_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename_sanitizes_separators() {
        let at = DateTime::parse_from_rfc3339("2025-06-01T12:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            report_basename("arn:aws/prod-cluster", at),
            "arn-aws-prod-cluster-20250601-123045"
        );
    }
}
