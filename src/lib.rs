//! kubescout library
//!
//! Turns one point-in-time snapshot of a cluster's workloads into a
//! structured set of health findings and renders them as a report. The
//! analysis engine is a pure library boundary; acquisition, annotation and
//! rendering sit around it. Usable both as a binary and as a library.

pub mod ai;
pub mod analyzer;
pub mod kube;
pub mod model;
pub mod report;

// Re-export commonly used types for convenience
pub use analyzer::{Analysis, Analyzer, ClusterHealth};
pub use model::ClusterSnapshot;
