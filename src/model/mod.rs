//! Data model layer
//!
//! Structure:
//! - `snapshot.rs` - the immutable cluster snapshot the engine consumes
//! - `quantity.rs` - parsing of Kubernetes resource quantity strings

pub mod quantity;
pub mod snapshot;

pub use snapshot::{ClusterSnapshot, ContainerUsage, PodResourceRow, PodUsage, pod_key};
