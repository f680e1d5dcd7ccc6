//! Kubernetes resource quantity parsing
//!
//! Quantities arrive as opaque strings ("250m", "1536Mi", "2", "129e6").
//! These parsers are total: anything unparseable yields `None` and is
//! treated downstream as "not set" rather than an error.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Parse a CPU quantity into millicores.
///
/// Accepts plain cores ("2", "0.5"), millicores ("250m"), microcores
/// ("500000u") and nanocores ("1000000n").
pub fn cpu_millicores(q: &Quantity) -> Option<i64> {
    let s = q.0.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(n) = s.strip_suffix('m') {
        return n.parse::<f64>().ok().map(|v| v.round() as i64);
    }
    if let Some(n) = s.strip_suffix('u') {
        return n.parse::<f64>().ok().map(|v| (v / 1_000.0).round() as i64);
    }
    if let Some(n) = s.strip_suffix('n') {
        return n.parse::<f64>().ok().map(|v| (v / 1_000_000.0).round() as i64);
    }
    s.parse::<f64>().ok().map(|v| (v * 1_000.0).round() as i64)
}

/// Parse a memory quantity into bytes.
///
/// Accepts binary suffixes (Ki..Ei), decimal suffixes (k..E), plain byte
/// counts and exponent notation ("129e6").
pub fn memory_bytes(q: &Quantity) -> Option<i64> {
    let s = q.0.trim();
    if s.is_empty() {
        return None;
    }

    const BINARY: &[(&str, f64)] = &[
        ("Ki", 1024.0),
        ("Mi", 1024.0 * 1024.0),
        ("Gi", 1024.0 * 1024.0 * 1024.0),
        ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ];
    const DECIMAL: &[(&str, f64)] = &[
        ("k", 1e3),
        ("K", 1e3),
        ("M", 1e6),
        ("G", 1e9),
        ("T", 1e12),
        ("P", 1e15),
        ("E", 1e18),
    ];

    for (suffix, scale) in BINARY {
        if let Some(n) = s.strip_suffix(suffix) {
            return n.parse::<f64>().ok().map(|v| (v * scale).round() as i64);
        }
    }
    for (suffix, scale) in DECIMAL {
        if let Some(n) = s.strip_suffix(suffix) {
            return n.parse::<f64>().ok().map(|v| (v * scale).round() as i64);
        }
    }
    s.parse::<f64>().ok().map(|v| v.round() as i64)
}

/// Numeric value of a quantity with any unit suffix stripped.
///
/// Used only for zero tests, where the unit is irrelevant.
fn scalar(q: &Quantity) -> Option<f64> {
    let s = q.0.trim().trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

/// True when the quantity is zero-valued or unparseable.
pub fn is_zero(q: &Quantity) -> bool {
    scalar(q).map(|v| v == 0.0).unwrap_or(true)
}

/// True when `map` holds a non-zero quantity under `resource`.
///
/// A missing map, a missing key, a zero value and an unparseable value all
/// count as "not set".
pub fn nonzero(map: Option<&BTreeMap<String, Quantity>>, resource: &str) -> bool {
    map.and_then(|m| m.get(resource))
        .map(|q| !is_zero(q))
        .unwrap_or(false)
}
