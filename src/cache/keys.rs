//! Deterministic cache key derivation.
//!
//! The key is a SHA-256 over the canonical JSON encoding of the full
//! request. Canonical means: struct fields in declaration order, map-typed
//! extras re-encoded through `serde_json::Value` (whose objects are
//! BTreeMap-backed, i.e. key-sorted), and numbers formatted by serde_json's
//! shortest-roundtrip float printing. Two structurally identical requests
//! therefore always produce the same key regardless of the arrival order of
//! optional fields, and any change to a single observed value changes it.
//!
//! Ignored request fields (`exog`, `constraints`, `policy_id`) still take
//! part in the key: requests differing only in ignored fields cache
//! separately.

use sha2::{Digest, Sha256};

use crate::api_types::ForecastRequest;

/// Derive the cache key for a request.
pub fn cache_key(request: &ForecastRequest) -> String {
    // Round-trip through Value so free-form JSON objects come out key-sorted.
    let canonical = serde_json::to_value(request)
        .and_then(|value| serde_json::to_vec(&value))
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}
