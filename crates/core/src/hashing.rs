//! Canonical JSON encoding and SHA-256 hashing used by the audit hash chain.
//!
//! Canonical form: UTF-8, object keys sorted at every nesting level, no
//! insignificant whitespace, numbers rendered via `serde_json`'s default
//! compact formatting. `serde_json::Map` is backed by a `BTreeMap` in this
//! workspace (the `preserve_order` feature is not enabled), so ordinary
//! compact serialization already yields sorted keys; this module exists to
//! make that guarantee explicit and to centralize the hashing primitives so
//! every caller hashes the same bytes the same way.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::AppError;

/// The chain head for a tenant with no audit entries yet.
pub const GENESIS_HASH: &str = "initial";

/// Serializes `value` to its canonical JSON byte representation.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, AppError> {
    serde_json::to_vec(value)
        .map_err(|error| AppError::Internal(format!("failed to canonicalize JSON: {error}")))
}

/// Returns the lowercase hex-encoded SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Computes `request_hash = SHA256(canonical(request_fields))`.
pub fn request_hash<T: Serialize>(request_fields: &T) -> Result<String, AppError> {
    let canonical = canonical_json(request_fields)?;
    Ok(sha256_hex(&canonical))
}

/// Computes `derived_hash = SHA256("audit-log:" || previous_hash || ":" || canonical_request)`.
pub fn derived_hash<T: Serialize>(
    previous_hash: &str,
    request_fields: &T,
) -> Result<String, AppError> {
    let canonical = canonical_json(request_fields)?;
    let mut buffer = Vec::with_capacity(canonical.len() + previous_hash.len() + 16);
    buffer.extend_from_slice(b"audit-log:");
    buffer.extend_from_slice(previous_hash.as_bytes());
    buffer.extend_from_slice(b":");
    buffer.extend_from_slice(&canonical);
    Ok(sha256_hex(&buffer))
}

#[cfg(test)]
mod tests {
    use super::{canonical_json, derived_hash, request_hash, sha256_hex, GENESIS_HASH};
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_object_keys() {
        let value = json!({"b": 1, "a": {"z": 1, "y": 2}});
        let encoded = canonical_json(&value).expect("encode");
        assert_eq!(encoded, br#"{"a":{"y":2,"z":1},"b":1}"#);
    }

    #[test]
    fn sha256_hex_is_stable() {
        let digest = sha256_hex(b"hello");
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn request_hash_is_deterministic_across_key_order() {
        let a = json!({"tenant_id": "t1", "action": "read"});
        let b = json!({"action": "read", "tenant_id": "t1"});
        assert_eq!(request_hash(&a).expect("hash"), request_hash(&b).expect("hash"));
    }

    #[test]
    fn derived_hash_chains_on_previous_hash() {
        let payload = json!({"tenant_id": "t1"});
        let first = derived_hash(GENESIS_HASH, &payload).expect("hash");
        let second = derived_hash(&first, &payload).expect("hash");
        assert_ne!(first, second);
    }
}
