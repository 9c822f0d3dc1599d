//! Cache key and entry types shared by the Tool Invoker and the Session
//! Store's cache substrate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// `(provider_id, tool_name, canonical-argument-hash, access-scope-hash)`
/// per I5 — the scope hash keeps callers with different access scopes from
/// ever sharing a cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub provider_id: String,
    pub tool_name: String,
    pub arg_hash: u64,
    pub scope_hash: u64,
}

impl CacheKey {
    pub fn new(provider_id: &str, tool_name: &str, arguments: &serde_json::Value, scope_hash: u64) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            tool_name: tool_name.to_string(),
            arg_hash: canonical_arg_hash(arguments),
            scope_hash,
        }
    }

    /// A flat string form suitable for use as a map/file key.
    pub fn as_string(&self) -> String {
        format!(
            "{}:{}:{:x}:{:x}",
            self.provider_id, self.tool_name, self.arg_hash, self.scope_hash
        )
    }
}

/// Hashes the argument value via its canonical (sorted-key) JSON
/// serialization so that `{"a":1,"b":2}` and `{"b":2,"a":1}` collide.
fn canonical_arg_hash(value: &serde_json::Value) -> u64 {
    let canonical = canonicalize(value);
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn canonicalize(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{:?}:{}", k, canonicalize(v)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        serde_json::Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The cache substrate the Session Store provides to the Tool Invoker
/// (§4.5). A narrow seam so the invoker never depends on how entries are
/// actually persisted.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn cache_get(&self, key: &CacheKey) -> Option<CacheEntry>;
    async fn cache_put(&self, key: CacheKey, value: serde_json::Value, ttl: std::time::Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_independent_across_object_fields() {
        let a = serde_json::json!({"x": "foo", "y": 1});
        let b = serde_json::json!({"y": 1, "x": "foo"});
        let ka = CacheKey::new("alpha", "lookup", &a, 0);
        let kb = CacheKey::new("alpha", "lookup", &b, 0);
        assert_eq!(ka, kb);
    }

    #[test]
    fn different_scope_hash_yields_different_key() {
        let args = serde_json::json!({"x": "foo"});
        let ka = CacheKey::new("alpha", "lookup", &args, 1);
        let kb = CacheKey::new("alpha", "lookup", &args, 2);
        assert_ne!(ka, kb);
    }

    #[test]
    fn entry_expiry_boundary() {
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entry = CacheEntry {
            value: serde_json::json!(42),
            expires_at: now,
        };
        assert!(entry.is_expired(now));
    }
}
