//! The caller's identity and authorization data for one turn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const ADMIN_ROLE: &str = "admin";

/// Built once per request from the validated bearer token or a dev-mode
/// shim, then held immutable for the duration of the turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessContext {
    pub user_id: String,
    pub roles: BTreeSet<String>,
    /// Row-scoping predicates, opaque to the core — forwarded verbatim to
    /// Tool Servers as part of the outbound `access_context` sub-object.
    #[serde(default)]
    pub scope: Option<serde_json::Value>,
    /// Set when the whole deployment runs with filtering disabled.
    #[serde(default)]
    pub dev_mode: bool,
}

impl AccessContext {
    pub fn new(user_id: impl Into<String>, roles: impl IntoIterator<Item = String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles: roles.into_iter().collect(),
            scope: None,
            dev_mode: false,
        }
    }

    /// Synthesized when `DEV_MODE` is enabled: carries the admin role and
    /// the global bypass flag so the access filter skips role checks.
    pub fn dev_admin(user_id: impl Into<String>) -> Self {
        let mut roles = BTreeSet::new();
        roles.insert(ADMIN_ROLE.to_string());
        Self {
            user_id: user_id.into(),
            roles,
            scope: None,
            dev_mode: true,
        }
    }

    /// Synthesized when `BYPASS_TOKEN` is enabled: identity comes from the
    /// request body, roles are empty, access filtering still applies.
    pub fn bypass(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles: BTreeSet::new(),
            scope: None,
            dev_mode: false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.dev_mode || self.roles.contains(ADMIN_ROLE)
    }

    /// A stable hash of the scoping data, used as part of cache keys so
    /// that callers with different scopes never observe each other's
    /// cached tool results (I5).
    pub fn scope_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.user_id.hash(&mut hasher);
        for role in &self.roles {
            role.hash(&mut hasher);
        }
        if let Some(scope) = &self.scope {
            scope.to_string().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// The JSON sub-object injected into every outbound tool call's
    /// arguments, per §6.1.
    pub fn as_wire_object(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id,
            "roles": self.roles,
            "scope": self.scope,
        })
    }
}
