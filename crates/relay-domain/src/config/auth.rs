use serde::{Deserialize, Serialize};

/// Identity-provider and bypass settings (§6.3, §6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Disables access filtering and bypasses token validation entirely,
    /// synthesizing a dev-mode admin [`crate::access::AccessContext`].
    #[serde(default)]
    pub dev_mode: bool,
    /// Bypasses token validation but keeps access filtering — the
    /// AccessContext is built from the request body's `user_id`.
    #[serde(default)]
    pub bypass_token: bool,
    /// OIDC issuer used to validate bearer tokens when neither bypass is set.
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            bypass_token: false,
            tenant_id: None,
            audience: None,
        }
    }
}

impl AuthConfig {
    /// Token validation is required unless one of the bypasses is set.
    pub fn requires_token_validation(&self) -> bool {
        !self.dev_mode && !self.bypass_token
    }
}
