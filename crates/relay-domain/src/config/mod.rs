mod auth;
mod providers;
mod reasoning;
mod runtime;
mod server;

pub use auth::*;
pub use providers::*;
pub use reasoning::*;
pub use runtime::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to
    /// each field's default when unset (§6.3). Malformed values (bad JSON
    /// in `PROVIDER_ENDPOINTS`, non-numeric timeouts, ...) are reported as
    /// fatal [`ConfigError`]s by the caller via [`Config::validate`] —
    /// this constructor itself never panics on bad input, it just falls
    /// back to the default and lets `validate` catch anything that
    /// matters.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(raw) = std::env::var("PROVIDER_ENDPOINTS") {
            match serde_json::from_str::<std::collections::HashMap<String, String>>(&raw) {
                Ok(endpoints) => config.providers.endpoints = endpoints,
                Err(e) => tracing::warn!(error = %e, "PROVIDER_ENDPOINTS is not valid JSON, ignoring"),
            }
        }

        if let Some(v) = env_u32("MAX_ROUNDS") {
            config.runtime.max_rounds = v;
        }
        if let Some(v) = env_u64("TOOL_CALL_TIMEOUT_MS") {
            config.runtime.tool_call_timeout_ms = v;
        }
        if let Some(v) = env_u64("REASONING_CALL_TIMEOUT_MS") {
            config.runtime.reasoning_call_timeout_ms = v;
        }
        if let Some(v) = env_u64("TURN_TIMEOUT_MS") {
            config.runtime.turn_timeout_ms = v;
        }
        if let Some(v) = env_u64("CACHE_TTL_SEC") {
            config.runtime.cache_ttl_sec = v;
        }

        if let Some(v) = env_bool("DEV_MODE") {
            config.auth.dev_mode = v;
        }
        if let Some(v) = env_bool("BYPASS_TOKEN") {
            config.auth.bypass_token = v;
        }
        if let Ok(v) = std::env::var("TENANT_ID") {
            config.auth.tenant_id = Some(v);
        }
        if let Ok(v) = std::env::var("AUDIENCE") {
            config.auth.audience = Some(v);
        }

        if let Ok(v) = std::env::var("HOST") {
            config.server.host = v;
        }
        if let Some(v) = env_u16("PORT") {
            config.server.port = v;
        }

        if let Ok(v) = std::env::var("REASONING_BASE_URL") {
            config.reasoning.base_url = v;
        }
        if let Ok(v) = std::env::var("REASONING_MODEL") {
            config.reasoning.model = v;
        }
        if let Ok(v) = std::env::var("REASONING_API_KEY_ENV") {
            config.reasoning.api_key_env = v;
        }

        config
    }

    /// Validate the configuration and return a list of issues. An empty
    /// vec means nothing was found. Callers decide whether warnings block
    /// startup; any [`ConfigSeverity::Error`] does.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.providers.endpoints.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "providers.endpoints".into(),
                message: "no tool providers configured — PROVIDER_ENDPOINTS is empty".into(),
            });
        }

        let mut seen_ids: HashSet<&str> = HashSet::new();
        for (id, base_url) in &self.providers.endpoints {
            if id.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "providers.endpoints".into(),
                    message: "provider id must not be empty".into(),
                });
            }
            if base_url.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("providers.endpoints[{id}]"),
                    message: "base_url must not be empty".into(),
                });
            } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("providers.endpoints[{id}]"),
                    message: format!("base_url must start with http:// or https:// (got \"{base_url}\")"),
                });
            }
            if !seen_ids.insert(id.as_str()) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("providers.endpoints[{id}]"),
                    message: "duplicate provider id — later entry will shadow earlier one".into(),
                });
            }
        }

        if self.runtime.max_rounds == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "runtime.max_rounds".into(),
                message: "max_rounds must be at least 1".into(),
            });
        }

        if !self.reasoning.base_url.starts_with("http://") && !self.reasoning.base_url.starts_with("https://") {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "reasoning.base_url".into(),
                message: format!(
                    "base_url must start with http:// or https:// (got \"{}\")",
                    self.reasoning.base_url
                ),
            });
        }

        if self.auth.requires_token_validation() && self.auth.tenant_id.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "auth.tenant_id".into(),
                message: "token validation is enabled but no tenant_id is configured".into(),
            });
        }

        errors
    }

    /// True if `validate()` produced at least one [`ConfigSeverity::Error`].
    pub fn has_fatal_errors(errors: &[ConfigError]) -> bool {
        errors.iter().any(|e| e.severity == ConfigSeverity::Error)
    }
}

fn env_bool(key: &str) -> Option<bool> {
    match std::env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(%key, value = other, "not a recognized boolean, ignoring");
            None
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u16(key: &str) -> Option<u16> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_warns_on_empty_providers() {
        let cfg = Config::default();
        let errors = cfg.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "providers.endpoints" && e.severity == ConfigSeverity::Warning));
    }

    #[test]
    fn zero_port_is_fatal() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        let errors = cfg.validate();
        assert!(Config::has_fatal_errors(&errors));
    }

    #[test]
    fn malformed_provider_url_is_fatal() {
        let mut cfg = Config::default();
        cfg.providers
            .endpoints
            .insert("alpha".into(), "not-a-url".into());
        let errors = cfg.validate();
        assert!(Config::has_fatal_errors(&errors));
    }

    #[test]
    fn well_formed_provider_passes() {
        let mut cfg = Config::default();
        let mut endpoints = HashMap::new();
        endpoints.insert("alpha".into(), "http://localhost:9001".into());
        cfg.providers.endpoints = endpoints;
        let errors = cfg.validate();
        assert!(!Config::has_fatal_errors(&errors));
    }

    #[test]
    fn zero_max_rounds_is_fatal() {
        let mut cfg = Config::default();
        cfg.runtime.max_rounds = 0;
        let errors = cfg.validate();
        assert!(Config::has_fatal_errors(&errors));
    }
}
