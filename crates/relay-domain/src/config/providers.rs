use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `PROVIDER_ENDPOINTS` — the only source of truth for which Tool Servers
/// exist. Schemas themselves are never read from configuration; they are
/// discovered per §4.1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// provider_id → base URL
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
    /// Per-provider discovery timeout override, falls back to
    /// [`RuntimeConfig::discovery_timeout_ms`] when absent.
    #[serde(default = "d_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,
}

fn d_discovery_timeout_ms() -> u64 {
    5_000
}
