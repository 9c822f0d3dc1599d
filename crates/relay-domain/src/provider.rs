//! A configured tool provider (Tool Server) and its health state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    /// Never probed yet — only observed briefly during startup wiring.
    Unknown,
}

/// One entry of `PROVIDER_ENDPOINTS`, plus the health last observed for it.
///
/// Providers are loaded once from configuration; the mapping itself is
/// never mutated mid-turn, only `health` changes across `load_all`/`refresh`
/// cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolProvider {
    pub id: String,
    pub base_url: String,
    pub health: HealthStatus,
}

impl ToolProvider {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            health: HealthStatus::Unknown,
        }
    }
}
