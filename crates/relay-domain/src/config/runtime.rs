use serde::{Deserialize, Serialize};

/// Round caps, timeouts, and the cache TTL that govern the Planner Loop
/// and the Tool Invoker (§6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "d_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "d_tool_call_timeout_ms")]
    pub tool_call_timeout_ms: u64,
    #[serde(default = "d_reasoning_call_timeout_ms")]
    pub reasoning_call_timeout_ms: u64,
    #[serde(default = "d_turn_timeout_ms")]
    pub turn_timeout_ms: u64,
    #[serde(default = "d_cache_ttl_sec")]
    pub cache_ttl_sec: u64,
    /// Base delay for the Tool Invoker's exponential backoff on transport
    /// failures.
    #[serde(default = "d_retry_base_ms")]
    pub retry_base_ms: u64,
    #[serde(default = "d_retry_cap_ms")]
    pub retry_cap_ms: u64,
    #[serde(default = "d_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_rounds: d_max_rounds(),
            tool_call_timeout_ms: d_tool_call_timeout_ms(),
            reasoning_call_timeout_ms: d_reasoning_call_timeout_ms(),
            turn_timeout_ms: d_turn_timeout_ms(),
            cache_ttl_sec: d_cache_ttl_sec(),
            retry_base_ms: d_retry_base_ms(),
            retry_cap_ms: d_retry_cap_ms(),
            retry_attempts: d_retry_attempts(),
        }
    }
}

fn d_max_rounds() -> u32 {
    5
}
fn d_tool_call_timeout_ms() -> u64 {
    30_000
}
fn d_reasoning_call_timeout_ms() -> u64 {
    60_000
}
fn d_turn_timeout_ms() -> u64 {
    180_000
}
fn d_cache_ttl_sec() -> u64 {
    300
}
fn d_retry_base_ms() -> u64 {
    500
}
fn d_retry_cap_ms() -> u64 {
    4_000
}
fn d_retry_attempts() -> u32 {
    2
}
