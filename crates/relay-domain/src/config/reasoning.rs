use serde::{Deserialize, Serialize};

/// The single configured reasoning-model endpoint. The reasoning model
/// itself is an external collaborator (§1); this is just enough to reach
/// an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            model: d_model(),
            api_key_env: d_api_key_env(),
        }
    }
}

fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_api_key_env() -> String {
    "REASONING_API_KEY".into()
}
