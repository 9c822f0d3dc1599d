//! Resolves a provider id to the [`ToolServerClient`] that talks to it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay_registry::client::{ClientError, ToolServerClient};
use relay_registry::protocol::{CallToolResponse, ListToolsResponse};

/// Narrow seam the Planner Loop uses to reach a provider's Tool Server
/// without depending on how the caller constructed or pooled clients.
pub trait ProviderClients: Send + Sync {
    fn client_for(&self, provider_id: &str) -> Option<&(dyn ToolServerClient + Send + Sync)>;
}

/// The straightforward implementation: one long-lived client per provider.
pub struct ProviderClientMap {
    clients: HashMap<String, Arc<dyn ToolServerClient>>,
}

impl ProviderClientMap {
    pub fn new(clients: HashMap<String, Arc<dyn ToolServerClient>>) -> Self {
        Self { clients }
    }

    /// Build one HTTP client per provider endpoint.
    pub fn from_endpoints(endpoints: &HashMap<String, String>, timeout: Duration) -> Self {
        let clients = endpoints
            .iter()
            .map(|(id, base_url)| {
                let client: Arc<dyn ToolServerClient> =
                    Arc::new(relay_registry::client::HttpToolServerClient::new(base_url.clone(), timeout));
                (id.clone(), client)
            })
            .collect();
        Self { clients }
    }
}

impl ProviderClients for ProviderClientMap {
    fn client_for(&self, provider_id: &str) -> Option<&(dyn ToolServerClient + Send + Sync)> {
        self.clients
            .get(provider_id)
            .map(|c| c.as_ref() as &(dyn ToolServerClient + Send + Sync))
    }
}

/// A client that is never actually dispatched to: the Tool Invoker checks
/// the tool name against the filtered surface before it ever uses the
/// client argument, so when the surface lookup fails this placeholder is
/// passed but never called.
struct NullClient;

#[async_trait]
impl ToolServerClient for NullClient {
    async fn list_tools(&self) -> Result<ListToolsResponse, ClientError> {
        Err(ClientError::Transport("no provider resolved for this tool".into()))
    }
    async fn call_tool(&self, _name: &str, _arguments: serde_json::Value) -> Result<CallToolResponse, ClientError> {
        Err(ClientError::Transport("no provider resolved for this tool".into()))
    }
}

static NULL_CLIENT: NullClient = NullClient;

pub(crate) fn null_client() -> &'static (dyn ToolServerClient + Send + Sync) {
    &NULL_CLIENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_resolves_nothing() {
        let map = ProviderClientMap::new(HashMap::new());
        assert!(map.client_for("alpha").is_none());
    }
}
