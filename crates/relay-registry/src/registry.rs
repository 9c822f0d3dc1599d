//! The Tool Registry: the in-memory catalog of providers and the tool
//! schemas each exposes, rebuilt at startup and refreshable on demand.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::RwLock;

use relay_domain::provider::{HealthStatus, ToolProvider};
use relay_domain::tool::ToolSchema;

use crate::client::{HttpToolServerClient, ToolServerClient};

/// An immutable snapshot of the registry's contents. Replaced wholesale on
/// `refresh()` via an atomic pointer swap — readers never block.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tools: HashMap<String, ToolSchema>,
    pub providers: Vec<ToolProvider>,
}

impl Catalog {
    /// Deterministic, alphabetical-by-name ordering, per §4.2.
    pub fn tools_sorted(&self) -> Vec<&ToolSchema> {
        let mut tools: Vec<&ToolSchema> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }
}

pub struct ToolRegistry {
    endpoints: HashMap<String, String>,
    discovery_timeout: Duration,
    catalog: RwLock<Arc<Catalog>>,
    client_factory: Box<dyn Fn(&str, Duration) -> Box<dyn ToolServerClient> + Send + Sync>,
}

impl ToolRegistry {
    pub fn new(endpoints: HashMap<String, String>, discovery_timeout: Duration) -> Self {
        Self {
            endpoints,
            discovery_timeout,
            catalog: RwLock::new(Arc::new(Catalog::default())),
            client_factory: Box::new(|base_url, timeout| {
                Box::new(HttpToolServerClient::new(base_url, timeout))
            }),
        }
    }

    /// Probes every configured provider in parallel with a per-provider
    /// timeout. Providers that fail to respond are recorded unhealthy and
    /// omitted from the surface — the registry does not fail overall.
    /// Called once at startup.
    pub async fn load_all(&self) {
        let catalog = self.discover().await;
        *self.catalog.write() = Arc::new(catalog);
    }

    /// Same as `load_all`, but atomic: a new catalog is built off to the
    /// side and swapped in only if at least one provider responded. On
    /// total failure the previous catalog is retained.
    pub async fn refresh(&self) -> bool {
        let catalog = self.discover().await;
        if catalog.providers.iter().any(|p| p.health == HealthStatus::Healthy) {
            *self.catalog.write() = Arc::new(catalog);
            true
        } else {
            tracing::warn!("refresh: no provider responded, retaining previous catalog");
            false
        }
    }

    /// Returns an immutable snapshot of all current tools.
    pub fn surface(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    async fn discover(&self) -> Catalog {
        let probes = self.endpoints.iter().map(|(id, base_url)| {
            let id = id.clone();
            let base_url = base_url.clone();
            let client = (self.client_factory)(&base_url, self.discovery_timeout);
            async move {
                match client.list_tools().await {
                    Ok(resp) => {
                        let mut provider = ToolProvider::new(id.clone(), base_url.clone());
                        provider.health = HealthStatus::Healthy;
                        let mut schemas = Vec::new();
                        for t in resp.tools {
                            let schema = ToolSchema {
                                name: t.name,
                                provider_id: id.clone(),
                                description: t.description,
                                parameters: t.parameters,
                                allowed_roles: t.allowed_roles.into_iter().collect(),
                                metadata: t.metadata,
                            };
                            if schema.is_valid() {
                                schemas.push(schema);
                            } else {
                                tracing::warn!(provider_id = %id, tool = %schema.name, "discarding invalid tool schema");
                            }
                        }
                        (provider, schemas)
                    }
                    Err(e) => {
                        tracing::warn!(provider_id = %id, error = %e, "discovery failed, provider marked unhealthy");
                        (ToolProvider::new(id.clone(), base_url.clone()), Vec::new())
                    }
                }
            }
        });

        let results = join_all(probes).await;

        let mut tools: HashMap<String, ToolSchema> = HashMap::new();
        let mut providers = Vec::new();
        for (provider, schemas) in results {
            providers.push(provider);
            for schema in schemas {
                // I1: later-loaded providers win on name collision.
                if let Some(prev) = tools.insert(schema.name.clone(), schema) {
                    let new_provider = tools.get(&prev.name).map(|s| s.provider_id.clone()).unwrap_or_default();
                    tracing::warn!(
                        tool = %prev.name,
                        previous_provider = %prev.provider_id,
                        new_provider = %new_provider,
                        "tool name collision, later-loaded provider wins"
                    );
                }
            }
        }
        providers.sort_by(|a, b| a.id.cmp(&b.id));

        Catalog { tools, providers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(name: &str, provider_id: &str) -> ToolSchema {
        ToolSchema {
            name: name.into(),
            provider_id: provider_id.into(),
            description: String::new(),
            parameters: serde_json::json!({"type": "object"}),
            allowed_roles: Default::default(),
            metadata: None,
        }
    }

    #[test]
    fn tools_sorted_is_alphabetical() {
        let mut tools = HashMap::new();
        tools.insert("zeta".to_string(), schema("zeta", "p"));
        tools.insert("alpha".to_string(), schema("alpha", "p"));
        let catalog = Catalog { tools, providers: vec![] };
        let sorted = catalog.tools_sorted();
        assert_eq!(sorted[0].name, "alpha");
        assert_eq!(sorted[1].name, "zeta");
    }

    #[tokio::test]
    async fn empty_endpoints_yields_empty_catalog() {
        let registry = ToolRegistry::new(HashMap::new(), Duration::from_secs(1));
        registry.load_all().await;
        let surface = registry.surface();
        assert!(surface.tools.is_empty());
        assert!(surface.providers.is_empty());
    }
}
