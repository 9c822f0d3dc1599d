mod api;
mod auth;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use relay_domain::config::{Config, ConfigSeverity};
use relay_invoker::backoff::RetryPolicy;
use relay_invoker::ToolInvoker;
use relay_planner::{PlannerConfig, PlannerLoop, ProviderClientMap};
use relay_reasoning::OpenAiCompatModel;
use relay_registry::ToolRegistry;
use relay_sessions::SessionStore;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Arc::new(Config::from_env());
    run_server(config).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,relay_gateway=debug")),
        )
        .json()
        .init();
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("orchestration core starting");

    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Error => tracing::error!("{issue}"),
            ConfigSeverity::Warning => tracing::warn!("{issue}"),
        }
    }
    if Config::has_fatal_errors(&issues) {
        anyhow::bail!("configuration has fatal errors, refusing to start");
    }

    // ── Services, built in dependency order ─────────────────────────
    let registry = Arc::new(ToolRegistry::new(
        config.providers.endpoints.clone(),
        Duration::from_millis(config.providers.discovery_timeout_ms),
    ));
    registry.load_all().await;
    tracing::info!(tools = registry.surface().tools.len(), "tool registry loaded");

    let sessions = Arc::new(SessionStore::new(std::path::Path::new("data/sessions")).context("opening session store")?);

    let invoker = Arc::new(ToolInvoker::new(
        sessions.clone(),
        RetryPolicy::from_config(
            config.runtime.retry_base_ms,
            config.runtime.retry_cap_ms,
            config.runtime.retry_attempts,
        ),
        Duration::from_secs(config.runtime.cache_ttl_sec),
        Duration::from_millis(config.runtime.tool_call_timeout_ms),
    ));

    let api_key = relay_reasoning::resolve_api_key(&config.reasoning.api_key_env).unwrap_or_default();
    let reasoning = Arc::new(OpenAiCompatModel::new(
        "reasoning",
        config.reasoning.base_url.clone(),
        api_key,
        config.reasoning.model.clone(),
    ));

    let planner = Arc::new(PlannerLoop::new(
        reasoning,
        invoker,
        PlannerConfig {
            max_rounds: config.runtime.max_rounds,
            turn_timeout: Duration::from_millis(config.runtime.turn_timeout_ms),
        },
    ));

    let clients = Arc::new(ProviderClientMap::from_endpoints(
        &config.providers.endpoints,
        Duration::from_millis(config.runtime.tool_call_timeout_ms),
    ));

    let state = AppState {
        config: config.clone(),
        registry,
        planner,
        clients,
        sessions,
    };

    // ── Router ───────────────────────────────────────────────────────
    let app = api::router()
        .layer(build_cors_layer(&config.server.cors))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state);

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "orchestration core listening");

    axum::serve(listener, app).await.context("axum server error")?;

    Ok(())
}

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Origins may contain a trailing `*` wildcard for the port segment
/// (e.g. `http://localhost:*`). These are expanded into a predicate that
/// matches any port on that host. A literal `"*"` allows all origins.
fn build_cors_layer(cors: &relay_domain::config::CorsConfig) -> CorsLayer {
    use axum::http::header;

    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            let prefix = origin.trim_end_matches('*').to_owned();
            wildcard_prefixes.push(prefix);
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
