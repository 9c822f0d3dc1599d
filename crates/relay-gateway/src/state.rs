use std::sync::Arc;

use relay_domain::config::Config;
use relay_planner::{PlannerLoop, ProviderClientMap};
use relay_registry::ToolRegistry;
use relay_sessions::SessionStore;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core services** — config and the tool registry
/// - **Orchestration** — the planner loop and its resolved Tool Server clients
/// - **Persistence** — the session store (also the Tool Invoker's cache substrate)
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub registry: Arc<ToolRegistry>,

    // ── Orchestration ─────────────────────────────────────────────────
    pub planner: Arc<PlannerLoop>,
    pub clients: Arc<ProviderClientMap>,

    // ── Persistence ───────────────────────────────────────────────────
    pub sessions: Arc<SessionStore>,
}
