//! The Planner Loop: drives the bounded multi-round function-calling
//! conversation with the reasoning model, dispatching tool calls the
//! model emits and threading results back until the model settles on a
//! plain answer, fails, or the round cap is reached (§4.4).

mod clients;

pub use clients::{ProviderClientMap, ProviderClients};

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use relay_access::ToolSurface;
use relay_domain::access::AccessContext;
use relay_domain::error::Error;
use relay_domain::session::{ExecutionMetadata, LineageRecord, Outcome};
use relay_domain::tool::{Message, ToolCall};
use relay_invoker::{to_lineage_record, ToolInvoker};
use relay_reasoning::{ChatRequest, ReasoningModel};

/// A deterministic message shown when the round cap is hit (§4.4 *Truncated*).
pub const TRUNCATED_MESSAGE: &str =
    "I wasn't able to finish within the allotted number of planning rounds.";

/// A deterministic message shown when the reasoning model itself fails.
pub const FAILED_MESSAGE: &str = "I ran into an error and couldn't complete this turn.";

/// A deterministic message shown when the per-turn wall-clock cap is hit.
pub const TIMED_OUT_MESSAGE: &str = "This turn took too long and was stopped.";

pub struct PlannerConfig {
    pub max_rounds: u32,
    pub turn_timeout: Duration,
}

/// The outcome of one completed (or truncated/failed) turn, ready to be
/// frozen into a [`relay_domain::session::Turn`] by the caller.
pub struct TurnResult {
    pub response: String,
    pub success: bool,
    pub metadata: ExecutionMetadata,
}

pub struct PlannerLoop {
    reasoning: Arc<dyn ReasoningModel>,
    invoker: Arc<ToolInvoker>,
    config: PlannerConfig,
}

impl PlannerLoop {
    pub fn new(reasoning: Arc<dyn ReasoningModel>, invoker: Arc<ToolInvoker>, config: PlannerConfig) -> Self {
        Self { reasoning, invoker, config }
    }

    /// Run one turn to completion. `conversation` is the caller-assembled
    /// prefix — system prompt, prior turns, current user message — owned
    /// by this call and mutated in place as rounds proceed.
    pub async fn run_turn(
        &self,
        surface: &ToolSurface,
        clients: &dyn ProviderClients,
        ctx: &AccessContext,
        conversation: Vec<Message>,
    ) -> TurnResult {
        let started = Instant::now();
        match tokio::time::timeout(
            self.config.turn_timeout,
            self.run_turn_inner(surface, clients, ctx, conversation),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => TurnResult {
                response: TIMED_OUT_MESSAGE.to_string(),
                success: false,
                metadata: ExecutionMetadata {
                    rounds: 0,
                    providers_used: Default::default(),
                    execution_time_ms: started.elapsed().as_millis() as u64,
                    lineage: Vec::new(),
                },
            },
        }
    }

    async fn run_turn_inner(
        &self,
        surface: &ToolSurface,
        clients: &dyn ProviderClients,
        ctx: &AccessContext,
        mut conversation: Vec<Message>,
    ) -> TurnResult {
        let started = Instant::now();
        let mut lineage: Vec<LineageRecord> = Vec::new();
        let mut providers_used = std::collections::BTreeSet::new();
        let mut step: u32 = 0;

        let mut round: u32 = 1;
        loop {
            tracing::debug!(round, "planner round");
            let req = ChatRequest {
                messages: conversation.clone(),
                tools: surface.definitions.clone(),
                temperature: Some(0.2),
                max_tokens: None,
                model: None,
            };

            let response = match self.reasoning.complete(req).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "reasoning model call failed, turn failed");
                    return TurnResult {
                        response: FAILED_MESSAGE.to_string(),
                        success: false,
                        metadata: ExecutionMetadata {
                            // `round` is the attempt in flight; none of it
                            // completed an ExecuteRound, so only the prior
                            // ones (if any) count toward `rounds`.
                            rounds: round - 1,
                            providers_used,
                            execution_time_ms: started.elapsed().as_millis() as u64,
                            lineage,
                        },
                    };
                }
            };

            if !response.requests_tool_calls() {
                conversation.push(Message::assistant(&response.content));
                return TurnResult {
                    response: response.content,
                    success: true,
                    metadata: ExecutionMetadata {
                        // Same reasoning: this PlanRound ended the turn
                        // without an ExecuteRound of its own.
                        rounds: round - 1,
                        providers_used,
                        execution_time_ms: started.elapsed().as_millis() as u64,
                        lineage,
                    },
                };
            }

            // ExecuteRound(n): dispatch every tool call concurrently, then
            // fold results back in canonical tool_call_id order (§4.4).
            conversation.push(Message::assistant_tool_calls(&response.content, &response.tool_calls));

            let dispatches: Vec<_> = response
                .tool_calls
                .iter()
                .map(|call| self.dispatch_one(surface, clients, ctx, call))
                .collect();
            let mut outcomes = join_all(dispatches).await;

            // Pair back up with the originating calls, then sort by
            // tool_call_id for a completion-order-independent conversation
            // prefix (property 9).
            let mut paired: Vec<(&ToolCall, (LineageRecord, Message))> =
                response.tool_calls.iter().zip(outcomes.drain(..)).collect();
            paired.sort_by(|a, b| a.0.call_id.cmp(&b.0.call_id));

            for (_, (record, message)) in paired {
                step += 1;
                providers_used.insert(record.provider_id.clone());
                let mut record = record;
                record.step = step;
                lineage.push(record);
                conversation.push(message);
            }

            if round >= self.config.max_rounds {
                return TurnResult {
                    response: TRUNCATED_MESSAGE.to_string(),
                    success: false,
                    metadata: ExecutionMetadata {
                        // This ExecuteRound just completed, so `round`
                        // itself is the count of completed ExecuteRounds.
                        rounds: round,
                        providers_used,
                        execution_time_ms: started.elapsed().as_millis() as u64,
                        lineage,
                    },
                };
            }
            round += 1;
        }
    }

    /// Resolve and invoke a single tool call, producing a lineage record
    /// and the tool-result message to thread back regardless of outcome.
    async fn dispatch_one(
        &self,
        surface: &ToolSurface,
        clients: &dyn ProviderClients,
        ctx: &AccessContext,
        call: &ToolCall,
    ) -> (LineageRecord, Message) {
        let provider_id = surface.provider_for(&call.tool_name).map(str::to_string);
        let client = match provider_id.as_deref().and_then(|p| clients.client_for(p)) {
            Some(c) => c,
            None => clients::null_client(),
        };

        match self
            .invoker
            .invoke(surface, client, &call.tool_name, call.arguments.clone(), ctx)
            .await
        {
            Ok(result) => {
                let is_error = matches!(result.outcome, Outcome::Error);
                let message_text = if is_error {
                    result.error_message.clone().unwrap_or_default()
                } else {
                    result.result.to_string()
                };
                let message = if is_error {
                    Message::tool_error_result(&call.call_id, message_text)
                } else {
                    Message::tool_result(&call.call_id, message_text)
                };
                let provider_id = provider_id.unwrap_or_default();
                let record = to_lineage_record(0, &provider_id, &call.tool_name, call.arguments.clone(), result);
                (record, message)
            }
            Err(e) => {
                let kind = e.kind();
                let record = LineageRecord {
                    step: 0,
                    tool_name: call.tool_name.clone(),
                    provider_id: provider_id.unwrap_or_default(),
                    arguments: call.arguments.clone(),
                    result_summary: e.to_string(),
                    result: serde_json::Value::Null,
                    timestamp: chrono::Utc::now(),
                    outcome: Outcome::Error,
                    error_kind: kind.map(|k| k.to_string()),
                    duration_ms: 0,
                };
                let message = Message::tool_error_result(&call.call_id, e.to_string());
                (record, message)
            }
        }
    }
}

/// Convenience re-export so callers constructing a turn don't need to
/// reach into `relay_domain::error` directly just to match on [`Error`].
pub type PlannerError = Error;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_domain::tool::ToolSchema;
    use relay_registry::client::{ClientError, ToolServerClient};
    use relay_registry::protocol::{CallToolResponse, ListToolsResponse};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedModel {
        calls: AtomicUsize,
        scripted: Vec<relay_reasoning::ChatResponse>,
    }

    #[async_trait]
    impl ReasoningModel for FixedModel {
        async fn complete(&self, _req: ChatRequest) -> relay_domain::error::Result<relay_reasoning::ChatResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scripted[n.min(self.scripted.len() - 1)].clone())
        }
        fn provider_id(&self) -> &str {
            "fixed"
        }
    }

    struct EchoClient;
    #[async_trait]
    impl ToolServerClient for EchoClient {
        async fn list_tools(&self) -> Result<ListToolsResponse, ClientError> {
            unimplemented!()
        }
        async fn call_tool(&self, _name: &str, arguments: serde_json::Value) -> Result<CallToolResponse, ClientError> {
            Ok(CallToolResponse {
                result: Some(serde_json::json!({"value": 42, "echo": arguments})),
                error: None,
            })
        }
    }

    struct FakeCache {
        store: tokio::sync::Mutex<HashMap<String, relay_domain::cache::CacheEntry>>,
    }
    #[async_trait]
    impl relay_domain::cache::CacheStore for FakeCache {
        async fn cache_get(&self, key: &relay_domain::cache::CacheKey) -> Option<relay_domain::cache::CacheEntry> {
            self.store.lock().await.get(&key.as_string()).cloned()
        }
        async fn cache_put(&self, key: relay_domain::cache::CacheKey, value: serde_json::Value, ttl: Duration) {
            let expires_at = chrono::Utc::now() + chrono::Duration::from_std(ttl).unwrap();
            self.store.lock().await.insert(key.as_string(), relay_domain::cache::CacheEntry { value, expires_at });
        }
    }

    fn make_invoker() -> Arc<ToolInvoker> {
        Arc::new(ToolInvoker::new(
            Arc::new(FakeCache { store: tokio::sync::Mutex::new(HashMap::new()) }),
            relay_invoker::backoff::RetryPolicy::default(),
            Duration::from_secs(60),
            Duration::from_secs(5),
        ))
    }

    fn surface_with_lookup() -> ToolSurface {
        let schema = ToolSchema {
            name: "lookup".into(),
            provider_id: "alpha".into(),
            description: "looks things up".into(),
            parameters: serde_json::json!({"type": "object"}),
            allowed_roles: Default::default(),
            metadata: None,
        };
        let ctx = AccessContext::dev_admin("u1");
        relay_access::filter_surface(std::iter::once(&schema), &ctx)
    }

    #[tokio::test]
    async fn single_round_plain_answer_s1() {
        let model = FixedModel {
            calls: AtomicUsize::new(0),
            scripted: vec![
                relay_reasoning::ChatResponse {
                    content: String::new(),
                    tool_calls: vec![ToolCall { call_id: "t1".into(), tool_name: "lookup".into(), arguments: serde_json::json!({"x": "foo"}) }],
                    model: "m".into(),
                    finish_reason: Some("tool_calls".into()),
                },
                relay_reasoning::ChatResponse {
                    content: "Answer: 42".into(),
                    tool_calls: vec![],
                    model: "m".into(),
                    finish_reason: Some("stop".into()),
                },
            ],
        };
        let planner = PlannerLoop::new(
            Arc::new(model),
            make_invoker(),
            PlannerConfig { max_rounds: 5, turn_timeout: Duration::from_secs(5) },
        );
        let surface = surface_with_lookup();
        let mut clients: HashMap<String, Arc<dyn ToolServerClient>> = HashMap::new();
        clients.insert("alpha".into(), Arc::new(EchoClient));
        let client_map = clients::ProviderClientMap::new(clients);
        let ctx = AccessContext::dev_admin("u1");

        let result = planner
            .run_turn(&surface, &client_map, &ctx, vec![Message::user("look up foo")])
            .await;

        assert!(result.success);
        assert_eq!(result.response, "Answer: 42");
        assert_eq!(result.metadata.rounds, 1);
        assert_eq!(result.metadata.lineage.len(), 1);
        assert_eq!(result.metadata.lineage[0].tool_name, "lookup");
        assert!(matches!(result.metadata.lineage[0].outcome, Outcome::Success));
    }

    #[tokio::test]
    async fn unknown_tool_records_error_lineage_s6() {
        let model = FixedModel {
            calls: AtomicUsize::new(0),
            scripted: vec![relay_reasoning::ChatResponse {
                content: String::new(),
                tool_calls: vec![ToolCall { call_id: "t1".into(), tool_name: "s".into(), arguments: serde_json::json!({}) }],
                model: "m".into(),
                finish_reason: Some("tool_calls".into()),
            }],
        };
        let planner = PlannerLoop::new(
            Arc::new(model),
            make_invoker(),
            PlannerConfig { max_rounds: 1, turn_timeout: Duration::from_secs(5) },
        );
        let surface = surface_with_lookup();
        let client_map = clients::ProviderClientMap::new(HashMap::new());
        let ctx = AccessContext::new("u1", ["user".to_string()]);

        let result = planner
            .run_turn(&surface, &client_map, &ctx, vec![Message::user("call s")])
            .await;

        assert!(!result.success);
        assert_eq!(result.metadata.lineage.len(), 1);
        assert!(matches!(result.metadata.lineage[0].outcome, Outcome::Error));
        assert_eq!(result.metadata.lineage[0].error_kind.as_deref(), Some("UnknownTool"));
    }

    #[tokio::test]
    async fn round_cap_truncates_s5() {
        let scripted: Vec<_> = (0..3)
            .map(|_| relay_reasoning::ChatResponse {
                content: String::new(),
                tool_calls: vec![ToolCall { call_id: "t1".into(), tool_name: "lookup".into(), arguments: serde_json::json!({"x": "foo"}) }],
                model: "m".into(),
                finish_reason: Some("tool_calls".into()),
            })
            .collect();
        let model = FixedModel { calls: AtomicUsize::new(0), scripted };
        let planner = PlannerLoop::new(
            Arc::new(model),
            make_invoker(),
            PlannerConfig { max_rounds: 2, turn_timeout: Duration::from_secs(5) },
        );
        let surface = surface_with_lookup();
        let mut clients: HashMap<String, Arc<dyn ToolServerClient>> = HashMap::new();
        clients.insert("alpha".into(), Arc::new(EchoClient));
        let client_map = clients::ProviderClientMap::new(clients);
        let ctx = AccessContext::dev_admin("u1");

        let result = planner
            .run_turn(&surface, &client_map, &ctx, vec![Message::user("loop forever")])
            .await;

        assert!(!result.success);
        assert_eq!(result.response, TRUNCATED_MESSAGE);
        assert_eq!(result.metadata.rounds, 2);
        assert_eq!(result.metadata.lineage.len(), 2);
    }

    struct DelayedClient {
        delay: Duration,
    }
    #[async_trait]
    impl ToolServerClient for DelayedClient {
        async fn list_tools(&self) -> Result<ListToolsResponse, ClientError> {
            unimplemented!()
        }
        async fn call_tool(&self, _name: &str, arguments: serde_json::Value) -> Result<CallToolResponse, ClientError> {
            tokio::time::sleep(self.delay).await;
            Ok(CallToolResponse { result: Some(serde_json::json!({"echo": arguments})), error: None })
        }
    }

    fn surface_with_two_providers() -> ToolSurface {
        let slow = ToolSchema {
            name: "slow_lookup".into(),
            provider_id: "alpha".into(),
            description: "slow".into(),
            parameters: serde_json::json!({"type": "object"}),
            allowed_roles: Default::default(),
            metadata: None,
        };
        let fast = ToolSchema {
            name: "fast_lookup".into(),
            provider_id: "beta".into(),
            description: "fast".into(),
            parameters: serde_json::json!({"type": "object"}),
            allowed_roles: Default::default(),
            metadata: None,
        };
        let ctx = AccessContext::dev_admin("u1");
        relay_access::filter_surface([&slow, &fast].into_iter(), &ctx)
    }

    #[tokio::test]
    async fn parallel_fan_out_orders_lineage_by_call_id_not_completion_s3() {
        // "z1" goes to the slow provider but sorts after "a1" by call_id, so
        // lineage order must reflect call_id even though the fast call
        // (a1, to beta) finishes first.
        let model = FixedModel {
            calls: AtomicUsize::new(0),
            scripted: vec![
                relay_reasoning::ChatResponse {
                    content: String::new(),
                    tool_calls: vec![
                        ToolCall { call_id: "z1".into(), tool_name: "slow_lookup".into(), arguments: serde_json::json!({}) },
                        ToolCall { call_id: "a1".into(), tool_name: "fast_lookup".into(), arguments: serde_json::json!({}) },
                    ],
                    model: "m".into(),
                    finish_reason: Some("tool_calls".into()),
                },
                relay_reasoning::ChatResponse {
                    content: "done".into(),
                    tool_calls: vec![],
                    model: "m".into(),
                    finish_reason: Some("stop".into()),
                },
            ],
        };
        let planner = PlannerLoop::new(
            Arc::new(model),
            make_invoker(),
            PlannerConfig { max_rounds: 5, turn_timeout: Duration::from_secs(5) },
        );
        let surface = surface_with_two_providers();
        let mut clients: HashMap<String, Arc<dyn ToolServerClient>> = HashMap::new();
        clients.insert("alpha".into(), Arc::new(DelayedClient { delay: Duration::from_millis(50) }));
        clients.insert("beta".into(), Arc::new(DelayedClient { delay: Duration::from_millis(0) }));
        let client_map = clients::ProviderClientMap::new(clients);
        let ctx = AccessContext::dev_admin("u1");

        let result = planner
            .run_turn(&surface, &client_map, &ctx, vec![Message::user("do both")])
            .await;

        assert!(result.success);
        assert_eq!(result.metadata.lineage.len(), 2);
        // call_id "a1" sorts before "z1" — that's the order lineage must follow.
        assert_eq!(result.metadata.lineage[0].tool_name, "fast_lookup");
        assert_eq!(result.metadata.lineage[1].tool_name, "slow_lookup");
        assert_eq!(result.metadata.providers_used, ["alpha".to_string(), "beta".to_string()].into_iter().collect());
    }

    struct ErrorThenSuccessClient {
        calls: AtomicUsize,
    }
    #[async_trait]
    impl ToolServerClient for ErrorThenSuccessClient {
        async fn list_tools(&self) -> Result<ListToolsResponse, ClientError> {
            unimplemented!()
        }
        async fn call_tool(&self, _name: &str, _arguments: serde_json::Value) -> Result<CallToolResponse, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok(CallToolResponse {
                    result: None,
                    error: Some(relay_registry::protocol::ToolErrorPayload {
                        message: "temporarily unavailable".into(),
                        kind: Some("upstream_error".into()),
                    }),
                })
            } else {
                Ok(CallToolResponse { result: Some(serde_json::json!({"value": 42})), error: None })
            }
        }
    }

    #[tokio::test]
    async fn tool_error_then_recovery_across_rounds_s4() {
        let model = FixedModel {
            calls: AtomicUsize::new(0),
            scripted: vec![
                relay_reasoning::ChatResponse {
                    content: String::new(),
                    tool_calls: vec![ToolCall { call_id: "t1".into(), tool_name: "lookup".into(), arguments: serde_json::json!({"x": "foo"}) }],
                    model: "m".into(),
                    finish_reason: Some("tool_calls".into()),
                },
                relay_reasoning::ChatResponse {
                    content: String::new(),
                    tool_calls: vec![ToolCall { call_id: "t2".into(), tool_name: "lookup".into(), arguments: serde_json::json!({"x": "foo"}) }],
                    model: "m".into(),
                    finish_reason: Some("tool_calls".into()),
                },
                relay_reasoning::ChatResponse {
                    content: "Answer: 42".into(),
                    tool_calls: vec![],
                    model: "m".into(),
                    finish_reason: Some("stop".into()),
                },
            ],
        };
        let planner = PlannerLoop::new(
            Arc::new(model),
            make_invoker(),
            PlannerConfig { max_rounds: 5, turn_timeout: Duration::from_secs(5) },
        );
        let surface = surface_with_lookup();
        let mut clients: HashMap<String, Arc<dyn ToolServerClient>> = HashMap::new();
        clients.insert("alpha".into(), Arc::new(ErrorThenSuccessClient { calls: AtomicUsize::new(0) }));
        let client_map = clients::ProviderClientMap::new(clients);
        let ctx = AccessContext::dev_admin("u1");

        let result = planner
            .run_turn(&surface, &client_map, &ctx, vec![Message::user("look up foo")])
            .await;

        assert!(result.success);
        assert_eq!(result.response, "Answer: 42");
        assert_eq!(result.metadata.rounds, 2);
        assert_eq!(result.metadata.lineage.len(), 2);
        assert!(matches!(result.metadata.lineage[0].outcome, Outcome::Error));
        assert!(matches!(result.metadata.lineage[1].outcome, Outcome::Success));
    }
}
