//! The Tool Invoker: executes exactly one remote tool call against one
//! provider and returns a lineage-ready result record (§4.3).

pub mod backoff;
pub mod singleflight;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use relay_access::ToolSurface;
use relay_domain::access::AccessContext;
use relay_domain::cache::{CacheKey, CacheStore};
use relay_domain::error::{Error, ErrorKind};
use relay_domain::session::{LineageRecord, Outcome};
use relay_registry::client::{ClientError, ToolServerClient};
use relay_registry::protocol::CallToolResponse;

use backoff::RetryPolicy;
use singleflight::SingleFlight;

pub struct ToolInvoker {
    cache: Arc<dyn CacheStore>,
    single_flight: SingleFlight<Result<serde_json::Value, DispatchError>>,
    retry_policy: RetryPolicy,
    cache_ttl: Duration,
    call_timeout: Duration,
}

/// Error surfaced by [`dispatch_with_retry`], carrying the [`ErrorKind`]
/// the caller should report alongside the message (§7).
#[derive(Debug, Clone)]
struct DispatchError {
    kind: ErrorKind,
    message: String,
}

/// Outcome of one invocation, ready to be folded into a [`LineageRecord`]
/// and threaded back into the conversation by the Planner Loop.
#[derive(Debug)]
pub struct InvocationResult {
    pub outcome: Outcome,
    pub result: serde_json::Value,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

impl ToolInvoker {
    pub fn new(cache: Arc<dyn CacheStore>, retry_policy: RetryPolicy, cache_ttl: Duration, call_timeout: Duration) -> Self {
        Self {
            cache,
            single_flight: SingleFlight::new(),
            retry_policy,
            cache_ttl,
            call_timeout,
        }
    }

    /// Execute one tool call. `client` resolves to the provider that owns
    /// `tool_name` in `surface`.
    pub async fn invoke(
        &self,
        surface: &ToolSurface,
        client: &dyn ToolServerClient,
        tool_name: &str,
        mut arguments: serde_json::Value,
        ctx: &AccessContext,
    ) -> Result<InvocationResult, Error> {
        let started = std::time::Instant::now();

        let schema = surface
            .schema_for(tool_name)
            .ok_or_else(|| Error::UnknownTool(tool_name.to_string()))?;

        if !arguments.is_object() {
            return Err(Error::InvalidArguments {
                tool: tool_name.to_string(),
                message: "arguments must be a JSON object".into(),
            });
        }
        validate_against_schema(tool_name, &arguments, &schema.parameters)?;

        // §4.3 / I12: augment missing access_context rather than reject.
        inject_access_context(&mut arguments, ctx);

        let cache_key = CacheKey::new(&schema.provider_id, tool_name, &arguments, ctx.scope_hash());

        if let Some(entry) = self.cache.cache_get(&cache_key).await {
            if !entry.is_expired(Utc::now()) {
                return Ok(InvocationResult {
                    outcome: Outcome::Cached,
                    result: entry.value,
                    error_kind: None,
                    error_message: None,
                    duration_ms: started.elapsed().as_millis() as u64,
                });
            }
        }

        let dispatch_key = cache_key.as_string();
        let tool_name_owned = tool_name.to_string();
        let args_for_dispatch = arguments.clone();
        let retry_policy = self.retry_policy.clone();

        let outcome = self
            .single_flight
            .run(&dispatch_key, || async move {
                dispatch_with_retry(client, &tool_name_owned, args_for_dispatch, &retry_policy).await
            })
            .await;

        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(value) => {
                self.cache.cache_put(cache_key, value.clone(), self.cache_ttl).await;
                Ok(InvocationResult {
                    outcome: Outcome::Success,
                    result: value,
                    error_kind: None,
                    error_message: None,
                    duration_ms,
                })
            }
            Err(dispatch_err) => {
                Ok(InvocationResult {
                    outcome: Outcome::Error,
                    result: serde_json::Value::Null,
                    error_kind: Some(dispatch_err.kind),
                    error_message: Some(dispatch_err.message),
                    duration_ms,
                })
            }
        }
    }
}

fn inject_access_context(arguments: &mut serde_json::Value, ctx: &AccessContext) {
    if let Some(obj) = arguments.as_object_mut() {
        obj.entry("access_context").or_insert_with(|| ctx.as_wire_object());
    }
}

/// Minimal structural validation: every required property in the schema
/// must be present. Full JSON-Schema validation is out of scope (§4.3).
fn validate_against_schema(tool_name: &str, arguments: &serde_json::Value, schema: &serde_json::Value) -> Result<(), Error> {
    let Some(required) = schema.get("required").and_then(|v| v.as_array()) else {
        return Ok(());
    };
    for field in required {
        let Some(field_name) = field.as_str() else { continue };
        if arguments.get(field_name).is_none() {
            return Err(Error::InvalidArguments {
                tool: tool_name.to_string(),
                message: format!("missing required argument \"{field_name}\""),
            });
        }
    }
    Ok(())
}

/// Dispatches via `client`, retrying only transport-level failures with
/// exponential backoff. Tool-level `{error: ...}` payloads are returned
/// immediately — they are not retried (§4.3).
async fn dispatch_with_retry(
    client: &dyn ToolServerClient,
    tool_name: &str,
    arguments: serde_json::Value,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, DispatchError> {
    let mut attempt = 0u32;
    loop {
        match client.call_tool(tool_name, arguments.clone()).await {
            Ok(CallToolResponse { result: Some(value), .. }) => return Ok(value),
            Ok(CallToolResponse { error: Some(err), .. }) => {
                return Err(DispatchError { kind: ErrorKind::ToolError, message: err.message });
            }
            Ok(_) => {
                return Err(DispatchError {
                    kind: ErrorKind::ToolError,
                    message: "tool server returned neither a result nor an error".into(),
                });
            }
            Err(e) if e.is_transport_failure() && !policy.should_give_up(attempt) => {
                tracing::warn!(tool = %tool_name, attempt, error = %e, "transport failure, retrying");
                tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(DispatchError { kind: ErrorKind::Transport, message: format_transport_error(e) });
            }
        }
    }
}

fn format_transport_error(e: ClientError) -> String {
    format!("transport error: {e}")
}

/// Fold an [`InvocationResult`] into a [`LineageRecord`] at the given step.
pub fn to_lineage_record(step: u32, provider_id: &str, tool_name: &str, arguments: serde_json::Value, result: InvocationResult) -> LineageRecord {
    let result_summary = summarize(&result.result);
    LineageRecord {
        step,
        tool_name: tool_name.to_string(),
        provider_id: provider_id.to_string(),
        arguments,
        result_summary,
        result: result.result,
        timestamp: Utc::now(),
        outcome: result.outcome,
        error_kind: result.error_kind.map(|k| k.to_string()),
        duration_ms: result.duration_ms,
    }
}

fn summarize(value: &serde_json::Value) -> String {
    let rendered = value.to_string();
    if rendered.len() > 200 {
        format!("{}…", &rendered[..200])
    } else {
        rendered
    }
}
