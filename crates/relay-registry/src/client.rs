//! HTTP transport to a single Tool Server.

use crate::protocol::{CallToolRequest, CallToolResponse, ListToolsRequest, ListToolsResponse};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("server returned status {0}")]
    Status(u16),
}

impl ClientError {
    /// Transport-level failures (connect, timeout, 5xx) are the only ones
    /// the Tool Invoker retries (§4.3); `Status` below 500 does not count.
    pub fn is_transport_failure(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout(_) => true,
            ClientError::Status(code) => *code >= 500,
        }
    }
}

/// Narrow capability set every Tool Server implements. The registry holds
/// these as a homogeneous collection keyed by provider id; no inheritance
/// hierarchy is needed.
#[async_trait]
pub trait ToolServerClient: Send + Sync {
    async fn list_tools(&self) -> Result<ListToolsResponse, ClientError>;
    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<CallToolResponse, ClientError>;
}

pub struct HttpToolServerClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpToolServerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl ToolServerClient for HttpToolServerClient {
    async fn list_tools(&self) -> Result<ListToolsResponse, ClientError> {
        let resp = self
            .http
            .post(&self.base_url)
            .timeout(self.timeout)
            .json(&ListToolsRequest::default())
            .send()
            .await
            .map_err(map_reqwest_err(self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        resp.json::<ListToolsResponse>()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<CallToolResponse, ClientError> {
        let req = CallToolRequest::new(name, arguments);
        let resp = self
            .http
            .post(&self.base_url)
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(map_reqwest_err(self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        resp.json::<CallToolResponse>()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

fn map_reqwest_err(timeout: Duration) -> impl Fn(reqwest::Error) -> ClientError {
    move |e: reqwest::Error| {
        if e.is_timeout() {
            ClientError::Timeout(timeout)
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
