//! Shared error type used across the orchestration core.
//!
//! Variants map onto the error taxonomy of the core: config errors are
//! fatal at startup, the rest are scoped to a single request, tool call,
//! or round and are handled by the caller rather than propagated raw.

/// The stable `kind` string attached to a tool-call-scoped failure.
///
/// Surfaced in [`crate::session::LineageRecord::outcome`] and in the
/// `GET /tools` / `POST /chat` API payloads so callers (and the
/// reasoning model, via the threaded-back tool result) can distinguish
/// failure modes without parsing prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    InvalidArguments,
    Transport,
    ToolError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::UnknownTool => "UnknownTool",
            ErrorKind::InvalidArguments => "InvalidArguments",
            ErrorKind::Transport => "Transport",
            ErrorKind::ToolError => "ToolError",
        };
        write!(f, "{s}")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for tool {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("transport error calling provider {provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("tool {tool} returned an error: {message}")]
    ToolError {
        tool: String,
        message: String,
        kind: Option<String>,
    },

    #[error("reasoning model call failed: {0}")]
    Reasoning(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The [`ErrorKind`] this error maps to, if it is tool-call-scoped.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::UnknownTool(_) => Some(ErrorKind::UnknownTool),
            Error::InvalidArguments { .. } => Some(ErrorKind::InvalidArguments),
            Error::Transport { .. } | Error::Timeout(_) => Some(ErrorKind::Transport),
            Error::ToolError { .. } => Some(ErrorKind::ToolError),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
