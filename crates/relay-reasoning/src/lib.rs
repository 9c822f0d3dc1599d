//! The reasoning model collaborator: a thin, pure-function-shaped adapter
//! over a single function-calling chat completions endpoint.

pub mod openai_compat;
pub mod traits;
pub(crate) mod util;

pub use openai_compat::OpenAiCompatModel;
pub use traits::{ChatRequest, ChatResponse, ReasoningModel};
pub use util::resolve_api_key;
