//! The Session Store: persists per-session turn history, execution
//! metadata, and per-turn feedback; also backs the Tool Invoker's cache.

pub mod store;

pub use store::SessionStore;
