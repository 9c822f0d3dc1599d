//! The Session Store: persists Sessions, Turns, Feedback, and doubles as
//! the cache substrate for the Tool Invoker (§4.5).
//!
//! Backed by two JSON files under a configured state directory —
//! `sessions.json` and `feedback.json` — following the same
//! load-at-startup / flush-after-write discipline the rest of the stack
//! uses for small, infrequently-contended state. The cache itself is
//! kept in memory only: it is TTL-bounded and losing it on restart is
//! harmless, unlike session/turn history.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use relay_domain::cache::{CacheEntry, CacheKey, CacheStore};
use relay_domain::error::{Error, Result};
use relay_domain::session::{ExecutionMetadata, Feedback, Session, SessionSummary, Turn};

pub struct SessionStore {
    sessions_path: PathBuf,
    feedback_path: PathBuf,
    sessions: RwLock<HashMap<String, Session>>,
    feedback: RwLock<HashMap<String, Feedback>>,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl SessionStore {
    /// Load (or create) the store at `state_dir/sessions.json` and
    /// `state_dir/feedback.json`.
    pub fn new(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir).map_err(Error::Io)?;

        let sessions_path = state_dir.join("sessions.json");
        let feedback_path = state_dir.join("feedback.json");

        let sessions: HashMap<String, Session> = load_json(&sessions_path)?;
        let feedback: HashMap<String, Feedback> = load_json(&feedback_path)?;

        tracing::info!(
            sessions = sessions.len(),
            feedback = feedback.len(),
            path = %state_dir.display(),
            "session store loaded"
        );

        Ok(Self {
            sessions_path,
            feedback_path,
            sessions: RwLock::new(sessions),
            feedback: RwLock::new(feedback),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the session if owned by `user_id`, else `None` — a
    /// mismatched caller gets the same answer as a nonexistent session
    /// (§4.5 Ownership check).
    pub fn load_session(&self, user_id: &str, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read();
        let session = sessions.get(session_id)?;
        if session.user_id != user_id {
            return None;
        }
        Some(session.clone())
    }

    /// Atomically appends a Turn, creating the session if absent.
    /// `turn_number` is `(existing turns) + 1` (I3); the session is never
    /// left partially updated (I4) — the turn is assembled before the
    /// write lock is taken, and the whole map is serialized by one lock.
    pub fn append_turn(
        &self,
        user_id: &str,
        session_id: &str,
        user_message: String,
        assistant_response: String,
        success: bool,
        metadata: ExecutionMetadata,
    ) -> Turn {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id, user_id, now));

        let turn = Turn {
            turn_id: uuid::Uuid::new_v4().to_string(),
            turn_number: session.next_turn_number(),
            user_message,
            assistant_response,
            success,
            metadata,
            created_at: now,
        };
        session.turns.push(turn.clone());
        session.updated_at = now;

        let snapshot = sessions.clone();
        drop(sessions);
        if let Err(e) = flush_json(&self.sessions_path, &snapshot) {
            tracing::warn!(error = %e, "failed to persist session store");
        }

        turn
    }

    /// Summaries for every session owned by `user_id`.
    pub fn list_sessions(&self, user_id: &str) -> Vec<SessionSummary> {
        self.sessions
            .read()
            .values()
            .filter(|s| s.user_id == user_id)
            .map(SessionSummary::from)
            .collect()
    }

    pub fn get_feedback(&self, turn_id: &str) -> Option<Feedback> {
        self.feedback.read().get(turn_id).cloned()
    }

    /// Upserts by `turn_id` (§8 property 8): repeated posts with
    /// different ratings are last-write-wins and never touch the Turn.
    pub fn put_feedback(&self, feedback: Feedback) {
        let mut store = self.feedback.write();
        store.insert(feedback.turn_id.clone(), feedback);
        let snapshot = store.clone();
        drop(store);
        if let Err(e) = flush_json(&self.feedback_path, &snapshot) {
            tracing::warn!(error = %e, "failed to persist feedback store");
        }
    }
}

#[async_trait]
impl CacheStore for SessionStore {
    async fn cache_get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.cache.read().get(&key.as_string()).cloned()
    }

    async fn cache_put(&self, key: CacheKey, value: serde_json::Value, ttl: std::time::Duration) {
        let expires_at = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        self.cache.write().insert(key.as_string(), CacheEntry { value, expires_at });
    }
}

fn load_json<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    Ok(serde_json::from_str(&raw).unwrap_or_default())
}

fn flush_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(Error::Io)
}
