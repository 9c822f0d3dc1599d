//! Session, Turn, and lineage types persisted by the Session Store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Session {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            created_at: now,
            updated_at: now,
            turns: Vec::new(),
            metadata: serde_json::json!({}),
        }
    }

    /// `turn_number` for the next turn appended to this session (I3).
    pub fn next_turn_number(&self) -> u64 {
        self.turns.len() as u64 + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub turn_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        SessionSummary {
            session_id: s.session_id.clone(),
            created_at: s.created_at,
            turn_count: s.turns.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub turn_id: String,
    pub turn_number: u64,
    pub user_message: String,
    pub assistant_response: String,
    pub success: bool,
    pub metadata: ExecutionMetadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub rounds: u32,
    pub providers_used: BTreeSet<String>,
    pub execution_time_ms: u64,
    pub lineage: Vec<LineageRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
    Cached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageRecord {
    pub step: u32,
    pub tool_name: String,
    pub provider_id: String,
    pub arguments: serde_json::Value,
    pub result_summary: String,
    pub result: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
    /// Present when `outcome == Error`, names the stable error kind.
    #[serde(default)]
    pub error_kind: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub turn_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Ratings outside 1–5 are rejected at the API boundary, not here —
    /// this only checks the stored invariant.
    pub fn rating_in_range(&self) -> bool {
        (1..=5).contains(&self.rating)
    }
}
