//! Per-user session state
//!
//! This module owns everything the responder remembers between turns:
//! - A bounded conversation history per user (oldest entries evicted first)
//! - The latest conversation state per user
//! - The time of the last rude-backend reply per user (cooldown)
//!
//! Nothing here outlives the process.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::classifier::ConversationState;
use crate::logging;

/// Keep last 10 entries per user
pub const MAX_MEMORY_LENGTH: usize = 10;
/// Context queries see the last 5 entries
pub const CONTEXT_WINDOW: usize = 5;
/// After a rude-backend reply, the user is routed to the clean path for this long
pub const RUDE_RESPONSE_COOLDOWN_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub message: String,
    pub response: String,
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionManager {
    memory: Mutex<HashMap<String, VecDeque<MemoryEntry>>>,
    states: Mutex<HashMap<String, ConversationState>>,
    rude_replies: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the user's history, evicting the oldest past the limit
    pub fn remember(
        &self,
        user_id: &str,
        message: &str,
        response: &str,
        is_bot: bool,
        timestamp: DateTime<Utc>,
    ) {
        let mut memory = self.memory.lock();
        let history = memory.entry(user_id.to_string()).or_default();
        history.push_back(MemoryEntry {
            message: message.to_string(),
            response: response.to_string(),
            is_bot,
            timestamp,
        });

        while history.len() > MAX_MEMORY_LENGTH {
            history.pop_front();
        }

        logging::log_memory(
            Some(user_id),
            &format!("Stored turn, history length {}", history.len()),
        );
    }

    /// Full stored history, oldest first
    pub fn history(&self, user_id: &str) -> Vec<MemoryEntry> {
        self.memory
            .lock()
            .get(user_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The most recent `CONTEXT_WINDOW` entries, oldest first
    pub fn context(&self, user_id: &str) -> Vec<MemoryEntry> {
        let memory = self.memory.lock();
        let Some(history) = memory.get(user_id) else {
            return Vec::new();
        };
        let skip = history.len().saturating_sub(CONTEXT_WINDOW);
        history.iter().skip(skip).cloned().collect()
    }

    pub fn set_state(&self, user_id: &str, state: ConversationState) {
        self.states.lock().insert(user_id.to_string(), state);
    }

    pub fn state(&self, user_id: &str) -> Option<ConversationState> {
        self.states.lock().get(user_id).copied()
    }

    pub fn record_rude_reply(&self, user_id: &str, at: DateTime<Utc>) {
        self.rude_replies.lock().insert(user_id.to_string(), at);
    }

    /// Whether the user got a rude-backend reply less than 30 seconds before `now`
    pub fn in_rude_cooldown(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.rude_replies
            .lock()
            .get(user_id)
            .map(|last| now - *last < Duration::seconds(RUDE_RESPONSE_COOLDOWN_SECS))
            .unwrap_or(false)
    }
}
