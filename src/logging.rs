//! Structured logging module for Buddybot
//!
//! Events go through `tracing` with categories:
//! - ROUTING: Strategy gate decisions
//! - AGENT: Generative backend calls
//! - MEMORY: Conversation memory changes
//! - CONVERSATION: Lifecycle (startup, engagement)
//! - ERROR: Backend failures and other errors

use tracing_subscriber::EnvFilter;

/// Log categories for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Routing,
    Agent,
    Memory,
    Conversation,
    Error,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Routing => "ROUTING",
            LogCategory::Agent => "AGENT",
            LogCategory::Memory => "MEMORY",
            LogCategory::Conversation => "CONVERSATION",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Initialize the logging system. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding apps) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    log(LogCategory::Conversation, None, "Buddybot logging initialized");
}

/// Shorten a user id for log output
fn user_context(user_id: Option<&str>) -> String {
    user_id
        .map(|id| id.chars().take(8).collect::<String>())
        .unwrap_or_default()
}

/// Log a message with category and optional user context
pub fn log(category: LogCategory, user_id: Option<&str>, message: &str) {
    let user = user_context(user_id);
    let category = category.as_str();

    match category {
        "ERROR" => tracing::warn!(category, user = %user, "{}", message),
        _ => tracing::info!(category, user = %user, "{}", message),
    }
}

/// Log a routing decision (which gate fired, which backend was chosen)
pub fn log_routing(user_id: Option<&str>, message: &str) {
    log(LogCategory::Routing, user_id, message);
}

/// Log a generative backend event
pub fn log_agent(user_id: Option<&str>, message: &str) {
    log(LogCategory::Agent, user_id, message);
}

/// Log a memory event
pub fn log_memory(user_id: Option<&str>, message: &str) {
    tracing::debug!(category = LogCategory::Memory.as_str(), user = %user_context(user_id), "{}", message);
}

/// Log a conversation lifecycle event
pub fn log_conversation(user_id: Option<&str>, message: &str) {
    log(LogCategory::Conversation, user_id, message);
}

/// Log an error
pub fn log_error(user_id: Option<&str>, message: &str) {
    log(LogCategory::Error, user_id, message);
}
