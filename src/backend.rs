//! Generative backend seam
//!
//! The orchestrator only sees these two traits. The clean backend is a hosted
//! completion API (OpenAI or Anthropic), the rude backend a locally hosted
//! model (Ollama). Implementations live next to their HTTP clients.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::BackendError;

#[async_trait]
pub trait CleanBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn clean_complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, BackendError>;
}

#[async_trait]
pub trait RudeBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn rude_complete(&self, prompt: &str, options: &RudeOptions)
        -> Result<String, BackendError>;
}

/// Generation options for the rude backend
#[derive(Debug, Clone, PartialEq)]
pub struct RudeOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

impl Default for RudeOptions {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            max_tokens: 50,
            stop: ["User:", "Human:", "\n\n", ".", "!", "?"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Shortest rude-backend output worth sending
pub const MIN_RUDE_REPLY_CHARS: usize = 5;
const MAX_RUDE_REPLY_CHARS: usize = 100;

static TONE_NOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\(in a [^)]+tone\)").unwrap());
static TRANSLATION_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\((?:roughly translates to|translated)[^)]+\)").unwrap());
static SPEAKER_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"सामर्थ:\s*").unwrap());
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").unwrap());

/// Reduce raw rude-backend output to a single in-character line.
///
/// Returns `None` when nothing usable (at least 5 characters) is left.
pub fn clean_rude_output(raw: &str, persona_name: &str) -> Option<String> {
    let speaker = format!("{}:", persona_name);
    let text = match raw.split_once(&speaker) {
        Some((_, after)) => after.trim(),
        None => raw.trim(),
    };

    let first_line = text.lines().next().unwrap_or("").trim();
    let without_tone = TONE_NOTE.replace_all(first_line, "");
    let without_translation = TRANSLATION_NOTE.replace_all(&without_tone, "");
    let mut cleaned = SPEAKER_LABEL
        .replace_all(&without_translation, "")
        .trim()
        .to_string();

    if cleaned.chars().count() > MAX_RUDE_REPLY_CHARS {
        let first_sentence = SENTENCE_END
            .split(&cleaned)
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        cleaned = if first_sentence.is_empty() {
            first_sentence
        } else {
            format!("{}!", first_sentence)
        };
    }

    if cleaned.chars().count() < MIN_RUDE_REPLY_CHARS {
        return None;
    }
    Some(cleaned)
}
