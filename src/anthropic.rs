use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::CleanBackend;
use crate::error::BackendError;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 60;

// Model constants
pub const CLAUDE_HAIKU: &str = "claude-3-5-haiku-20241022";

#[derive(Debug, Serialize, Clone)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub async fn chat_completion(
        &self,
        system_prompt: Option<&str>,
        messages: Vec<AnthropicMessage>,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String, BackendError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: max_tokens.unwrap_or(2048),
            system: system_prompt.map(|s| s.to_string()),
            messages,
            temperature: Some(temperature),
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                backend: "Anthropic",
                status: status.as_u16(),
                message: describe_error(&error_text),
            });
        }

        let completion: MessagesResponse = response.json().await?;
        last_text_block(completion)
    }
}

/// Prefer the structured `type: message` form when the body parses
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<AnthropicError>(body) {
        Ok(parsed) => format!("{} - {}", parsed.error.error_type, parsed.error.message),
        Err(_) => body.to_string(),
    }
}

fn last_text_block(completion: MessagesResponse) -> Result<String, BackendError> {
    completion
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .last()
        .and_then(|c| c.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(BackendError::EmptyResponse("Anthropic"))
}

#[async_trait]
impl CleanBackend for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn clean_complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, BackendError> {
        let messages = vec![AnthropicMessage {
            role: "user".to_string(),
            content: user_message.to_string(),
        }];

        self.chat_completion(Some(system_prompt), messages, 0.8, Some(180))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_is_top_level() {
        let request = MessagesRequest {
            model: CLAUDE_HAIKU.to_string(),
            max_tokens: 180,
            system: Some("You are Bunty.".to_string()),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            temperature: Some(0.8),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "You are Bunty.");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_last_text_block_wins() {
        let completion: MessagesResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "first"},
                {"type": "text", "text": " second "}
            ]}"#,
        )
        .unwrap();
        assert_eq!(last_text_block(completion).unwrap(), "second");

        let completion: MessagesResponse =
            serde_json::from_str(r#"{"content": [{"type": "thinking", "thinking": "hmm"}]}"#)
                .unwrap();
        assert!(last_text_block(completion).is_err());
    }

    #[test]
    fn test_describe_error() {
        let body = r#"{"error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        assert_eq!(describe_error(body), "overloaded_error - Overloaded");
        assert_eq!(describe_error("Bad Gateway"), "Bad Gateway");
    }
}
