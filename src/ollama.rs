use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{RudeBackend, RudeOptions};
use crate::error::BackendError;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mixtral:8x7b";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for a local Ollama server's non-streaming generate endpoint
pub struct OllamaClient {
    client: Client,
    host: String,
    model: String,
}

impl OllamaClient {
    pub fn new(host: &str, model: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.host)
    }
}

fn build_request<'a>(model: &'a str, prompt: &'a str, options: &'a RudeOptions) -> GenerateRequest<'a> {
    GenerateRequest {
        model,
        prompt,
        stream: false,
        options: GenerateOptions {
            temperature: options.temperature,
            top_p: options.top_p,
            num_predict: options.max_tokens,
            stop: &options.stop,
        },
    }
}

#[async_trait]
impl RudeBackend for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn rude_complete(
        &self,
        prompt: &str,
        options: &RudeOptions,
    ) -> Result<String, BackendError> {
        let request = build_request(&self.model, prompt, options);

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                backend: "Ollama",
                status: status.as_u16(),
                message: error_text,
            });
        }

        let generated: GenerateResponse = response.json().await?;
        if generated.response.trim().is_empty() {
            return Err(BackendError::EmptyResponse("Ollama"));
        }
        Ok(generated.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let options = RudeOptions::default();
        let request = build_request(DEFAULT_OLLAMA_MODEL, "User: hi\nBunty:", &options);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "mixtral:8x7b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 50);
        assert_eq!(json["options"]["stop"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_host_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", DEFAULT_OLLAMA_MODEL).unwrap();
        assert_eq!(client.generate_url(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_missing_response_field_defaults_empty() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(parsed.response.is_empty());
    }
}
