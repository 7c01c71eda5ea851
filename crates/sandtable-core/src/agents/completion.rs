//! Text-completion client boundary.
//!
//! The language model is consumed as an opaque prompt-in/text-out service
//! behind [`CompletionClient`]. Production uses [`OllamaClient`] against an
//! Ollama-compatible HTTP endpoint; tests inject the deterministic doubles
//! from [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors from a completion call. The orchestrator treats all of them
/// identically (retry once, then fail the run).
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("http error: {0}")]
    Http(String),

    #[error("bad response payload: {0}")]
    Payload(String),

    #[error("scripted client exhausted its responses")]
    Exhausted,
}

/// Role-parameterized text completion: system prompt + user prompt in, one
/// text turn out. Implementations must be safe to share across concurrent
/// runs.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError>;

    /// Identifier reported in evaluation results.
    fn model_name(&self) -> String;
}

/// Configuration for the Ollama-compatible HTTP backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Server base URL, e.g. `http://localhost:11434`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            base_url: std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("SANDTABLE_MODEL").unwrap_or_else(|_| "llama3.1:8b".to_string()),
            temperature: 0.7,
        }
    }
}

impl OllamaConfig {
    pub fn new(base_url: &str, model: &str) -> Self {
        OllamaConfig {
            base_url: base_url.to_string(),
            model: model.to_string(),
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Non-streaming client for an Ollama-compatible `/api/chat` endpoint.
pub struct OllamaClient {
    config: OllamaConfig,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sandtable/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("default reqwest client builds");
        OllamaClient { config, http }
    }

    pub fn from_env() -> Self {
        Self::new(OllamaConfig::default())
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        debug!(model = %self.config.model, prompt_chars = prompt.len(), "completion request");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CompletionError::Http(format!(
                "status {} from {}",
                response.status(),
                url
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Payload(e.to_string()))?;

        Ok(parsed.message.content)
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_config_defaults() {
        let config = OllamaConfig::new("http://localhost:11434", "llama3.1:8b");
        assert_eq!(config.temperature, 0.7);
    }

    #[test]
    fn test_ollama_config_with_temperature() {
        let config = OllamaConfig::new("http://h:1", "m").with_temperature(0.2);
        assert_eq!(config.temperature, 0.2);
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "llama3.1:8b",
            messages: vec![ChatMessage {
                role: "system",
                content: "you are a commander",
            }],
            stream: false,
            options: ChatOptions { temperature: 0.7 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], serde_json::json!(false));
        assert_eq!(json["messages"][0]["role"], "system");
    }
}
