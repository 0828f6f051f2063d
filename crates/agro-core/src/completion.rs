//! ============================================================================
//! Completion Client - Chat completions via OpenRouter
//! ============================================================================
//! One operation: turn a system instruction plus the raw user query into
//! free text. Error replies carry a structured error object which is
//! surfaced instead of the transport body when present.
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// API endpoint for OpenRouter chat completions
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Referer OpenRouter expects from registered apps
const OPENROUTER_REFERER: &str = "http://localhost:3000";

/// The completion collaborator consumed by the query pipeline
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Produce a free-text reply for the instruction + query pair
    async fn complete(&self, system_instruction: &str, user_query: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// OpenRouter-backed completion client
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, system_instruction: &str, user_query: &str) -> Result<String> {
        debug!(
            "Calling completion endpoint, model {} ({} instruction chars)",
            self.model,
            system_instruction.len()
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_instruction.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_query.to_string(),
                },
            ],
            max_tokens: 1000,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", OPENROUTER_REFERER)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to call completion endpoint: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read completion response: {}", e))?;

        let parsed: ChatResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                if !status.is_success() {
                    return Err(anyhow!("Completion endpoint error {}: {}", status, body));
                }
                return Err(anyhow!("Failed to parse completion response: {}", e));
            }
        };

        // OpenRouter reports failures in-band as a structured error object
        if let Some(error) = parsed.error {
            return Err(anyhow!("Completion endpoint error: {}", error.message));
        }
        if !status.is_success() {
            return Err(anyhow!("Completion endpoint error {}: {}", status, body));
        }

        info!("Completion reply received");

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("Completion reply carried no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_keeps_configured_model() {
        let client = OpenRouterClient::new("test-key".to_string(), "gryphe/mythomax-l2-13b".into());
        assert_eq!(client.model(), "gryphe/mythomax-l2-13b");
    }

    #[test]
    fn parses_reply_body() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Siembra en abril."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.error.is_none());
        assert_eq!(parsed.choices[0].message.content, "Siembra en abril.");
    }

    #[test]
    fn parses_structured_error_body() {
        let raw = r#"{"error":{"message":"Invalid API key","code":401}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.error.unwrap().message, "Invalid API key");
        assert!(parsed.choices.is_empty());
    }
}
