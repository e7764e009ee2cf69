use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use ureq::Agent;

use super::TextCompletion;
use crate::error::GenerationError;
use crate::models::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini `generateContent` client with JSON-constrained output
#[derive(Clone)]
pub struct GeminiClient {
    agent: Agent,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        GeminiClient {
            agent: Agent::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(prompt: &str, response_schema: &Value) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema.clone(),
            },
        }
    }
}

#[async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<String, GenerationError> {
        let agent = self.agent.clone();
        let url = self.endpoint();
        let api_key = self.api_key.clone();
        let body = Self::request_body(prompt, response_schema);

        tokio::task::spawn_blocking(move || {
            debug!(url = %url, "Sending generateContent request");
            let response = agent
                .post(&url)
                .set("x-goog-api-key", &api_key)
                .send_json(&body)
                .map_err(|e| GenerationError::Transport(e.to_string()))?;

            let parsed: GenerateContentResponse = response.into_json().map_err(|e| {
                GenerationError::Transport(format!("Failed to parse generateContent response: {e}"))
            })?;
            Ok(parsed.text())
        })
        .await
        .map_err(|e| GenerationError::Transport(format!("HTTP worker failed: {e}")))?
    }
}
