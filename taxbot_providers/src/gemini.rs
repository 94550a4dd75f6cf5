use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use taxbot_core::{LLMProvider, LLMResponse, ModelError, Usage};
use tracing::info;

use crate::{send_json, token_count};

/// Google Gemini through the `generateContent` REST endpoint.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";

    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::new(),
            api_key,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn parse_response(response: &Value) -> Result<LLMResponse, ModelError> {
        if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
            return Err(ModelError::InvalidResponse(format!(
                "prompt blocked: {reason}"
            )));
        }

        let parts = response["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                ModelError::InvalidResponse("missing candidates[0].content.parts".to_string())
            })?;

        let content = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<String>();

        let u = &response["usageMetadata"];
        let usage = u.is_object().then(|| Usage {
            prompt_tokens: token_count(&u["promptTokenCount"]),
            completion_tokens: token_count(&u["candidatesTokenCount"]),
            total_tokens: token_count(&u["totalTokenCount"]),
        });

        Ok(LLMResponse { content, usage })
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<LLMResponse, ModelError> {
        let request = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        info!("Sending request to Gemini API: model={}", self.model);

        let response = send_json(
            self.client
                .post(format!(
                    "{}/models/{}:generateContent",
                    self.base_url, self.model
                ))
                .header("x-goog-api-key", &self.api_key)
                .json(&request),
        )
        .await?;

        info!("Received response from Gemini API");
        Self::parse_response(&response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_text_parts_and_reads_usage() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Ставка " }, { "text": "3%." }] }
            }],
            "usageMetadata": {
                "promptTokenCount": 12,
                "candidatesTokenCount": 4,
                "totalTokenCount": 16
            }
        });

        let response = GeminiProvider::parse_response(&body).unwrap();
        assert_eq!(response.content, "Ставка 3%.");
        let usage = response.usage.unwrap();
        assert_eq!(usage.total_tokens, 16);
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = GeminiProvider::parse_response(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn missing_candidates_is_an_error() {
        let err = GeminiProvider::parse_response(&json!({})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }
}
