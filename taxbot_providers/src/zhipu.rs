use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use taxbot_core::{LLMProvider, LLMResponse, ModelError, Usage};
use tracing::info;

use crate::{send_json, token_count};

/// Zhipu GLM through its OpenAI-style chat completions endpoint.
pub struct ZhipuProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ZhipuProvider {
    pub const DEFAULT_MODEL: &'static str = "glm-4-flash";

    pub fn new(api_key: String) -> Self {
        info!("Creating ZhipuProvider");
        Self {
            client: Client::new(),
            api_key,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
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
        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ModelError::InvalidResponse("missing content".to_string()))?
            .to_string();

        let u = &response["usage"];
        let usage = u.is_object().then(|| Usage {
            prompt_tokens: token_count(&u["prompt_tokens"]),
            completion_tokens: token_count(&u["completion_tokens"]),
            total_tokens: token_count(&u["total_tokens"]),
        });

        Ok(LLMResponse { content, usage })
    }
}

#[async_trait]
impl LLMProvider for ZhipuProvider {
    async fn generate(&self, prompt: &str) -> Result<LLMResponse, ModelError> {
        let request = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        info!("Sending request to Zhipu API: model={}", self.model);

        let response = send_json(
            self.client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        info!("Received response from Zhipu API");
        Self::parse_response(&response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
