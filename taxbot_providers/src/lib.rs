#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod gemini;
mod zhipu;

pub use gemini::GeminiProvider;
pub use zhipu::ZhipuProvider;

use taxbot_core::ModelError;

/// Send a prepared request and decode the JSON body, mapping every failure
/// to a [`ModelError`].
async fn send_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value, ModelError> {
    let response = request
        .send()
        .await
        .map_err(|e| ModelError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ModelError::Api {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| ModelError::InvalidResponse(e.to_string()))
}

fn token_count(value: &serde_json::Value) -> u32 {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}
