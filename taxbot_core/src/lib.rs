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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

mod error;
mod reply;
pub mod util;

pub use error::ModelError;
pub use reply::{Choice, Choices, Reply};
pub use util::{TELEGRAM_MESSAGE_LIMIT, chunk_text};

/// Opaque, stable identity of a user as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserKey(pub u64);

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserKey {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the free-form conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

impl HistoryEntry {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A language model that turns a single prompt into a single answer.
///
/// Implementations make exactly one attempt per call; callers decide what a
/// failure means for the user.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<LLMResponse, ModelError>;
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<LLMResponse, ModelError> {
        (**self).generate(prompt).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LLMProvider for Echo {
        async fn generate(&self, prompt: &str) -> Result<LLMResponse, ModelError> {
            Ok(LLMResponse {
                content: prompt.to_uppercase(),
                usage: None,
            })
        }

        fn model_name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test]
    async fn arc_dyn_provider_delegates() {
        let provider: Arc<dyn LLMProvider> = Arc::new(Echo);
        let response = provider.generate("налог").await.unwrap();
        assert_eq!(response.content, "НАЛОГ");
        assert_eq!(provider.model_name(), "echo");
    }

    #[test]
    fn history_entry_constructors() {
        assert_eq!(HistoryEntry::user("hi").role, Role::User);
        assert_eq!(HistoryEntry::assistant("hello").role, Role::Assistant);
        assert_eq!(UserKey(42).to_string(), "42");
    }
}
