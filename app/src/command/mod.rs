//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type; the shared
//! wiring (provider and router construction from [`Config`]) lives here.

use std::sync::Arc;
use std::time::Duration;
use taxbot_config::{Config, ProviderKind};
use taxbot_conversation::{RouterConfig, SessionStore, TurnRouter};
use taxbot_core::LLMProvider;
use taxbot_providers::{GeminiProvider, ZhipuProvider};
use tracing::info;

mod chat;
mod init;
mod telegram;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use init::InitStrategy;
pub use telegram::{TelegramInput, TelegramStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via the associated type, so
/// commands are dispatched statically.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Build the language model client selected by `providers.default`.
fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn LLMProvider>> {
    let settings = config.providers.selected();
    if settings.api_key.is_empty() {
        anyhow::bail!(
            "API key for provider {:?} is not configured. Set it in config or GEMINI_API_KEY",
            config.providers.default
        );
    }

    let provider: Arc<dyn LLMProvider> = match config.providers.default {
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(settings.api_key.clone());
            if let Some(model) = &settings.model {
                provider = provider.with_model(model.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Zhipu => {
            let mut provider = ZhipuProvider::new(settings.api_key.clone());
            if let Some(model) = &settings.model {
                provider = provider.with_model(model.clone());
            }
            Arc::new(provider)
        }
    };

    info!("Using model {}", provider.model_name());
    Ok(provider)
}

fn router_config(config: &Config) -> RouterConfig {
    RouterConfig {
        prompt: config.conversation.prompt_template.clone(),
        dialog: config.dialog.clone(),
        ..RouterConfig::default()
    }
    .with_model_timeout(Duration::from_secs(config.conversation.model_timeout_secs))
}

/// Users idle for longer than this are dropped; `None` keeps them forever.
fn idle_eviction(config: &Config) -> Option<chrono::Duration> {
    let hours = i64::try_from(config.conversation.idle_eviction_hours).ok()?;
    (hours > 0).then(|| chrono::Duration::hours(hours))
}

fn build_router(config: &Config) -> anyhow::Result<TurnRouter<Arc<dyn LLMProvider>>> {
    let provider = build_provider(config)?;
    let store = Arc::new(SessionStore::new(config.conversation.history_limit));
    Ok(TurnRouter::new(provider, store, router_config(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_config_follows_settings() {
        let mut config = Config::default();
        config.conversation.model_timeout_secs = 5;
        config.dialog.max_employees = 3;

        let router = router_config(&config);
        assert_eq!(router.model_timeout, Duration::from_secs(5));
        assert_eq!(router.dialog.max_employees, 3);
    }

    #[test]
    fn test_idle_eviction_zero_disables() {
        let mut config = Config::default();
        assert_eq!(idle_eviction(&config), Some(chrono::Duration::hours(24)));

        config.conversation.idle_eviction_hours = 0;
        assert_eq!(idle_eviction(&config), None);
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = Config::default();
        assert!(build_provider(&config).is_err());
    }

    #[test]
    fn test_provider_model_override() {
        let mut config = Config::default();
        config.providers.default = ProviderKind::Zhipu;
        config.providers.zhipu.api_key = "key".to_string();
        config.providers.zhipu.model = Some("glm-4-plus".to_string());

        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "glm-4-plus");
    }
}
