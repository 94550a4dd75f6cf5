use crate::command::{CommandStrategy, build_router, idle_eviction};
use std::sync::Arc;
use taxbot_config::Config;
use taxbot_telegram::TelegramBot;
use tracing::info;

/// Input for Telegram bot command.
pub struct TelegramInput {
    /// Optional bot token (overrides config)
    pub token: Option<String>,
    /// Optional allowed chat IDs (overrides config)
    pub allow_from: Option<Vec<String>>,
}

/// Strategy for running Telegram bot.
pub struct TelegramStrategy;

impl CommandStrategy for TelegramStrategy {
    type Input = TelegramInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        if !config.telegram.enabled {
            anyhow::bail!("Telegram is not enabled in config. Set \"telegram.enabled\": true");
        }

        let token = if let Some(t) = input.token {
            t
        } else if !config.telegram.token.is_empty() {
            config.telegram.token.clone()
        } else {
            anyhow::bail!(
                "Telegram bot token not configured. Set \"telegram.token\" in config or TELEGRAM_TOKEN"
            );
        };

        let allow_from = input
            .allow_from
            .unwrap_or_else(|| config.telegram.allow_from.clone());

        info!("Starting Telegram bot...");

        let router = Arc::new(build_router(&config)?);
        let bot = TelegramBot::new(token, router, &allow_from)
            .with_chunk_size(config.conversation.message_chunk_size)
            .with_idle_eviction(idle_eviction(&config));

        info!("Telegram bot is running. Press Ctrl+C to stop.");
        bot.run().await?;

        Ok(())
    }
}
