use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taxbot_core::TELEGRAM_MESSAGE_LIMIT;
use taxbot_conversation::{DEFAULT_HISTORY_LIMIT, PromptTemplate};
use taxbot_dialog::DialogConfig;
use tracing::info;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub conversation: ConversationSettings,
    #[serde(default)]
    pub dialog: DialogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    #[serde(default = "TelegramConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    /// Chat ids allowed to talk to the bot. Empty allows everyone.
    #[serde(default)]
    pub allow_from: Vec<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            token: String::new(),
            allow_from: Vec::new(),
        }
    }
}

impl TelegramConfig {
    const fn default_enabled() -> bool {
        true
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Zhipu,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub default: ProviderKind,
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub zhipu: ProviderConfig,
}

impl ProvidersConfig {
    /// Settings of the provider selected by `default`.
    #[must_use]
    pub const fn selected(&self) -> &ProviderConfig {
        match self.default {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Zhipu => &self.zhipu,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationSettings {
    /// Past turns embedded in free-form prompts.
    #[serde(default = "ConversationSettings::default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "ConversationSettings::default_model_timeout_secs")]
    pub model_timeout_secs: u64,
    /// Longest message the transport accepts, in characters.
    #[serde(default = "ConversationSettings::default_message_chunk_size")]
    pub message_chunk_size: usize,
    /// Forget users idle for this long. Zero keeps everyone.
    #[serde(default = "ConversationSettings::default_idle_eviction_hours")]
    pub idle_eviction_hours: u64,
    #[serde(default)]
    pub prompt_template: PromptTemplate,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            history_limit: Self::default_history_limit(),
            model_timeout_secs: Self::default_model_timeout_secs(),
            message_chunk_size: Self::default_message_chunk_size(),
            idle_eviction_hours: Self::default_idle_eviction_hours(),
            prompt_template: PromptTemplate::default(),
        }
    }
}

impl ConversationSettings {
    const fn default_history_limit() -> usize {
        DEFAULT_HISTORY_LIMIT
    }

    const fn default_model_timeout_secs() -> u64 {
        60
    }

    const fn default_message_chunk_size() -> usize {
        TELEGRAM_MESSAGE_LIMIT
    }

    const fn default_idle_eviction_hours() -> u64 {
        24
    }
}

const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";
const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("taxbot"))
    }

    /// Load `~/taxbot/config.json`, then apply environment overrides.
    ///
    /// Without a config file the defaults are used, as long as the
    /// environment supplies at least one credential.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");

        let mut config = if config_path.exists() {
            let config = Self::load_from(&config_path)?;
            info!("Loaded config from {}", config_path.display());
            config
        } else {
            let has_env = [TELEGRAM_TOKEN_ENV, GEMINI_API_KEY_ENV]
                .iter()
                .any(|key| std::env::var(key).is_ok_and(|v| !v.is_empty()));
            if !has_env {
                anyhow::bail!(
                    "Config file not found at: {}. Please run 'taxbot init' to create config.",
                    config_path.display()
                );
            }
            info!("No config file, using defaults and environment");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Replace secrets with non-empty values from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(token) = lookup(TELEGRAM_TOKEN_ENV) {
            info!("Using Telegram token from {TELEGRAM_TOKEN_ENV}");
            self.telegram.token = token;
        }
        if let Some(api_key) = lookup(GEMINI_API_KEY_ENV) {
            info!("Using Gemini API key from {GEMINI_API_KEY_ENV}");
            self.providers.gemini.api_key = api_key;
        }
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Put your Gemini API key into providers.gemini.api_key");
        println!("   2. Put your Telegram bot token into telegram.token");
        println!("   3. Run 'taxbot telegram' to start the bot, or 'taxbot chat' to try it locally");
        println!();
        println!("🔧 Configuration options:");
        println!("   - conversation.history_limit: past turns included in each question");
        println!("   - dialog.rates: tax and contribution rates used by the calculator");
        println!("   - TELEGRAM_TOKEN / GEMINI_API_KEY override the file when set");
        println!();
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "telegram": {
    "enabled": true,
    "token": "your-telegram-bot-token-here",
    "allow_from": []
  },
  "providers": {
    "default": "gemini",
    "gemini": {
      "api_key": "your-gemini-api-key-here",
      "model": "gemini-2.0-flash"
    },
    "zhipu": {
      "api_key": "",
      "model": "glm-4-flash"
    }
  },
  "conversation": {
    "history_limit": 5,
    "model_timeout_secs": 60,
    "message_chunk_size": 4096,
    "idle_eviction_hours": 24
  },
  "dialog": {
    "max_employees": 1000,
    "max_amount": "1000000000000000",
    "rates": {
      "business_tax": "0.03",
      "pension_employer": "0.025",
      "medical_employer": "0.03",
      "social_contribution": "0.05",
      "pension": "0.10",
      "medical_employee": "0.02",
      "income_tax": "0.10",
      "deduction": "55048",
      "min_wage": "85000",
      "flat_rate": {
        "base_multiplier": "1",
        "medical_base_multiplier": "1.4",
        "medical_rate": "0.05"
      }
    }
  }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.dialog, DialogConfig::default());
        assert_eq!(config.conversation.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.providers.default, ProviderKind::Gemini);
        assert_eq!(
            config.providers.selected().model.as_deref(),
            Some("gemini-2.0-flash")
        );
    }

    #[test]
    fn empty_object_is_a_valid_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.telegram.enabled);
        assert_eq!(config.conversation.message_chunk_size, 4096);
        assert_eq!(config.conversation.prompt_template, PromptTemplate::default());
    }

    #[test]
    fn env_overrides_secrets_only_when_non_empty() {
        let mut config = Config::default();
        config.telegram.token = "from-file".to_string();

        config.apply_env_overrides(|key| match key {
            "TELEGRAM_TOKEN" => Some(String::new()),
            "GEMINI_API_KEY" => Some("from-env".to_string()),
            _ => None,
        });

        assert_eq!(config.telegram.token, "from-file");
        assert_eq!(config.providers.gemini.api_key, "from-env");
    }

    #[test]
    fn zhipu_can_be_selected() {
        let config: Config =
            serde_json::from_str(r#"{"providers": {"default": "zhipu", "zhipu": {"api_key": "k"}}}"#)
                .unwrap();
        assert_eq!(config.providers.selected().api_key, "k");
    }
}
