use crate::{Command, Error, Result, keyboard};
use std::{collections::HashMap, sync::Arc, time::Duration};
use taxbot_core::{Choices, LLMProvider, Reply, chunk_text};
use taxbot_conversation::TurnRouter;
use teloxide::{
    prelude::*,
    types::{ChatId, MessageId},
};
use tokio::{sync::Mutex, time::sleep};
use tracing::{debug, info, warn};

/// Router shared by every update handler.
pub type SharedRouter = Arc<TurnRouter<Arc<dyn LLMProvider>>>;

/// How often idle users are swept out of memory.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Telegram bot in front of a [`TurnRouter`].
#[derive(Clone)]
pub struct TelegramBot {
    /// Teloxide bot instance
    pub bot: Bot,
    pub router: SharedRouter,
    /// Allowed chat IDs; empty allows everyone
    allowed_chats: Arc<Vec<i64>>,
    /// Longest single message, in characters
    chunk_size: usize,
    /// Users idle longer than this are forgotten
    idle_eviction: Option<chrono::Duration>,
    /// Message per chat whose inline keyboard still offers dialog choices
    offered: Arc<Mutex<HashMap<ChatId, MessageId>>>,
}

impl TelegramBot {
    pub fn new(token: String, router: SharedRouter, allowed_chats: &[String]) -> Self {
        let allowed_chats = allowed_chats
            .iter()
            .filter_map(|s| {
                let id = s.trim().parse::<i64>();
                if id.is_err() {
                    warn!("Ignoring invalid chat id in allow list: {s}");
                }
                id.ok()
            })
            .collect();

        Self {
            bot: Bot::new(token),
            router,
            allowed_chats: Arc::new(allowed_chats),
            chunk_size: taxbot_core::TELEGRAM_MESSAGE_LIMIT,
            idle_eviction: None,
            offered: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub const fn with_idle_eviction(mut self, max_idle: Option<chrono::Duration>) -> Self {
        self.idle_eviction = max_idle;
        self
    }

    /// Check if a chat is allowed
    #[must_use]
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id)
    }

    /// Reject chats outside the allow list before anything is sent to them.
    pub fn authorize(&self, chat_id: ChatId) -> Result<()> {
        if self.is_allowed(chat_id.0) {
            Ok(())
        } else {
            Err(Error::Unauthorized(chat_id.0))
        }
    }

    /// Send router replies in order, splitting long texts.
    ///
    /// Offered choices are attached to the last chunk of their reply and
    /// replace any keyboard offered earlier in the chat.
    pub async fn send_replies(&self, chat_id: ChatId, replies: Vec<Reply>) -> Result<()> {
        for reply in replies {
            if !matches!(reply.choices, Choices::Keep) {
                self.strip_choices(chat_id, None).await;
            }

            let chunks = chunk_text(&reply.text, self.chunk_size);
            let last = chunks.len().saturating_sub(1);

            for (i, chunk) in chunks.into_iter().enumerate() {
                let request = self.bot.send_message(chat_id, chunk);
                match &reply.choices {
                    Choices::Offer(choices) if i == last => {
                        let sent = request
                            .reply_markup(keyboard::choices_markup(choices))
                            .await?;
                        self.offered.lock().await.insert(chat_id, sent.id);
                    }
                    _ => {
                        request.await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Remove the inline keyboard from `pressed` and from the chat's
    /// current offer.
    ///
    /// Failures are only logged; the message may be too old to edit.
    pub async fn strip_choices(&self, chat_id: ChatId, pressed: Option<MessageId>) {
        let offered = self.offered.lock().await.remove(&chat_id);

        let mut ids: Vec<MessageId> = pressed.into_iter().collect();
        if let Some(id) = offered.filter(|id| !ids.contains(id)) {
            ids.push(id);
        }

        for message_id in ids {
            if let Err(e) = self.bot.edit_message_reply_markup(chat_id, message_id).await {
                debug!("Could not remove keyboard from message {}: {e}", message_id.0);
            }
        }
    }

    /// Test connection to Telegram API with linear backoff retry.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    /// Retries indefinitely until connection succeeds.
    async fn test_connection(&self) {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1u64;
        loop {
            match self.bot.get_me().await {
                Ok(me) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        me.user
                            .username
                            .clone()
                            .unwrap_or_else(|| "no username".to_string()),
                        me.user.id
                    );
                    return;
                }
                Err(e) => {
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);

                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");

                    if attempt == 1 {
                        warn!("This may be due to:");
                        warn!("  - Network connectivity issues");
                        warn!("  - Firewall blocking api.telegram.org");
                        warn!("  - Invalid bot token");
                    }

                    sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    fn spawn_eviction(&self) {
        let Some(max_idle) = self.idle_eviction else {
            return;
        };
        let router = Arc::clone(&self.router);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(EVICTION_INTERVAL);
            loop {
                ticker.tick().await;
                let evicted = router.store().evict_idle(max_idle).await;
                if evicted > 0 {
                    info!("Evicted {evicted} idle users");
                } else {
                    debug!("No idle users to evict");
                }
            }
        });
    }

    /// Run the bot until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::{CallbackQuery, Message, Update};

        self.test_connection().await;

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {e}");
        }

        self.spawn_eviction();

        let bot = self.bot.clone();

        let schema = dptree::entry()
            .branch(Update::filter_message().endpoint({
                let this = self.clone();
                move |msg: Message| {
                    let this = this.clone();
                    async move { crate::handler::handle_message(this, msg).await }
                }
            }))
            .branch(Update::filter_callback_query().endpoint({
                let this = self.clone();
                move |query: CallbackQuery| {
                    let this = this.clone();
                    async move { crate::handler::handle_callback(this, query).await }
                }
            }));

        info!("Telegram dispatcher started");

        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
