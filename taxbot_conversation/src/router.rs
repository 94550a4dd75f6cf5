//! Turn routing between the calculator dialog and free-form questions.

use std::sync::Arc;
use std::time::Duration;

use taxbot_calc::CalcVariant;
use taxbot_core::{HistoryEntry, LLMProvider, ModelError, Reply, Role, UserKey};
use taxbot_dialog::{CANCELLED_TEXT, DialogConfig, Event, Session, StateError, transition};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::prompt::PromptTemplate;
use crate::store::{SessionStore, UserState};

/// Sent instead of an answer whenever the model call fails.
pub const MODEL_FAILURE_TEXT: &str = "Произошла ошибка. Попробуйте позже.";

/// Configuration for turn routing.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Upper bound on a single model call.
    pub model_timeout: Duration,
    pub prompt: PromptTemplate,
    pub dialog: DialogConfig,
    /// Surface dialog state errors to the caller instead of quietly
    /// cancelling the dialog.
    pub strict_state_errors: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(60),
            prompt: PromptTemplate::default(),
            dialog: DialogConfig::default(),
            strict_state_errors: cfg!(debug_assertions),
        }
    }
}

impl RouterConfig {
    #[must_use]
    pub const fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_strict_state_errors(mut self, strict: bool) -> Self {
        self.strict_state_errors = strict;
        self
    }
}

#[derive(Debug, Error)]
pub enum RouterError {
    /// The user's dialog session was inconsistent. The session has already
    /// been reset to idle when this is returned.
    #[error("dialog state error for user {user}: {source}")]
    State {
        user: UserKey,
        #[source]
        source: StateError,
    },
}

/// Entry point for every user turn.
pub struct TurnRouter<P> {
    provider: P,
    store: Arc<SessionStore>,
    config: RouterConfig,
}

impl<P: LLMProvider> TurnRouter<P> {
    pub fn new(provider: P, store: Arc<SessionStore>, config: RouterConfig) -> Self {
        info!(
            "Creating turn router: model={}, timeout={:?}, history_limit={}",
            provider.model_name(),
            config.model_timeout,
            store.history_limit()
        );
        Self {
            provider,
            store,
            config,
        }
    }

    /// Handle a text turn.
    ///
    /// Goes to the dialog if one is active, to the language model otherwise.
    /// Model failures never error; they produce [`MODEL_FAILURE_TEXT`].
    pub async fn route(&self, user: UserKey, text: &str) -> Result<Vec<Reply>, RouterError> {
        let mut state = self.store.lock(user).await;

        if state.session.is_active() {
            return self.apply(user, &mut state, Event::Text(text.to_string()));
        }

        let question = text.trim();
        if question.is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![self.answer(user, &mut state, question).await])
    }

    /// Start (or restart) the calculator dialog.
    pub async fn start_dialog(
        &self,
        user: UserKey,
        variant: CalcVariant,
    ) -> Result<Vec<Reply>, RouterError> {
        let mut state = self.store.lock(user).await;
        info!("[{user}] Starting {variant:?} calculator");
        self.apply(user, &mut state, Event::Start(variant))
    }

    pub async fn cancel(&self, user: UserKey) -> Result<Vec<Reply>, RouterError> {
        let mut state = self.store.lock(user).await;
        self.apply(user, &mut state, Event::Cancel)
    }

    /// Forget the free-form history. The dialog is left as is.
    pub async fn reset_history(&self, user: UserKey) {
        let mut state = self.store.lock(user).await;
        state.history.reset();
        info!("[{user}] History reset");
    }

    /// Drop both the dialog and the history, as a fresh `/start` does.
    pub async fn reset(&self, user: UserKey) {
        let mut state = self.store.lock(user).await;
        state.session = Session::default();
        state.history.reset();
        info!("[{user}] Session reset");
    }

    /// Copy of the user's dialog session and history.
    pub async fn snapshot(&self, user: UserKey) -> (Session, Vec<HistoryEntry>) {
        let state = self.store.lock(user).await;
        (state.session.clone(), state.history.entries().cloned().collect())
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    fn apply(
        &self,
        user: UserKey,
        state: &mut UserState,
        event: Event,
    ) -> Result<Vec<Reply>, RouterError> {
        let from = state.session.state;

        match transition(&state.session, event, &self.config.dialog) {
            Ok(next) => {
                debug!("[{user}] Dialog {from:?} -> {:?}", next.session.state);
                if let Some(report) = &next.report {
                    info!(
                        "[{user}] Calculation done: entity={}, employees={}, total={}",
                        report.entity_type, report.employee_count, report.grand_total
                    );
                }
                state.session = next.session;
                Ok(next.replies)
            }
            Err(source) => {
                error!("[{user}] Dialog state error in {from:?}: {source}");
                state.session = Session::default();
                if self.config.strict_state_errors {
                    Err(RouterError::State { user, source })
                } else {
                    Ok(vec![Reply::text(CANCELLED_TEXT).removing_choices()])
                }
            }
        }
    }

    async fn answer(&self, user: UserKey, state: &mut UserState, question: &str) -> Reply {
        info!("[{user}] Question: {question}");
        state.history.append(Role::User, question);

        let prompt = self
            .config
            .prompt
            .render(&state.history.render(), question);

        match self.generate(&prompt).await {
            Ok(answer) => {
                info!("[{user}] Answer: {answer}");
                state.history.append(Role::Assistant, answer.as_str());
                Reply::text(answer)
            }
            Err(e) => {
                warn!("[{user}] Model error: {e}");
                Reply::text(MODEL_FAILURE_TEXT)
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let timeout = self.config.model_timeout;
        let response = tokio::time::timeout(timeout, self.provider.generate(prompt))
            .await
            .map_err(|_| ModelError::Timeout(timeout))??;

        if let Some(usage) = &response.usage {
            debug!(
                "Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use taxbot_core::LLMResponse;
    use taxbot_dialog::DialogState;

    struct Fixed(&'static str);

    #[async_trait]
    impl LLMProvider for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<LLMResponse, ModelError> {
            Ok(LLMResponse {
                content: self.0.to_string(),
                usage: None,
            })
        }

        fn model_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn router(answer: &'static str, strict: bool) -> TurnRouter<Fixed> {
        TurnRouter::new(
            Fixed(answer),
            Arc::new(SessionStore::new(5)),
            RouterConfig::default().with_strict_state_errors(strict),
        )
    }

    async fn corrupt(router: &TurnRouter<Fixed>, user: UserKey) {
        let mut state = router.store().lock(user).await;
        state.session = Session {
            state: DialogState::AwaitingRevenue,
            ..Session::default()
        };
    }

    #[tokio::test]
    async fn test_lenient_state_error_cancels() {
        let router = router("ok", false);
        let user = UserKey(7);
        corrupt(&router, user).await;

        let replies = router.route(user, "100").await.unwrap();
        assert_eq!(replies[0].text, CANCELLED_TEXT);
        let (session, _) = router.snapshot(user).await;
        assert_eq!(session, Session::default());
    }

    #[tokio::test]
    async fn test_strict_state_error_surfaces_after_reset() {
        let router = router("ok", true);
        let user = UserKey(7);
        corrupt(&router, user).await;

        let err = router.route(user, "100").await.unwrap_err();
        assert!(matches!(err, RouterError::State { user: UserKey(7), .. }));
        let (session, _) = router.snapshot(user).await;
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_blank_answer_is_a_failure() {
        let router = router("   ", true);
        let user = UserKey(1);

        let replies = router.route(user, "Что такое СО?").await.unwrap();
        assert_eq!(replies[0].text, MODEL_FAILURE_TEXT);
        let (_, history) = router.snapshot(user).await;
        assert_eq!(history, vec![HistoryEntry::user("Что такое СО?")]);
    }

    #[tokio::test]
    async fn test_reset_clears_dialog_and_history() {
        let router = router("Ответ", true);
        let user = UserKey(3);
        router.route(user, "Вопрос").await.unwrap();
        router.start_dialog(user, CalcVariant::Detailed).await.unwrap();

        router.reset(user).await;

        let (session, history) = router.snapshot(user).await;
        assert_eq!(session, Session::default());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_is_ignored() {
        let router = router("ok", true);
        assert!(router.route(UserKey(1), "  ").await.unwrap().is_empty());
        let (_, history) = router.snapshot(UserKey(1)).await;
        assert!(history.is_empty());
    }
}
