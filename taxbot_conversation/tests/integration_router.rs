//! End-to-end turn routing against scripted language models.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taxbot_calc::CalcVariant;
use taxbot_conversation::{MODEL_FAILURE_TEXT, RouterConfig, SessionStore, TurnRouter};
use taxbot_core::{HistoryEntry, LLMProvider, LLMResponse, ModelError, Role, UserKey};
use taxbot_dialog::{DialogState, Session};

/// Answers from a queue and records every prompt it sees.
#[derive(Default)]
struct ScriptedProvider {
    answers: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn with(answers: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate(&self, prompt: &str) -> Result<LLMResponse, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ответ".to_string()));
        next.map(|content| LLMResponse {
            content,
            usage: None,
        })
    }

    fn model_name(&self) -> &'static str {
        "scripted"
    }
}

/// Sleeps on every call and tracks how many calls overlap.
#[derive(Default)]
struct SlowProvider {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl LLMProvider for SlowProvider {
    async fn generate(&self, prompt: &str) -> Result<LLMResponse, ModelError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(LLMResponse {
            content: format!("re: {}", prompt.len()),
            usage: None,
        })
    }

    fn model_name(&self) -> &'static str {
        "slow"
    }
}

fn router<P: LLMProvider>(provider: P) -> TurnRouter<P> {
    TurnRouter::new(
        provider,
        Arc::new(SessionStore::new(5)),
        RouterConfig::default().with_strict_state_errors(true),
    )
}

const USER: UserKey = UserKey(100);

#[tokio::test]
async fn test_question_and_answer_enter_history() {
    let provider = ScriptedProvider::with(vec![Ok("  Ставка ИПН 10%. ".to_string())]);
    let router = router(Arc::clone(&provider));

    let replies = router.route(USER, "Какая ставка ИПН?").await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text, "Ставка ИПН 10%.");

    let (_, history) = router.snapshot(USER).await;
    assert_eq!(
        history,
        vec![
            HistoryEntry::user("Какая ставка ИПН?"),
            HistoryEntry::assistant("Ставка ИПН 10%."),
        ]
    );

    let prompts = provider.prompts();
    assert!(prompts[0].contains("Пользователь: Какая ставка ИПН?"));
    assert!(prompts[0].contains("Новый вопрос пользователя: Какая ставка ИПН?"));
}

#[tokio::test]
async fn test_model_error_keeps_user_entry_only() {
    let provider = ScriptedProvider::with(vec![
        Err(ModelError::Transport("connection reset".to_string())),
        Ok("Второй ответ".to_string()),
    ]);
    let router = router(Arc::clone(&provider));

    let replies = router.route(USER, "первый").await.unwrap();
    assert_eq!(replies[0].text, MODEL_FAILURE_TEXT);
    let (_, history) = router.snapshot(USER).await;
    assert_eq!(history, vec![HistoryEntry::user("первый")]);

    let replies = router.route(USER, "второй").await.unwrap();
    assert_eq!(replies[0].text, "Второй ответ");
    let (_, history) = router.snapshot(USER).await;
    let roles: Vec<Role> = history.iter().map(|e| e.role).collect();
    assert_eq!(roles, [Role::User, Role::User, Role::Assistant]);
    assert_eq!(history[1].text, "второй");
}

#[tokio::test]
async fn test_history_window_is_bounded_in_prompt() {
    let provider = ScriptedProvider::with(Vec::new());
    let router = router(Arc::clone(&provider));

    for i in 0..6 {
        router.route(USER, &format!("вопрос {i}")).await.unwrap();
    }

    let (_, history) = router.snapshot(USER).await;
    assert_eq!(history.len(), 5);
    assert_eq!(history.last().map(|e| e.role), Some(Role::Assistant));

    let last_prompt = provider.prompts().pop().unwrap();
    assert!(!last_prompt.contains("вопрос 0"));
    assert!(last_prompt.contains("вопрос 5"));
}

#[tokio::test]
async fn test_active_dialog_bypasses_model() {
    let provider = ScriptedProvider::with(Vec::new());
    let router = router(Arc::clone(&provider));

    router.start_dialog(USER, CalcVariant::Detailed).await.unwrap();
    router.route(USER, "ТОО").await.unwrap();
    router.route(USER, "1").await.unwrap();
    router.route(USER, "200000").await.unwrap();
    let replies = router.route(USER, "1000000").await.unwrap();

    assert!(replies[0].text.contains("Налог с выручки: 30,000 тг"));
    assert!(replies[0].text.ends_with("Итого к оплате: 86,095 тг"));
    assert!(provider.prompts().is_empty());

    let (session, history) = router.snapshot(USER).await;
    assert_eq!(session, Session::default());
    assert!(history.is_empty());

    // Back to free-form once the report is out.
    router.route(USER, "спасибо").await.unwrap();
    assert_eq!(provider.prompts().len(), 1);
}

#[tokio::test]
async fn test_cancel_in_second_salary() {
    let router = router(ScriptedProvider::with(Vec::new()));

    router.start_dialog(USER, CalcVariant::Detailed).await.unwrap();
    router.route(USER, "ИП").await.unwrap();
    router.route(USER, "3").await.unwrap();
    router.route(USER, "120000").await.unwrap();
    let (session, _) = router.snapshot(USER).await;
    assert_eq!(session.state, DialogState::AwaitingSalary { index: 2 });

    let replies = router.cancel(USER).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert!(!replies[0].text.contains("Итого"));

    let (session, _) = router.snapshot(USER).await;
    assert_eq!(session.state, DialogState::Idle);
    assert!(session.salaries.is_empty());
}

#[tokio::test]
async fn test_restart_keeps_history() {
    let router = router(ScriptedProvider::with(Vec::new()));

    router.route(USER, "привет").await.unwrap();
    router.start_dialog(USER, CalcVariant::Detailed).await.unwrap();
    router.route(USER, "ТОО").await.unwrap();
    router.start_dialog(USER, CalcVariant::FlatRate).await.unwrap();

    let (session, history) = router.snapshot(USER).await;
    assert_eq!(session, Session::start(CalcVariant::FlatRate));
    assert_eq!(history.len(), 2);

    router.reset_history(USER).await;
    let (session, history) = router.snapshot(USER).await;
    assert!(history.is_empty());
    assert!(session.is_active());
}

#[tokio::test]
async fn test_timeout_is_a_model_error() {
    let provider = SlowProvider {
        delay: Duration::from_millis(200),
        ..SlowProvider::default()
    };
    let router = TurnRouter::new(
        provider,
        Arc::new(SessionStore::new(5)),
        RouterConfig::default().with_model_timeout(Duration::from_millis(10)),
    );

    let replies = router.route(USER, "долго?").await.unwrap();
    assert_eq!(replies[0].text, MODEL_FAILURE_TEXT);
    let (_, history) = router.snapshot(USER).await;
    assert_eq!(history, vec![HistoryEntry::user("долго?")]);
}

#[tokio::test]
async fn test_same_user_turns_are_serialized() {
    let provider = Arc::new(SlowProvider {
        delay: Duration::from_millis(30),
        ..SlowProvider::default()
    });
    let router = router(Arc::clone(&provider));

    let (a, b) = tokio::join!(router.route(USER, "один"), router.route(USER, "два"));
    a.unwrap();
    b.unwrap();
    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);

    let (_, history) = router.snapshot(USER).await;
    let roles: Vec<Role> = history.iter().map(|e| e.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn test_different_users_run_concurrently() {
    let provider = Arc::new(SlowProvider {
        delay: Duration::from_millis(50),
        ..SlowProvider::default()
    });
    let router = router(Arc::clone(&provider));

    let (a, b) = tokio::join!(
        router.route(UserKey(1), "один"),
        router.route(UserKey(2), "два")
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 2);
}
