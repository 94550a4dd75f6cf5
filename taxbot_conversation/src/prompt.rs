//! Prompt construction for free-form questions.

use serde::{Deserialize, Serialize};

/// Default accountant persona. `{history}` and `{user_question}` are filled in
/// per turn.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
Ты — дружелюбный и компетентный бухгалтер в онлайн-приложении для ИП и ТОО в Казахстане. \
Отвечай по делу, по-человечески.

Контекст диалога:
{history}

Новый вопрос пользователя: {user_question}

Ответь только если вопрос связан с бухгалтерией, налогами, отчётами или финансами в Казахстане. \
Если вопрос не по теме — вежливо откажись.
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    #[must_use]
    pub fn render(&self, history: &str, user_question: &str) -> String {
        self.0
            .replace("{history}", history)
            .replace("{user_question}", user_question)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TEMPLATE)
    }
}
