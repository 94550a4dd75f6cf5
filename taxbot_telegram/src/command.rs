use teloxide::types::BotCommand;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    Calc,
    Flat,
    /// Any other `/word`; never treated as a question.
    Unknown,
}

impl Command {
    fn all() -> Vec<BotCommand> {
        [
            ("start", "Главное меню"),
            ("calc", "Налоговый калькулятор"),
            ("flat", "Упрощённый расчёт взносов"),
            ("cancel", "Отменить расчёт"),
            ("help", "Помощь"),
        ]
        .into_iter()
        .map(|(command, description)| BotCommand::new(command, description))
        .collect()
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    /// Recognize a command, with or without a `@bot_name` suffix.
    ///
    /// Text starting with `/` is always a command, known or not.
    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        let word = text.split_whitespace().next()?;
        let word = word.split('@').next().unwrap_or(word);

        match word {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/cancel" => Some(Self::Cancel),
            "/calc" => Some(Self::Calc),
            "/flat" => Some(Self::Flat),
            _ if word.starts_with('/') => Some(Self::Unknown),
            _ => None,
        }
    }

    #[must_use]
    pub const fn welcome_text() -> &'static str {
        "Привет! Готов помочь с бухгалтерией твоего ИП или ТОО в Казахстане. Выбирай из меню:"
    }

    #[must_use]
    pub const fn unknown_text() -> &'static str {
        "Неизвестная команда."
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        "Напиши свой вопрос, и я постараюсь помочь. Это чат с Gemini.

Команды:
/start  - главное меню
/calc   - налоговый калькулятор
/flat   - упрощённый расчёт взносов
/cancel - отменить расчёт
/help   - эта справка"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse_from_text("/start"), Some(Command::Start));
        assert_eq!(Command::parse_from_text(" /CALC "), Some(Command::Calc));
        assert_eq!(
            Command::parse_from_text("/cancel@tax_helper_bot"),
            Some(Command::Cancel)
        );
        assert_eq!(Command::parse_from_text("/flat please"), Some(Command::Flat));
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(Command::parse_from_text("Что такое ОПВ?"), None);
        assert_eq!(Command::parse_from_text("200 000 / 2"), None);
        assert_eq!(Command::parse_from_text(""), None);
    }

    #[test]
    fn test_unknown_slash_command_stays_out_of_questions() {
        assert_eq!(Command::parse_from_text("/reset"), Some(Command::Unknown));
        assert_eq!(
            Command::parse_from_text("/foo@tax_helper_bot bar"),
            Some(Command::Unknown)
        );
    }

    #[test]
    fn test_every_command_is_registered() {
        let names: Vec<_> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(names, ["start", "calc", "flat", "cancel", "help"]);
    }
}
