use taxbot_calc::CalcVariant;
use taxbot_core::Choice;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

const CALCULATORS: &str = "calculators";
const HELP: &str = "help";
const BACK_TO_MAIN: &str = "back_to_main";
const TAX_CALC: &str = "tax_calc";
const FLAT_CALC: &str = "flat_calc";
/// Prefix of buttons that answer a dialog question.
const CHOICE_PREFIX: &str = "choice:";

/// What a pressed inline button asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Calculators,
    Help,
    BackToMain,
    Calculator(CalcVariant),
    /// Answer to the current dialog question, routed like typed text.
    Choice(String),
}

impl MenuAction {
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(value) = data.strip_prefix(CHOICE_PREFIX) {
            return Some(Self::Choice(value.to_string()));
        }
        match data {
            CALCULATORS => Some(Self::Calculators),
            HELP => Some(Self::Help),
            BACK_TO_MAIN => Some(Self::BackToMain),
            TAX_CALC => Some(Self::Calculator(CalcVariant::Detailed)),
            FLAT_CALC => Some(Self::Calculator(CalcVariant::FlatRate)),
            _ => None,
        }
    }
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [InlineKeyboardButton::callback(
            "Финансовые калькуляторы",
            CALCULATORS,
        )],
        [InlineKeyboardButton::callback("Помощь", HELP)],
    ])
}

pub fn calculators_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [InlineKeyboardButton::callback(
            "Налоговый калькулятор",
            TAX_CALC,
        )],
        [InlineKeyboardButton::callback("Упрощённый расчёт", FLAT_CALC)],
        [InlineKeyboardButton::callback("Назад", BACK_TO_MAIN)],
    ])
}

/// One row with a button per choice.
pub fn choices_markup(choices: &[Choice]) -> InlineKeyboardMarkup {
    let row: Vec<_> = choices
        .iter()
        .map(|c| {
            InlineKeyboardButton::callback(c.label.clone(), format!("{CHOICE_PREFIX}{}", c.value))
        })
        .collect();
    InlineKeyboardMarkup::new([row])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_menu_buttons_parse_back() {
        for markup in [main_menu(), calculators_menu()] {
            for data in callback_data(&markup) {
                assert!(MenuAction::parse(&data).is_some(), "{data}");
            }
        }
    }

    #[test]
    fn test_calculators_menu_offers_both_variants() {
        let actions: Vec<_> = callback_data(&calculators_menu())
            .iter()
            .filter_map(|d| MenuAction::parse(d))
            .collect();
        assert_eq!(
            actions,
            [
                MenuAction::Calculator(CalcVariant::Detailed),
                MenuAction::Calculator(CalcVariant::FlatRate),
                MenuAction::BackToMain,
            ]
        );
    }

    #[test]
    fn test_choice_buttons_carry_value() {
        let markup = choices_markup(&[Choice::new("ИП", "ИП"), Choice::new("ТОО", "ТОО")]);
        assert_eq!(markup.inline_keyboard.len(), 1);

        let actions: Vec<_> = callback_data(&markup)
            .iter()
            .filter_map(|d| MenuAction::parse(d))
            .collect();
        assert_eq!(
            actions,
            [
                MenuAction::Choice("ИП".to_string()),
                MenuAction::Choice("ТОО".to_string())
            ]
        );
    }

    #[test]
    fn test_unknown_data_is_ignored() {
        assert_eq!(MenuAction::parse("tax_calc_ip"), None);
        assert_eq!(MenuAction::parse(""), None);
    }
}
