//! Validation of user-typed values.

use rust_decimal::Decimal;
use std::str::FromStr;
use taxbot_calc::EntityType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("unknown entity type {0:?}")]
    UnknownEntityType(String),

    #[error("{0:?} is not a whole number")]
    NotAnInteger(String),

    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("value must not be negative")]
    Negative,

    #[error("value must be greater than zero")]
    NotPositive,

    #[error("value exceeds the maximum of {max}")]
    TooLarge { max: String },
}

const CURRENCY_SUFFIXES: [&str; 3] = ["тенге", "тг", "₸"];

/// Remove grouping characters and a trailing currency marker.
fn compact(text: &str) -> String {
    let mut text = text.trim().to_lowercase();
    for suffix in CURRENCY_SUFFIXES {
        if let Some(stripped) = text.strip_suffix(suffix) {
            text = stripped.to_string();
            break;
        }
    }
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '\'')
        .collect()
}

pub fn parse_entity_type(text: &str) -> Result<EntityType, InvalidInput> {
    let normalized = text.trim().to_lowercase();
    match normalized.as_str() {
        "ип" | "ip" | "индивидуальный предприниматель" | "sole proprietor" => {
            Ok(EntityType::SoleProprietor)
        }
        "тоо" | "too" | "llp" | "товарищество с ограниченной ответственностью" | "limited company" => {
            Ok(EntityType::LimitedCompany)
        }
        _ => Err(InvalidInput::UnknownEntityType(text.trim().to_string())),
    }
}

/// Parse a non-negative whole number of employees, at most `max`.
pub fn parse_employee_count(text: &str, max: usize) -> Result<usize, InvalidInput> {
    let compact = compact(text);

    let negative = compact
        .strip_prefix('-')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()));
    if negative {
        return Err(InvalidInput::Negative);
    }

    if compact.is_empty() || !compact.chars().all(|c| c.is_ascii_digit()) {
        return Err(InvalidInput::NotAnInteger(text.trim().to_string()));
    }

    let count = compact
        .parse::<usize>()
        .map_err(|_| InvalidInput::TooLarge {
            max: max.to_string(),
        })?;

    if count > max {
        return Err(InvalidInput::TooLarge {
            max: max.to_string(),
        });
    }

    Ok(count)
}

/// Parse a strictly positive monetary amount, at most `max`.
///
/// Accepts spaces, underscores and apostrophes as digit grouping, a trailing
/// "тг"/"₸", and `,` as either the decimal point (a single comma with no dot)
/// or digit grouping (otherwise).
pub fn parse_amount(text: &str, max: Decimal) -> Result<Decimal, InvalidInput> {
    let mut compact = compact(text);

    let commas = compact.matches(',').count();
    if commas == 1 && !compact.contains('.') {
        compact = compact.replace(',', ".");
    } else if commas > 0 {
        compact = compact.replace(',', "");
    }

    if compact.is_empty() {
        return Err(InvalidInput::NotANumber(text.trim().to_string()));
    }

    let value = Decimal::from_str(&compact)
        .map_err(|_| InvalidInput::NotANumber(text.trim().to_string()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(InvalidInput::Negative);
    }
    if value.is_zero() {
        return Err(InvalidInput::NotPositive);
    }
    if value > max {
        return Err(InvalidInput::TooLarge {
            max: max.to_string(),
        });
    }

    Ok(value)
}
