use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Input field a [`CalcError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Revenue,
    /// 1-based employee position.
    Salary(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revenue => f.write_str("revenue"),
            Self::Salary(index) => write!(f, "salary #{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("invalid {field}: {value} must not be negative")]
    InvalidInput { field: Field, value: Decimal },

    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}
