#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Tax and payroll contribution calculator.
//!
//! Everything in this crate is a pure function of its inputs and a
//! [`TaxRates`] table. Amounts are [`Decimal`] and are never rounded here;
//! rounding belongs to whoever formats the [`Report`].
//!
//! Two variants exist:
//! - **Detailed**: contributions from each employee's actual gross salary.
//! - **Flat-rate**: fixed contributions per head derived from the minimum
//!   wage, for when no salary detail was collected.
//!
//! The variant is carried by [`Workforce`], so a single report can never mix
//! the two.

mod engine;
mod error;
mod rates;
mod report;

pub use engine::{business_tax, calculate, employee_breakdown, flat_rate_breakdown};
pub use error::{CalcError, Field};
pub use rates::{FlatRateRates, TaxRates};
pub use report::{EmployeeBreakdown, FlatRateBreakdown, Report, ReportLine};
pub use rust_decimal::Decimal;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Legal form of the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// Индивидуальный предприниматель (ИП).
    SoleProprietor,
    /// Товарищество с ограниченной ответственностью (ТОО).
    LimitedCompany,
}

impl EntityType {
    pub const ALL: [Self; 2] = [Self::SoleProprietor, Self::LimitedCompany];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SoleProprietor => "ИП",
            Self::LimitedCompany => "ТОО",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which contribution formula a calculation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CalcVariant {
    #[default]
    Detailed,
    FlatRate,
}

/// Staff information, shaped by the calculation variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workforce {
    /// Gross monthly salary of every employee, in order.
    Salaries(Vec<Decimal>),
    /// Number of employees only.
    Headcount(usize),
}

impl Workforce {
    #[must_use]
    pub const fn variant(&self) -> CalcVariant {
        match self {
            Self::Salaries(_) => CalcVariant::Detailed,
            Self::Headcount(_) => CalcVariant::FlatRate,
        }
    }

    #[must_use]
    pub fn employee_count(&self) -> usize {
        match self {
            Self::Salaries(salaries) => salaries.len(),
            Self::Headcount(count) => *count,
        }
    }
}

/// Everything the engine needs for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationInput {
    pub entity_type: EntityType,
    pub revenue: Decimal,
    pub workforce: Workforce,
}
