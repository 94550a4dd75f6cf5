use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statutory rates and constants.
///
/// Defaults are the Kazakhstan figures the bot was built around. None of them
/// are tied to a tax year, so deployments override them through config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxRates {
    /// Simplified-declaration tax on revenue.
    pub business_tax: Decimal,
    /// ОПВР, employer pension contribution.
    pub pension_employer: Decimal,
    /// ООСМС, employer medical insurance.
    pub medical_employer: Decimal,
    /// СО, social contribution on salary net of pension.
    pub social_contribution: Decimal,
    /// ОПВ, employee pension contribution.
    pub pension: Decimal,
    /// ВОСМС, employee medical insurance.
    pub medical_employee: Decimal,
    /// ИПН, individual income tax.
    pub income_tax: Decimal,
    /// Fixed monthly deduction subtracted before income tax.
    pub deduction: Decimal,
    /// МЗП, minimum monthly wage.
    pub min_wage: Decimal,
    pub flat_rate: FlatRateRates,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            business_tax: Decimal::new(3, 2),
            pension_employer: Decimal::new(25, 3),
            medical_employer: Decimal::new(3, 2),
            social_contribution: Decimal::new(5, 2),
            pension: Decimal::new(10, 2),
            medical_employee: Decimal::new(2, 2),
            income_tax: Decimal::new(10, 2),
            deduction: Decimal::new(55_048, 0),
            min_wage: Decimal::new(85_000, 0),
            flat_rate: FlatRateRates::default(),
        }
    }
}

/// Multipliers for the flat-rate variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatRateRates {
    /// Contribution base as a multiple of the minimum wage.
    pub base_multiplier: Decimal,
    /// Medical insurance base as a multiple of the minimum wage.
    pub medical_base_multiplier: Decimal,
    pub medical_rate: Decimal,
}

impl Default for FlatRateRates {
    fn default() -> Self {
        Self {
            base_multiplier: Decimal::ONE,
            medical_base_multiplier: Decimal::new(14, 1),
            medical_rate: Decimal::new(5, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let rates: TaxRates = serde_json::from_str(r#"{"deduction": "60000"}"#).unwrap();
        assert_eq!(rates.deduction, Decimal::new(60_000, 0));
        assert_eq!(rates.min_wage, Decimal::new(85_000, 0));
        assert_eq!(rates.flat_rate, FlatRateRates::default());
    }

    #[test]
    fn numeric_rates_deserialize() {
        let rates: TaxRates = serde_json::from_str(r#"{"business_tax": 0.04}"#).unwrap();
        assert_eq!(rates.business_tax, Decimal::new(4, 2));
    }
}
