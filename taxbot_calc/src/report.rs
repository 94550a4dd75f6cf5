use rust_decimal::Decimal;

use crate::{CalcVariant, EntityType};

/// Contributions for one employee under the detailed variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeBreakdown {
    /// 1-based position in the salary list.
    pub index: usize,
    pub salary: Decimal,
    // Employer-borne
    pub pension_employer: Decimal,
    pub medical_employer: Decimal,
    pub social_contribution: Decimal,
    pub employer_subtotal: Decimal,
    // Employee-borne
    pub pension: Decimal,
    pub medical_employee: Decimal,
    pub income_tax: Decimal,
    pub employee_subtotal: Decimal,
    pub net_salary: Decimal,
}

/// Per-head contributions under the flat-rate variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRateBreakdown {
    pub heads: usize,
    pub base: Decimal,
    pub pension: Decimal,
    pub social_contribution: Decimal,
    pub medical: Decimal,
    pub per_head: Decimal,
    pub total: Decimal,
}

/// A labeled monetary amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub label: String,
    pub amount: Decimal,
}

impl ReportLine {
    fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Result of one calculation run. Never stored, always recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub entity_type: EntityType,
    pub variant: CalcVariant,
    pub revenue: Decimal,
    pub employee_count: usize,
    pub business_tax: Decimal,
    /// Empty for the flat-rate variant.
    pub employees: Vec<EmployeeBreakdown>,
    /// Present only for the flat-rate variant.
    pub flat_rate: Option<FlatRateBreakdown>,
    pub total_contributions: Decimal,
    pub grand_total: Decimal,
}

impl Report {
    /// Monetary lines in presentation order, excluding the grand total.
    #[must_use]
    pub fn lines(&self) -> Vec<ReportLine> {
        let mut lines = vec![ReportLine::new("Налог с выручки", self.business_tax)];

        for e in &self.employees {
            let i = e.index;
            lines.extend([
                ReportLine::new(format!("Сотрудник {i}: ОПВР"), e.pension_employer),
                ReportLine::new(format!("Сотрудник {i}: ООСМС"), e.medical_employer),
                ReportLine::new(format!("Сотрудник {i}: СО"), e.social_contribution),
                ReportLine::new(
                    format!("Сотрудник {i}: всего за счёт работодателя"),
                    e.employer_subtotal,
                ),
                ReportLine::new(format!("Сотрудник {i}: ОПВ"), e.pension),
                ReportLine::new(format!("Сотрудник {i}: ИПН"), e.income_tax),
                ReportLine::new(format!("Сотрудник {i}: ВОСМС"), e.medical_employee),
                ReportLine::new(
                    format!("Сотрудник {i}: всего за счёт сотрудника"),
                    e.employee_subtotal,
                ),
                ReportLine::new(format!("Сотрудник {i}: зарплата на руки"), e.net_salary),
            ]);
        }

        if let Some(flat) = &self.flat_rate {
            lines.extend([
                ReportLine::new("ОПВ с человека", flat.pension),
                ReportLine::new("СО с человека", flat.social_contribution),
                ReportLine::new("ВОСМС с человека", flat.medical),
                ReportLine::new("Взносы с человека", flat.per_head),
                ReportLine::new(format!("Взносы за {} чел.", flat.heads), flat.total),
            ]);
        }

        lines.push(ReportLine::new("Всего взносов", self.total_contributions));
        lines
    }
}
