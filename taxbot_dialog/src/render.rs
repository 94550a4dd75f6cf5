//! Plain-text presentation of a calculation report.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;
use taxbot_calc::Report;

/// Whole currency units, half rounded away from zero, `,` between thousands.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return "0".to_string();
    }

    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn money(amount: Decimal) -> String {
    format!("{} тг", format_amount(amount))
}

/// Render a report the way the bot shows it to the user.
#[must_use]
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Тип бизнеса: {}", report.entity_type);
    let _ = writeln!(out, "Выручка: {}", money(report.revenue));
    let _ = writeln!(out, "Сотрудников: {}", report.employee_count);
    let _ = writeln!(out, "\nНалог с выручки: {}", money(report.business_tax));

    for e in &report.employees {
        let _ = write!(
            out,
            "\nСотрудник {}:\n\
             За счёт работодателя\n \
             ОПВР: {}\n \
             ООСМС: {}\n \
             СО: {}\n\
             Всего за счёт работодателя: {}\n\
             За счёт сотрудника\n \
             ОПВ: {}\n \
             ИПН: {}\n \
             ВОСМС: {}\n\
             Всего за счёт сотрудника: {}\n\
             Зарплата на руки: {}\n",
            e.index,
            format_amount(e.pension_employer),
            format_amount(e.medical_employer),
            format_amount(e.social_contribution),
            money(e.employer_subtotal),
            format_amount(e.pension),
            format_amount(e.income_tax),
            format_amount(e.medical_employee),
            money(e.employee_subtotal),
            money(e.net_salary),
        );
    }

    if let Some(flat) = &report.flat_rate {
        let _ = write!(
            out,
            "\nФиксированные взносы (база {}):\n \
             ОПВ: {}\n \
             СО: {}\n \
             ВОСМС: {}\n\
             С одного человека: {}\n\
             Взносы за {} чел.: {}\n",
            money(flat.base),
            format_amount(flat.pension),
            format_amount(flat.social_contribution),
            format_amount(flat.medical),
            money(flat.per_head),
            flat.heads,
            money(flat.total),
        );
    }

    let _ = write!(out, "\nИтого к оплате: {}", money(report.grand_total));
    out
}
