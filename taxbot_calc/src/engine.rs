use rust_decimal::Decimal;

use crate::report::{EmployeeBreakdown, FlatRateBreakdown, Report};
use crate::{CalcError, CalculationInput, EntityType, Field, TaxRates, Workforce};

fn mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, CalcError> {
    a.checked_mul(b).ok_or(CalcError::Overflow(what))
}

fn add(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, CalcError> {
    a.checked_add(b).ok_or(CalcError::Overflow(what))
}

fn sub(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, CalcError> {
    a.checked_sub(b).ok_or(CalcError::Overflow(what))
}

fn ensure_non_negative(field: Field, value: Decimal) -> Result<Decimal, CalcError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CalcError::InvalidInput { field, value });
    }
    Ok(value)
}

/// Tax on gross revenue.
pub fn business_tax(revenue: Decimal, rates: &TaxRates) -> Result<Decimal, CalcError> {
    let revenue = ensure_non_negative(Field::Revenue, revenue)?;
    mul(revenue, rates.business_tax, "business tax")
}

/// Employer- and employee-borne contributions for one gross salary.
///
/// `index` is the 1-based position of the employee and only labels the result.
/// Income tax follows the formula as is and goes negative for salaries below
/// the deduction.
pub fn employee_breakdown(
    index: usize,
    salary: Decimal,
    rates: &TaxRates,
) -> Result<EmployeeBreakdown, CalcError> {
    let salary = ensure_non_negative(Field::Salary(index), salary)?;

    let pension_employer = mul(salary, rates.pension_employer, "employer pension")?;
    let medical_employer = mul(salary, rates.medical_employer, "employer medical")?;
    let social_base = sub(
        salary,
        mul(salary, rates.pension, "social base")?,
        "social base",
    )?;
    let social_contribution = mul(social_base, rates.social_contribution, "social contribution")?;
    let employer_subtotal = add(
        add(pension_employer, medical_employer, "employer subtotal")?,
        social_contribution,
        "employer subtotal",
    )?;

    let pension = mul(salary, rates.pension, "pension")?;
    let medical_employee = mul(salary, rates.medical_employee, "employee medical")?;
    let taxable = sub(
        sub(
            sub(salary, pension, "taxable income")?,
            rates.deduction,
            "taxable income",
        )?,
        medical_employee,
        "taxable income",
    )?;
    let income_tax = mul(taxable, rates.income_tax, "income tax")?;
    let employee_subtotal = add(
        add(pension, income_tax, "employee subtotal")?,
        medical_employee,
        "employee subtotal",
    )?;
    let net_salary = sub(salary, employee_subtotal, "net salary")?;

    Ok(EmployeeBreakdown {
        index,
        salary,
        pension_employer,
        medical_employer,
        social_contribution,
        employer_subtotal,
        pension,
        medical_employee,
        income_tax,
        employee_subtotal,
        net_salary,
    })
}

/// Fixed per-head contributions off the minimum wage.
///
/// A sole proprietor pays for themselves as well, so the owner counts as one
/// extra head.
pub fn flat_rate_breakdown(
    entity_type: EntityType,
    headcount: usize,
    rates: &TaxRates,
) -> Result<FlatRateBreakdown, CalcError> {
    let heads = match entity_type {
        EntityType::SoleProprietor => headcount.saturating_add(1),
        EntityType::LimitedCompany => headcount,
    };
    let flat = &rates.flat_rate;

    let base = mul(rates.min_wage, flat.base_multiplier, "flat-rate base")?;
    let pension = mul(base, rates.pension, "flat-rate pension")?;
    let social_contribution = mul(
        sub(base, pension, "flat-rate social base")?,
        rates.social_contribution,
        "flat-rate social contribution",
    )?;
    let medical = mul(
        mul(
            rates.min_wage,
            flat.medical_base_multiplier,
            "flat-rate medical base",
        )?,
        flat.medical_rate,
        "flat-rate medical",
    )?;
    let per_head = add(
        add(pension, social_contribution, "flat-rate per head")?,
        medical,
        "flat-rate per head",
    )?;
    let total = mul(per_head, Decimal::from(heads), "flat-rate total")?;

    Ok(FlatRateBreakdown {
        heads,
        base,
        pension,
        social_contribution,
        medical,
        per_head,
        total,
    })
}

/// Produce the full report for one calculation run.
pub fn calculate(input: &CalculationInput, rates: &TaxRates) -> Result<Report, CalcError> {
    let business_tax = business_tax(input.revenue, rates)?;

    let mut employees = Vec::new();
    let mut flat_rate = None;
    let mut total_contributions = Decimal::ZERO;

    match &input.workforce {
        Workforce::Salaries(salaries) => {
            employees.reserve(salaries.len());
            for (i, salary) in salaries.iter().enumerate() {
                let breakdown = employee_breakdown(i + 1, *salary, rates)?;
                total_contributions = add(
                    total_contributions,
                    add(
                        breakdown.employer_subtotal,
                        breakdown.employee_subtotal,
                        "contributions",
                    )?,
                    "contributions",
                )?;
                employees.push(breakdown);
            }
        }
        Workforce::Headcount(count) => {
            let breakdown = flat_rate_breakdown(input.entity_type, *count, rates)?;
            total_contributions = breakdown.total;
            flat_rate = Some(breakdown);
        }
    }

    let grand_total = add(business_tax, total_contributions, "grand total")?;

    Ok(Report {
        entity_type: input.entity_type,
        variant: input.workforce.variant(),
        revenue: input.revenue,
        employee_count: input.workforce.employee_count(),
        business_tax,
        employees,
        flat_rate,
        total_contributions,
        grand_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CalcVariant;
    use proptest::prelude::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn detailed(entity_type: EntityType, salaries: Vec<Decimal>, revenue: Decimal) -> Report {
        let input = CalculationInput {
            entity_type,
            revenue,
            workforce: Workforce::Salaries(salaries),
        };
        calculate(&input, &TaxRates::default()).unwrap()
    }

    #[test]
    fn single_employee_limited_company() {
        let report = detailed(EntityType::LimitedCompany, vec![dec(200_000)], dec(1_000_000));

        assert_eq!(report.business_tax, dec(30_000));

        let e = &report.employees[0];
        assert_eq!(e.pension, dec(20_000));
        assert_eq!(e.medical_employee, dec(4_000));
        assert_eq!(e.income_tax, Decimal::new(120_952, 1));
        assert_eq!(e.employee_subtotal, Decimal::new(360_952, 1));
        assert_eq!(e.pension_employer, dec(5_000));
        assert_eq!(e.medical_employer, dec(6_000));
        assert_eq!(e.social_contribution, dec(9_000));
        assert_eq!(e.employer_subtotal, dec(20_000));
        assert_eq!(e.net_salary, Decimal::new(1_639_048, 1));

        assert_eq!(report.total_contributions, Decimal::new(560_952, 1));
        assert_eq!(report.grand_total, Decimal::new(860_952, 1));
        assert_eq!(report.variant, CalcVariant::Detailed);
    }

    #[test]
    fn no_employees_is_revenue_tax_only() {
        let report = detailed(EntityType::SoleProprietor, vec![], dec(500_000));
        assert!(report.employees.is_empty());
        assert_eq!(report.total_contributions, Decimal::ZERO);
        assert_eq!(report.grand_total, dec(15_000));
    }

    #[test]
    fn low_salary_income_tax_is_not_clamped() {
        let e = employee_breakdown(1, dec(50_000), &TaxRates::default()).unwrap();
        assert!(e.income_tax.is_sign_negative());
    }

    #[test]
    fn negative_revenue_is_rejected() {
        let err = business_tax(dec(-1), &TaxRates::default()).unwrap_err();
        assert_eq!(
            err,
            CalcError::InvalidInput {
                field: Field::Revenue,
                value: dec(-1)
            }
        );
    }

    #[test]
    fn negative_salary_names_the_employee() {
        let input = CalculationInput {
            entity_type: EntityType::LimitedCompany,
            revenue: dec(1),
            workforce: Workforce::Salaries(vec![dec(100), dec(-5)]),
        };
        let err = calculate(&input, &TaxRates::default()).unwrap_err();
        assert!(matches!(
            err,
            CalcError::InvalidInput {
                field: Field::Salary(2),
                ..
            }
        ));
    }

    #[test]
    fn overflow_is_an_error_not_a_panic() {
        let input = CalculationInput {
            entity_type: EntityType::LimitedCompany,
            revenue: dec(1),
            workforce: Workforce::Salaries(vec![Decimal::MAX; 4]),
        };
        let err = calculate(&input, &TaxRates::default()).unwrap_err();
        assert!(matches!(err, CalcError::Overflow(_)));
    }

    #[test]
    fn flat_rate_counts_owner_of_sole_proprietorship() {
        let rates = TaxRates::default();
        let ip = flat_rate_breakdown(EntityType::SoleProprietor, 2, &rates).unwrap();
        let too = flat_rate_breakdown(EntityType::LimitedCompany, 2, &rates).unwrap();
        assert_eq!(ip.heads, 3);
        assert_eq!(too.heads, 2);

        // 85000 * 0.10, (85000 - 8500) * 0.05, 85000 * 1.4 * 0.05
        assert_eq!(ip.pension, dec(8_500));
        assert_eq!(ip.social_contribution, dec(3_825));
        assert_eq!(ip.medical, dec(5_950));
        assert_eq!(ip.per_head, dec(18_275));
        assert_eq!(ip.total, dec(54_825));
    }

    #[test]
    fn flat_rate_report_uses_headcount() {
        let input = CalculationInput {
            entity_type: EntityType::LimitedCompany,
            revenue: dec(1_000_000),
            workforce: Workforce::Headcount(1),
        };
        let report = calculate(&input, &TaxRates::default()).unwrap();
        assert_eq!(report.variant, CalcVariant::FlatRate);
        assert!(report.employees.is_empty());
        assert_eq!(report.employee_count, 1);
        assert_eq!(report.grand_total, dec(48_275));
    }

    #[test]
    fn rerun_yields_identical_report() {
        let salaries = vec![dec(150_000), Decimal::new(3_123_456, 2)];
        let first = detailed(EntityType::LimitedCompany, salaries.clone(), dec(777_777));
        let second = detailed(EntityType::LimitedCompany, salaries, dec(777_777));
        assert_eq!(first, second);
        assert_eq!(first.lines(), second.lines());
    }

    proptest! {
        #[test]
        fn grand_total_is_tax_plus_all_subtotals(
            salaries in proptest::collection::vec(1_i64..100_000_000, 0..20),
            revenue in 1_i64..10_000_000_000,
        ) {
            let salaries: Vec<Decimal> = salaries.into_iter().map(|c| Decimal::new(c, 2)).collect();
            let revenue = Decimal::new(revenue, 2);
            let report = detailed(EntityType::LimitedCompany, salaries.clone(), revenue);

            let contributions: Decimal = report
                .employees
                .iter()
                .map(|e| e.employer_subtotal + e.employee_subtotal)
                .sum();

            prop_assert_eq!(report.employees.len(), salaries.len());
            prop_assert_eq!(report.business_tax, revenue * Decimal::new(3, 2));
            prop_assert_eq!(report.grand_total, report.business_tax + contributions);
        }
    }
}
