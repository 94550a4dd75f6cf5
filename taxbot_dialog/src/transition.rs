//! Pure transition function of the calculator dialog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use taxbot_calc::{
    CalcError, CalcVariant, CalculationInput, EntityType, Report, TaxRates, Workforce, calculate,
};
use taxbot_core::{Choice, Reply};
use thiserror::Error;

use crate::parse::{InvalidInput, parse_amount, parse_employee_count, parse_entity_type};
use crate::render::render_report;
use crate::state::{DialogState, Event, Session};

pub const CANCELLED_TEXT: &str = "Расчёт отменён.";
const NOTHING_TO_CANCEL_TEXT: &str = "Сейчас нет активного расчёта.";
const REVENUE_PROMPT: &str = "Введите общую выручку (тг):";

/// Limits and rates the dialog works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Largest accepted employee count.
    pub max_employees: usize,
    /// Largest accepted salary or revenue.
    pub max_amount: Decimal,
    pub rates: TaxRates,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            max_employees: 1000,
            max_amount: Decimal::from(1_000_000_000_000_000_i64),
            rates: TaxRates::default(),
        }
    }
}

/// The session contradicts its own state. Always a bug in the caller or in
/// whatever stored the session, never something the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("text received while no dialog is active")]
    NoActiveDialog,

    #[error("{state:?} reached without {missing}")]
    MissingField {
        state: DialogState,
        missing: &'static str,
    },

    #[error("salary #{index} requested with {collected} of {expected} salaries collected")]
    SalaryOutOfSequence {
        index: usize,
        collected: usize,
        expected: usize,
    },

    #[error("salary requested in a flat-rate calculation")]
    SalaryInFlatRate,

    #[error("revenue requested with {collected} of {expected} salaries collected")]
    IncompleteSalaries { collected: usize, expected: usize },
}

/// Outcome of one event: the next session and what to tell the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub replies: Vec<Reply>,
    /// Set when this transition completed a calculation.
    pub report: Option<Report>,
}

impl Transition {
    fn to(session: Session, reply: Reply) -> Self {
        Self {
            session,
            replies: vec![reply],
            report: None,
        }
    }

    fn stay(session: &Session, reply: Reply) -> Self {
        Self::to(session.clone(), reply)
    }
}

fn entity_choices() -> Vec<Choice> {
    EntityType::ALL
        .iter()
        .map(|e| Choice::new(e.label(), e.label()))
        .collect()
}

fn start_reply(variant: CalcVariant) -> Reply {
    let text = match variant {
        CalcVariant::Detailed => "Налоговый калькулятор. Выберите тип бизнеса:",
        CalcVariant::FlatRate => {
            "Упрощённый расчёт: фиксированные взносы от МЗП. Выберите тип бизнеса:"
        }
    };
    Reply::text(text).with_choices(entity_choices())
}

fn salary_prompt(index: usize) -> Reply {
    Reply::text(format!("Введите зарплату сотрудника {index}:"))
}

fn count_correction(err: &InvalidInput) -> String {
    match err {
        InvalidInput::Negative => "Количество сотрудников не может быть отрицательным.".into(),
        InvalidInput::TooLarge { max } => format!("Слишком много сотрудников, максимум {max}."),
        _ => "Введите число сотрудников целым числом, например 3.".into(),
    }
}

fn amount_correction(err: &InvalidInput) -> &'static str {
    match err {
        InvalidInput::Negative | InvalidInput::NotPositive => "Сумма должна быть больше нуля.",
        InvalidInput::TooLarge { .. } => "Сумма слишком велика.",
        _ => "Не удалось распознать сумму.",
    }
}

/// Advance the dialog by one event.
///
/// Invalid user input never fails: the returned session equals the input
/// session and the reply explains what to type. `Err` means `session`
/// itself is inconsistent.
pub fn transition(
    session: &Session,
    event: Event,
    config: &DialogConfig,
) -> Result<Transition, StateError> {
    match (session.state, event) {
        // Re-entrant: a trigger always restarts from the beginning.
        (_, Event::Start(variant)) => Ok(Transition::to(
            Session::start(variant),
            start_reply(variant),
        )),

        (DialogState::Idle, Event::Cancel) => {
            Ok(Transition::stay(session, Reply::text(NOTHING_TO_CANCEL_TEXT)))
        }
        (_, Event::Cancel) => Ok(Transition::to(
            Session::default(),
            Reply::text(CANCELLED_TEXT).removing_choices(),
        )),

        (DialogState::Idle, Event::Text(_)) => Err(StateError::NoActiveDialog),
        (DialogState::AwaitingEntityType, Event::Text(text)) => {
            Ok(on_entity_type(session, &text))
        }
        (DialogState::AwaitingEmployeeCount, Event::Text(text)) => {
            on_employee_count(session, &text, config)
        }
        (DialogState::AwaitingSalary { index }, Event::Text(text)) => {
            on_salary(session, index, &text, config)
        }
        (DialogState::AwaitingRevenue, Event::Text(text)) => on_revenue(session, &text, config),
    }
}

fn on_entity_type(session: &Session, text: &str) -> Transition {
    match parse_entity_type(text) {
        Ok(entity_type) => {
            let next = Session {
                state: DialogState::AwaitingEmployeeCount,
                entity_type: Some(entity_type),
                ..session.clone()
            };
            Transition::to(
                next,
                Reply::text(format!(
                    "Вы выбрали: {entity_type}. Введите количество сотрудников:"
                ))
                .removing_choices(),
            )
        }
        Err(_) => Transition::stay(
            session,
            Reply::text("Выберите тип бизнеса: ИП или ТОО.").with_choices(entity_choices()),
        ),
    }
}

fn on_employee_count(
    session: &Session,
    text: &str,
    config: &DialogConfig,
) -> Result<Transition, StateError> {
    if session.entity_type.is_none() {
        return Err(StateError::MissingField {
            state: session.state,
            missing: "entity type",
        });
    }

    let count = match parse_employee_count(text, config.max_employees) {
        Ok(count) => count,
        Err(err) => {
            return Ok(Transition::stay(
                session,
                Reply::text(count_correction(&err)),
            ));
        }
    };

    let skip_salaries = count == 0 || session.variant == CalcVariant::FlatRate;
    let (state, reply) = if skip_salaries {
        (DialogState::AwaitingRevenue, Reply::text(REVENUE_PROMPT))
    } else {
        (DialogState::AwaitingSalary { index: 1 }, salary_prompt(1))
    };

    let next = Session {
        state,
        employee_count: Some(count),
        salaries: Vec::with_capacity(if skip_salaries { 0 } else { count }),
        ..session.clone()
    };
    Ok(Transition::to(next, reply))
}

fn on_salary(
    session: &Session,
    index: usize,
    text: &str,
    config: &DialogConfig,
) -> Result<Transition, StateError> {
    if session.variant == CalcVariant::FlatRate {
        return Err(StateError::SalaryInFlatRate);
    }
    let expected = session.employee_count.ok_or(StateError::MissingField {
        state: session.state,
        missing: "employee count",
    })?;
    let collected = session.salaries.len();
    if index == 0 || index > expected || collected != index - 1 {
        return Err(StateError::SalaryOutOfSequence {
            index,
            collected,
            expected,
        });
    }

    let salary = match parse_amount(text, config.max_amount) {
        Ok(salary) => salary,
        Err(err) => {
            return Ok(Transition::stay(
                session,
                Reply::text(format!(
                    "{} Введите зарплату сотрудника {index}:",
                    amount_correction(&err)
                )),
            ));
        }
    };

    let mut next = session.clone();
    next.salaries.push(salary);
    let reply = if index < expected {
        next.state = DialogState::AwaitingSalary { index: index + 1 };
        salary_prompt(index + 1)
    } else {
        next.state = DialogState::AwaitingRevenue;
        Reply::text(REVENUE_PROMPT)
    };
    Ok(Transition::to(next, reply))
}

fn on_revenue(
    session: &Session,
    text: &str,
    config: &DialogConfig,
) -> Result<Transition, StateError> {
    let entity_type = session.entity_type.ok_or(StateError::MissingField {
        state: session.state,
        missing: "entity type",
    })?;
    let expected = session.employee_count.ok_or(StateError::MissingField {
        state: session.state,
        missing: "employee count",
    })?;

    let workforce = match session.variant {
        CalcVariant::Detailed => {
            if session.salaries.len() != expected {
                return Err(StateError::IncompleteSalaries {
                    collected: session.salaries.len(),
                    expected,
                });
            }
            Workforce::Salaries(session.salaries.clone())
        }
        CalcVariant::FlatRate => Workforce::Headcount(expected),
    };

    let revenue = match parse_amount(text, config.max_amount) {
        Ok(revenue) => revenue,
        Err(err) => {
            return Ok(Transition::stay(
                session,
                Reply::text(format!("{} {REVENUE_PROMPT}", amount_correction(&err))),
            ));
        }
    };

    let input = CalculationInput {
        entity_type,
        revenue,
        workforce,
    };

    match calculate(&input, &config.rates) {
        Ok(report) => Ok(Transition {
            session: Session::default(),
            replies: vec![Reply::text(render_report(&report))],
            report: Some(report),
        }),
        Err(CalcError::Overflow(_) | CalcError::InvalidInput { .. }) => Ok(Transition::stay(
            session,
            Reply::text(format!(
                "Не удалось выполнить расчёт с такими суммами. {REVENUE_PROMPT}"
            )),
        )),
    }
}
