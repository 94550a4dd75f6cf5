use rust_decimal::Decimal;
use taxbot_calc::{CalcVariant, EntityType};

/// Where the user is in the guided flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingEntityType,
    AwaitingEmployeeCount,
    /// Waiting for the salary of the `index`-th employee (1-based).
    AwaitingSalary { index: usize },
    AwaitingRevenue,
}

/// Input to the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Menu trigger: (re)start the calculator.
    Start(CalcVariant),
    /// Free text typed by the user, or a pressed choice.
    Text(String),
    Cancel,
}

/// Calculation state collected so far for one user.
///
/// Fields fill in the order the dialog asks for them. [`crate::transition`]
/// checks that they agree with `state` before acting on them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: DialogState,
    pub variant: CalcVariant,
    pub entity_type: Option<EntityType>,
    pub employee_count: Option<usize>,
    pub salaries: Vec<Decimal>,
    pub revenue: Option<Decimal>,
}

impl Session {
    /// A fresh run of the calculator, waiting for the entity type.
    #[must_use]
    pub fn start(variant: CalcVariant) -> Self {
        Self {
            state: DialogState::AwaitingEntityType,
            variant,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, DialogState::Idle)
    }
}
