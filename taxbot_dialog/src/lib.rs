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

//! Guided data-collection dialog for the tax calculator.
//!
//! The dialog is a pure state machine: [`transition`] takes the current
//! [`Session`] and an [`Event`] and returns the next session together with the
//! replies to send. Nothing here performs I/O; the caller owns storage and
//! delivery.

mod parse;
mod render;
mod state;
mod transition;

pub use parse::{InvalidInput, parse_amount, parse_employee_count, parse_entity_type};
pub use render::{format_amount, render_report};
pub use state::{DialogState, Event, Session};
pub use transition::{CANCELLED_TEXT, DialogConfig, StateError, Transition, transition};
