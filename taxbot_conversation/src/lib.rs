#![warn(
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

//! Per-user conversation handling.
//!
//! Every incoming text turn goes through [`TurnRouter::route`]:
//! - while the calculator dialog is active, the text drives the dialog;
//! - otherwise it becomes a free-form question for the language model, with
//!   the last few turns of history embedded in the prompt.
//!
//! # Key Features
//! - Bounded FIFO history window per user
//! - Per-user serialization of turns through [`SessionStore`]
//! - Bounded model call with a fixed apology on failure

mod history;
mod prompt;
mod router;
mod store;

pub use history::{DEFAULT_HISTORY_LIMIT, HistoryBuffer};
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, PromptTemplate};
pub use router::{MODEL_FAILURE_TEXT, RouterConfig, RouterError, TurnRouter};
pub use store::{SessionStore, UserState};
