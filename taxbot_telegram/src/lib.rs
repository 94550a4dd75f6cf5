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

//! Telegram front-end for the accounting assistant.
//!
//! Text messages and button presses are turned into router calls; the
//! transport-neutral replies coming back are sent as Telegram messages with
//! inline keyboards.

mod bot;
mod command;
mod error;
mod handler;
mod keyboard;

pub use bot::{SharedRouter, TelegramBot};
pub use command::Command;
pub use error::{Error, Result};
pub use keyboard::MenuAction;
