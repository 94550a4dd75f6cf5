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

//! Configuration loaded from `~/taxbot/config.json`.
//!
//! Every field has a default; `TELEGRAM_TOKEN` and `GEMINI_API_KEY` from the
//! environment override the secrets in the file.

mod schema;

pub use schema::{
    Config, ConversationSettings, ProviderConfig, ProviderKind, ProvidersConfig, TelegramConfig,
};
