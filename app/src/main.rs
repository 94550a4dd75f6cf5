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

mod command;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, InitStrategy, TelegramInput, TelegramStrategy,
    VersionStrategy,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "taxbot")]
#[command(about = "Accounting assistant for sole proprietors and LLPs in Kazakhstan", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot
    Telegram {
        /// Bot token (overrides config and TELEGRAM_TOKEN)
        #[arg(short, long)]
        token: Option<String>,

        /// Allowed chat IDs, comma separated (overrides config)
        #[arg(short, long, value_delimiter = ',')]
        allow_from: Option<Vec<String>>,
    },
    /// Chat with the assistant in the terminal
    Chat {
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Telegram { token, allow_from } => {
            TelegramStrategy
                .execute(TelegramInput { token, allow_from })
                .await
        }
        Commands::Chat { message } => ChatStrategy.execute(ChatInput { message }).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
