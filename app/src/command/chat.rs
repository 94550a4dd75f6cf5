//! Console front-end over the same turn router the Telegram bot uses.

use std::io::Write;
use taxbot_calc::CalcVariant;
use taxbot_conversation::TurnRouter;
use taxbot_core::{Choices, LLMProvider, Reply, UserKey};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::build_router;
use taxbot_config::Config;

/// The terminal is a single user.
const CONSOLE_USER: UserKey = UserKey(0);

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleCommand {
    Calc(CalcVariant),
    Cancel,
    Reset,
    Exit,
}

impl ConsoleCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "/calc" => Some(Self::Calc(CalcVariant::Detailed)),
            "/flat" => Some(Self::Calc(CalcVariant::FlatRate)),
            "/cancel" => Some(Self::Cancel),
            "/reset" => Some(Self::Reset),
            "exit" | "quit" | "q" => Some(Self::Exit),
            _ => None,
        }
    }
}

fn render_reply(reply: &Reply) -> String {
    match &reply.choices {
        Choices::Offer(choices) => {
            let buttons = choices
                .iter()
                .map(|c| format!("[{}]", c.label))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}\n{buttons}", reply.text)
        }
        Choices::Keep | Choices::Remove => reply.text.clone(),
    }
}

fn print_replies(replies: &[Reply]) {
    for reply in replies {
        println!("\n{}\n", render_reply(reply));
    }
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl ChatStrategy {
    async fn run_interactive<P: LLMProvider>(router: &TurnRouter<P>) -> anyhow::Result<()> {
        println!("=== Бухгалтерский помощник ===");
        println!("/calc - налоговый калькулятор, /flat - упрощённый расчёт,");
        println!("/cancel - отменить расчёт, /reset - очистить историю, exit - выход.\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let replies = match ConsoleCommand::parse(&line) {
                Some(ConsoleCommand::Exit) => break,
                Some(ConsoleCommand::Calc(variant)) => {
                    router.start_dialog(CONSOLE_USER, variant).await
                }
                Some(ConsoleCommand::Cancel) => router.cancel(CONSOLE_USER).await,
                Some(ConsoleCommand::Reset) => {
                    router.reset_history(CONSOLE_USER).await;
                    println!("История очищена.\n");
                    continue;
                }
                None => router.route(CONSOLE_USER, &line).await,
            };

            match replies {
                Ok(replies) => print_replies(&replies),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        let (_, history) = router.snapshot(CONSOLE_USER).await;
        info!("Console session ended with {} history entries", history.len());
        Ok(())
    }
}

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let router = build_router(&config)?;

        if let Some(msg) = input.message {
            let replies = router.route(CONSOLE_USER, &msg).await?;
            print_replies(&replies);
        } else {
            Self::run_interactive(&router).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxbot_core::Choice;

    #[test]
    fn test_console_commands() {
        assert_eq!(
            ConsoleCommand::parse("/flat"),
            Some(ConsoleCommand::Calc(CalcVariant::FlatRate))
        );
        assert_eq!(ConsoleCommand::parse(" exit "), Some(ConsoleCommand::Exit));
        assert_eq!(ConsoleCommand::parse("Сколько платить ИПН?"), None);
    }

    #[test]
    fn test_offered_choices_are_listed() {
        let reply = Reply::text("Выберите тип бизнеса:")
            .with_choices(vec![Choice::new("ИП", "ИП"), Choice::new("ТОО", "ТОО")]);
        assert_eq!(render_reply(&reply), "Выберите тип бизнеса:\n[ИП] [ТОО]");
    }
}
