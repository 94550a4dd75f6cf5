use crate::keyboard::{self, MenuAction};
use crate::{Command, Result, TelegramBot};
use taxbot_calc::CalcVariant;
use taxbot_conversation::{MODEL_FAILURE_TEXT, RouterError};
use taxbot_core::{Reply, UserKey};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatAction, ChatId, Message},
};
use tracing::{debug, error, info, warn};

fn username(user: Option<&teloxide::types::User>) -> &str {
    user.and_then(|u| u.username.as_deref()).unwrap_or("unknown")
}

/// Send router replies, or the generic apology if the turn failed.
async fn deliver(
    bot: &TelegramBot,
    chat_id: ChatId,
    replies: std::result::Result<Vec<Reply>, RouterError>,
) -> Result<()> {
    match replies {
        Ok(replies) => bot.send_replies(chat_id, replies).await,
        Err(e) => {
            error!("Turn failed in chat {}: {e}", chat_id.0);
            bot.bot.send_message(chat_id, MODEL_FAILURE_TEXT).await?;
            Ok(())
        }
    }
}

async fn start_calculator(
    bot: &TelegramBot,
    chat_id: ChatId,
    user: UserKey,
    variant: CalcVariant,
) -> Result<()> {
    let replies = bot.router.start_dialog(user, variant).await;
    deliver(bot, chat_id, replies).await
}

/// Handle bot commands
pub async fn handle_command(
    bot: TelegramBot,
    msg: Message,
    user: UserKey,
    cmd: Command,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let name = username(msg.from.as_ref());
    info!("[@{name}] Command: {cmd:?}");

    match cmd {
        Command::Start => {
            bot.router.reset(user).await;
            bot.bot
                .send_message(chat_id, Command::welcome_text())
                .reply_markup(keyboard::main_menu())
                .await?;
        }
        Command::Help => {
            bot.bot.send_message(chat_id, Command::help_text()).await?;
        }
        Command::Cancel => {
            let replies = bot.router.cancel(user).await;
            deliver(&bot, chat_id, replies).await?;
        }
        Command::Calc => start_calculator(&bot, chat_id, user, CalcVariant::Detailed).await?,
        Command::Flat => start_calculator(&bot, chat_id, user, CalcVariant::FlatRate).await?,
        Command::Unknown => {
            let text = format!("{}\n\n{}", Command::unknown_text(), Command::help_text());
            bot.bot.send_message(chat_id, text).await?;
        }
    }

    Ok(())
}

/// Handle any message (commands or regular text)
pub async fn handle_message(bot: TelegramBot, msg: Message) -> Result<()> {
    let chat_id = msg.chat.id;
    bot.authorize(chat_id)?;

    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message in chat {}", chat_id.0);
        return Ok(());
    };
    let Some(user) = msg.from.as_ref().map(|u| UserKey(u.id.0)) else {
        debug!("Ignoring message without sender in chat {}", chat_id.0);
        return Ok(());
    };

    if let Some(cmd) = Command::parse_from_text(text) {
        return handle_command(bot, msg, user, cmd).await;
    }

    info!("[@{}] Message: {text}", username(msg.from.as_ref()));

    bot.bot.send_chat_action(chat_id, ChatAction::Typing).await?;

    let replies = bot.router.route(user, text).await;
    deliver(&bot, chat_id, replies).await
}

/// Handle inline keyboard presses.
///
/// Menu buttons edit the menu message in place; dialog choices are routed
/// as if the user had typed the button's value.
pub async fn handle_callback(bot: TelegramBot, query: CallbackQuery) -> Result<()> {
    let Some(message) = query.regular_message() else {
        debug!("Callback without an accessible message, ignoring");
        return Ok(());
    };
    let chat_id = message.chat.id;
    bot.authorize(chat_id)?;

    bot.bot.answer_callback_query(query.id.clone()).await?;

    let user = UserKey(query.from.id.0);
    let data = query.data.as_deref().unwrap_or_default();
    let Some(action) = MenuAction::parse(data) else {
        warn!("[@{}] Unknown callback data: {data}", username(Some(&query.from)));
        return Ok(());
    };
    info!("[@{}] Button: {action:?}", username(Some(&query.from)));

    match action {
        MenuAction::Calculators => {
            bot.bot
                .edit_message_text(chat_id, message.id, "Выберите калькулятор:")
                .reply_markup(keyboard::calculators_menu())
                .await?;
        }
        MenuAction::BackToMain => {
            bot.bot
                .edit_message_text(chat_id, message.id, "Главное меню:")
                .reply_markup(keyboard::main_menu())
                .await?;
        }
        MenuAction::Help => {
            bot.bot
                .edit_message_text(chat_id, message.id, Command::help_text())
                .await?;
        }
        MenuAction::Calculator(variant) => {
            bot.strip_choices(chat_id, Some(message.id)).await;
            start_calculator(&bot, chat_id, user, variant).await?;
        }
        MenuAction::Choice(value) => {
            bot.strip_choices(chat_id, Some(message.id)).await;
            let replies = bot.router.route(user, &value).await;
            deliver(&bot, chat_id, replies).await?;
        }
    }

    Ok(())
}
