use std::sync::Arc;
use std::time::Duration;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId, MessageId},
    utils::command::BotCommands,
};

use crate::errors::HandlerResult;
use crate::settings::BotState;

pub mod admin;
pub mod autorename;
pub mod files;
pub mod inputs;
pub mod premium;
pub mod settings_panel;
pub mod start;
pub mod tokens;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands")]
pub enum Command {
    #[command(description = "start the bot, or redeem a token link")]
    Start(String),
    #[command(description = "show the command list")]
    Help,
    #[command(description = "open the settings panel")]
    Settings,
    #[command(description = "rename the replied file: /rename <new name>")]
    Rename(String),
    #[command(description = "show auto-rename status")]
    Autorename,
    #[command(description = "inspect the replied file's name")]
    Analyze,
    #[command(description = "about batch renaming")]
    Batchrename,
    #[command(description = "generate a token redemption link")]
    Gentoken,
    #[command(description = "token balance and premium status")]
    Token,
    #[command(hide)]
    Mytokens,
    #[command(hide)]
    Bal,
    #[command(description = "support the project")]
    Donate,
    #[command(description = "premium info")]
    Premium,
    #[command(description = "premium plans")]
    Plan,
    #[command(description = "submit a payment screenshot")]
    Bought,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Admin commands")]
pub enum AdminCommand {
    #[command(parse_with = "split", description = "/add_token <amount> <@user|id>")]
    AddToken { amount: i64, user: String },
    #[command(parse_with = "split", description = "/remove_token <amount> <@user|id>")]
    RemoveToken { amount: i64, user: String },
    #[command(parse_with = "split", description = "/add_premium <@user|id> <1h|1d|1m|1y|lifetime>")]
    AddPremium { user: String, duration: String },
    #[command(description = "/remove_premium <@user|id>")]
    RemovePremium(String),
    #[command(description = "/del_user <@user|id>")]
    DelUser(String),
}

pub async fn dispatch_command(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    command: Command,
) -> HandlerResult {
    match command {
        Command::Start(payload) => start::start(bot, msg, state, payload).await,
        Command::Help => start::help(bot, msg, state).await,
        Command::Settings => settings_panel::settings_command(bot, msg, state).await,
        Command::Rename(name) => files::rename_command(bot, msg, state, name).await,
        Command::Autorename => autorename::autorename_command(bot, msg, state).await,
        Command::Analyze => files::analyze_command(bot, msg).await,
        Command::Batchrename => files::batchrename_command(bot, msg).await,
        Command::Gentoken => tokens::gentoken_command(bot, msg, state).await,
        Command::Token | Command::Mytokens | Command::Bal => {
            tokens::token_command(bot, msg, state).await
        }
        Command::Donate => premium::donate_command(bot, msg).await,
        Command::Premium => premium::premium_command(bot, msg).await,
        Command::Plan => premium::plan_command(bot, msg).await,
        Command::Bought => premium::bought_command(bot, msg, state).await,
    }
}

pub async fn dispatch_admin_command(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    command: AdminCommand,
) -> HandlerResult {
    match command {
        AdminCommand::AddToken { amount, user } => {
            admin::add_token(bot, msg, state, amount, user).await
        }
        AdminCommand::RemoveToken { amount, user } => {
            admin::remove_token(bot, msg, state, amount, user).await
        }
        AdminCommand::AddPremium { user, duration } => {
            admin::add_premium(bot, msg, state, user, duration).await
        }
        AdminCommand::RemovePremium(user) => admin::remove_premium(bot, msg, state, user).await,
        AdminCommand::DelUser(user) => admin::del_user(bot, msg, state, user).await,
    }
}

/// Routes callback data to the owning handler by its prefix namespace.
pub async fn callback_handle(bot: Bot, state: Arc<BotState>, q: CallbackQuery) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    match data.as_str() {
        d if d.starts_with("setting_")
            || d.starts_with("send_as_")
            || d.starts_with("rename_mode_")
            || d.starts_with("meta_")
            || d.starts_with("dest_") =>
        {
            settings_panel::callback_handle(bot, state, q).await
        }
        "rename_keep" | "rename_cancel" => files::callback_handle(bot, state, q).await,
        "gen_tokens" | "premium_info" | "refresh_tokens" | "token_back" => {
            tokens::callback_handle(bot, state, q).await
        }
        d if d.starts_with("autorename_") => autorename::callback_handle(bot, state, q).await,
        _ => start::nav_callback(bot, state, q).await,
    }
}

/// Fire-and-forget deletion of an ephemeral message. Runs to completion
/// regardless of what happened to the chat in the meantime; a failed delete
/// is only logged.
pub fn delete_later(bot: Bot, chat_id: ChatId, message_id: MessageId, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(err) = bot.delete_message(chat_id, message_id).await {
            tracing::debug!(%err, "ephemeral message already gone");
        }
    });
}
