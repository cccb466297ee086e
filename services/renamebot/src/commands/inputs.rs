//! Consumes pending interactive prompts. Text and photo messages land here
//! only after the command and media branches have passed on them.

use std::sync::Arc;

use teloxide::prelude::*;

use crate::commands::{files, settings_panel};
use crate::errors::HandlerResult;
use crate::session::{AwaitedInput, InputKind};
use crate::settings::BotState;

const UNKNOWN_COMMAND_MESSAGE: &str = "Command not recognized. Use /help.";

pub async fn text_input_handle(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    let Some(entry) = state.pending.consume(user_id, InputKind::Text) else {
        // a slash message that survived both command parsers
        if text.starts_with('/') {
            bot.send_message(msg.chat.id, UNKNOWN_COMMAND_MESSAGE).await?;
        }
        return Ok(());
    };

    match entry.awaited.clone() {
        AwaitedInput::NewFileName(file) => {
            files::manual_rename_input(bot, state, &msg, &entry, file, text).await
        }
        _ => settings_panel::apply_text_setting(bot, state, &msg, &entry, text).await,
    }
}

pub async fn photo_input_handle(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    let Some(entry) = state.pending.consume(user_id, InputKind::Photo) else {
        return Ok(());
    };
    settings_panel::apply_thumbnail(bot, state, &msg, &entry).await
}
