//! Info panels around the premium economy. The panels and the commands that
//! opened them are ephemeral and removed after a few minutes.

use std::sync::Arc;
use std::time::Duration;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message},
};

use crate::commands::delete_later;
use crate::errors::HandlerResult;
use crate::settings::BotState;
use crate::texts;

const PANEL_LIFETIME: Duration = Duration::from_secs(300);

async fn ephemeral_panel(bot: Bot, msg: Message, text: &str) -> HandlerResult {
    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Back", "help"),
        InlineKeyboardButton::callback("Close", "close"),
    ]]);
    let sent = bot
        .send_message(msg.chat.id, text)
        .reply_markup(keyboard)
        .await?;
    delete_later(bot.clone(), msg.chat.id, sent.id, PANEL_LIFETIME);
    delete_later(bot, msg.chat.id, msg.id, PANEL_LIFETIME);
    Ok(())
}

pub async fn donate_command(bot: Bot, msg: Message) -> HandlerResult {
    ephemeral_panel(bot, msg, texts::DONATE_TXT).await
}

pub async fn premium_command(bot: Bot, msg: Message) -> HandlerResult {
    ephemeral_panel(bot, msg, texts::PREMIUM_TXT).await
}

pub async fn plan_command(bot: Bot, msg: Message) -> HandlerResult {
    ephemeral_panel(bot, msg, texts::PLANS_TXT).await
}

/// `/bought` replying to a payment screenshot: forwards the photo and the
/// sender's identity to the log channel for manual activation.
pub async fn bought_command(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let chat_id = msg.chat.id;
    let status = bot.send_message(chat_id, "Wait, checking...").await?;

    let screenshot = msg
        .reply_to_message()
        .and_then(|replied| replied.photo())
        .and_then(|sizes| sizes.last());

    let Some(photo) = screenshot else {
        bot.edit_message_text(
            chat_id,
            status.id,
            "Reply to the screenshot of your payment with /bought so the \
             admins can verify your purchase.",
        )
        .await?;
        return Ok(());
    };

    let Some(log_channel) = state.config.log_channel_id else {
        tracing::warn!("/bought used but LOG_CHANNEL_ID is not configured");
        bot.edit_message_text(chat_id, status.id, "Purchase review is not available right now.")
            .await?;
        return Ok(());
    };

    let from = msg.from.as_ref();
    let caption = format!(
        "Premium purchase screenshot\n\
         User id: {}\n\
         Username: @{}\n\
         Name: {}",
        from.map(|u| u.id.0 as i64).unwrap_or(chat_id.0),
        from.and_then(|u| u.username.as_deref()).unwrap_or("-"),
        from.map(|u| u.first_name.as_str()).unwrap_or("-"),
    );

    bot.send_photo(ChatId(log_channel), InputFile::file_id(photo.file.id.clone()))
        .caption(caption)
        .await?;
    bot.edit_message_text(chat_id, status.id, "Your screenshot has been sent to the admins.")
        .await?;
    Ok(())
}
