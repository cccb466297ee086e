use std::sync::Arc;

use common::{RenameMode, UserProfile};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message},
};

use crate::auth::{ensure_user, ensure_user_by_id};
use crate::errors::HandlerResult;
use crate::settings::BotState;

const MANUAL_MODE_TEXT: &str = "Auto-rename disabled\n\n\
    Manual mode is currently active, so files are only renamed on request.\n\n\
    To enable auto-rename, open Settings -> Rename Mode and pick Auto or AI.";

const HELP_TEXT: &str = "Auto-rename help\n\n\
    Auto mode renames incoming files from your prefix, suffix and \
    remove-words settings, no questions asked.\n\n\
    AI mode cleans release names heuristically: bracketed tags, quality \
    tokens and years are stripped and the rest is title-cased.\n\n\
    Manual mode disables both; every file prompts for a name.\n\n\
    Example: prefix [HD], suffix @Channel turn movie.mkv into\n\
    [HD] movie @Channel.mkv";

fn status_text(profile: &UserProfile) -> String {
    let none = "None";
    format!(
        "Auto-rename status\n\n\
         Current mode: {}\n\
         Status: {}\n\n\
         Prefix: {}\n\
         Suffix: {}\n\
         Remove words: {}\n\n\
         When you send a file it is renamed according to these settings.",
        profile.rename_mode,
        if profile.rename_mode == RenameMode::Manual {
            "Disabled"
        } else {
            "Enabled"
        },
        profile.prefix.as_deref().unwrap_or(none),
        profile.suffix.as_deref().unwrap_or(none),
        profile.remove_words.as_deref().unwrap_or(none),
    )
}

fn status_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("Configure Mode", "setting_rename_mode")],
        vec![
            InlineKeyboardButton::callback("Set Prefix", "setting_prefix"),
            InlineKeyboardButton::callback("Set Suffix", "setting_suffix"),
        ],
        vec![InlineKeyboardButton::callback("Remove Words", "setting_remove_words")],
        vec![InlineKeyboardButton::callback("Help", "autorename_help")],
    ])
}

pub async fn autorename_command(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let profile = ensure_user(&state, &msg).await?;
    let chat_id = msg.chat.id;

    if profile.rename_mode == RenameMode::Manual {
        let keyboard = InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::callback("Go to Settings", "setting_rename_mode")],
            vec![InlineKeyboardButton::callback("Learn More", "autorename_help")],
        ]);
        bot.send_message(chat_id, MANUAL_MODE_TEXT)
            .reply_markup(keyboard)
            .await?;
        return Ok(());
    }

    bot.send_message(chat_id, status_text(&profile))
        .reply_markup(status_keyboard())
        .await?;
    Ok(())
}

pub async fn callback_handle(bot: Bot, state: Arc<BotState>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.message.as_ref().and_then(|m| m.regular_message()) else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.id;

    match q.data.as_deref().unwrap_or_default() {
        "autorename_help" => {
            let keyboard = InlineKeyboardMarkup::new(vec![
                vec![InlineKeyboardButton::callback("Back", "autorename_back")],
                vec![InlineKeyboardButton::callback("Settings", "setting_rename_mode")],
            ]);
            bot.edit_message_text(chat_id, message_id, HELP_TEXT)
                .reply_markup(keyboard)
                .await?;
        }
        "autorename_back" => {
            let profile = ensure_user_by_id(
                &state,
                q.from.id.0 as i64,
                &q.from.first_name,
                q.from.username.as_deref(),
            )
            .await?;
            bot.edit_message_text(chat_id, message_id, status_text(&profile))
                .reply_markup(status_keyboard())
                .await?;
        }
        _ => {}
    }
    Ok(())
}
