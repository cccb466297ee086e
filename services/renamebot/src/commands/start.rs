use std::sync::Arc;

use chrono::Utc;
use common::{wallet, TokenLink};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message},
};

use crate::auth::ensure_user;
use crate::errors::HandlerResult;
use crate::settings::BotState;
use crate::texts;

const INVALID_LINK_MESSAGE: &str = "Invalid or expired token link.";

pub async fn start(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    payload: String,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let user = ensure_user(&state, &msg).await?;

    let token_id = payload.trim();
    if !token_id.is_empty() {
        return redeem_token(&bot, &state, chat_id, user.user_id, token_id).await;
    }

    bot.send_message(chat_id, texts::start_text(&user.first_name))
        .reply_markup(start_keyboard())
        .await?;
    Ok(())
}

pub async fn help(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    ensure_user(&state, &msg).await?;
    bot.send_message(msg.chat.id, texts::HELP_TXT)
        .reply_markup(help_keyboard())
        .await?;
    Ok(())
}

/// Deep-link redemption: `/start <token-id>`. Each failure renders its own
/// message; on success the wallet is incremented before the link is marked
/// used (no rollback between the two writes).
async fn redeem_token(
    bot: &Bot,
    state: &Arc<BotState>,
    chat_id: ChatId,
    user_id: i64,
    token_id: &str,
) -> HandlerResult {
    let mut conn = state.conn().await?;

    let Some(link) = TokenLink::load(&mut conn, token_id).await? else {
        bot.send_message(chat_id, INVALID_LINK_MESSAGE).await?;
        return Ok(());
    };

    if let Err(reason) = link.check_redeemable(user_id, Utc::now()) {
        bot.send_message(chat_id, format!("Cannot redeem: {reason}."))
            .await?;
        return Ok(());
    }

    let new_balance = wallet::add(&mut conn, user_id, link.tokens).await?;
    TokenLink::mark_used(&mut conn, &link.token_id).await?;
    tracing::info!(user_id, token_id, tokens = link.tokens, "token link redeemed");

    bot.send_message(
        chat_id,
        format!(
            "Success! {} tokens added to your account. New balance: {}.",
            link.tokens, new_balance
        ),
    )
    .await?;
    Ok(())
}

/// Static navigation between the info panels. Also the fallback for unknown
/// callback data.
pub async fn nav_callback(bot: Bot, state: Arc<BotState>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.message.as_ref().and_then(|m| m.regular_message()) else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.id;
    let data = q.data.as_deref().unwrap_or_default();

    match data {
        "home" => {
            bot.edit_message_text(chat_id, message_id, texts::start_text(&q.from.first_name))
                .reply_markup(start_keyboard())
                .await?;
        }
        "help" => {
            bot.edit_message_text(chat_id, message_id, texts::HELP_TXT)
                .reply_markup(help_keyboard())
                .await?;
        }
        "about" => {
            bot.edit_message_text(chat_id, message_id, texts::ABOUT_TXT)
                .reply_markup(back_keyboard("home"))
                .await?;
        }
        "donate" => {
            bot.edit_message_text(chat_id, message_id, texts::DONATE_TXT)
                .reply_markup(back_keyboard("help"))
                .await?;
        }
        "caption" => {
            bot.edit_message_text(chat_id, message_id, texts::CAPTION_TXT)
                .reply_markup(back_keyboard("help"))
                .await?;
        }
        "thumbnail" => {
            bot.edit_message_text(chat_id, message_id, texts::THUMBNAIL_TXT)
                .reply_markup(back_keyboard("help"))
                .await?;
        }
        "meta" => {
            bot.edit_message_text(chat_id, message_id, texts::METADATA_TXT)
                .reply_markup(back_keyboard("help"))
                .await?;
        }
        "plans" => {
            bot.edit_message_text(chat_id, message_id, texts::PLANS_TXT)
                .reply_markup(back_keyboard("help"))
                .await?;
        }
        "close" => {
            let user_id = q.from.id.0 as i64;
            state.pending.clear(user_id);
            bot.delete_message(chat_id, message_id).await?;
        }
        _ => {}
    }

    Ok(())
}

fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("My commands", "help")],
        vec![
            InlineKeyboardButton::callback("About", "about"),
            InlineKeyboardButton::callback("Donate", "donate"),
        ],
        vec![InlineKeyboardButton::callback("Close", "close")],
    ])
}

fn help_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("Thumbnail", "thumbnail"),
            InlineKeyboardButton::callback("Caption", "caption"),
        ],
        vec![
            InlineKeyboardButton::callback("Metadata", "meta"),
            InlineKeyboardButton::callback("Donate", "donate"),
        ],
        vec![InlineKeyboardButton::callback("Home", "home")],
    ])
}

fn back_keyboard(target: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Back", target.to_string()),
        InlineKeyboardButton::callback("Close", "close"),
    ]])
}
