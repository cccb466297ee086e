use std::sync::Arc;

use chrono::Utc;
use common::{wallet, TokenLink, UserProfile};
use rand::Rng;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message},
};

use crate::auth::{ensure_user, ensure_user_by_id};
use crate::errors::HandlerResult;
use crate::settings::BotState;
use crate::shortener::shorten_url;

/// Tokens granted by a redemption link.
const LINK_GRANT: i64 = 100;

const TOKEN_ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `/token`, `/mytokens`, `/bal` - account status.
pub async fn token_command(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let profile = ensure_user(&state, &msg).await?;
    let (text, keyboard) = account_status(&state, profile).await?;
    bot.send_message(msg.chat.id, text).reply_markup(keyboard).await?;
    Ok(())
}

/// Renders the status panel, demoting an expired premium on the way.
async fn account_status(
    state: &Arc<BotState>,
    mut profile: UserProfile,
) -> Result<(String, InlineKeyboardMarkup), crate::errors::BotError> {
    let mut conn = state.conn().await?;
    let now = Utc::now();

    if profile.is_premium && !profile.premium_active(now) {
        profile.is_premium = false;
        profile.premium_expiry = None;
        profile.save(&mut conn).await?;
    }

    let mut lines = vec!["Your account status".to_string(), String::new()];
    let keyboard;

    if profile.is_premium {
        lines.push("Premium status: Active".to_string());
        if let Some(expiry) = profile.premium_expiry {
            lines.push(format!("Premium expiry: {}", expiry.format("%d %b %Y %H:%M")));
        }
        keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "Refresh Status",
            "refresh_tokens",
        )]]);
    } else {
        let balance = wallet::balance(&mut conn, profile.user_id).await?;
        lines.push("Premium status: Inactive".to_string());
        lines.push(format!("Available tokens: {balance}"));
        lines.push(String::new());
        lines.push("1 token = 1 file rename".to_string());
        keyboard = InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::callback("Generate More Tokens", "gen_tokens")],
            vec![InlineKeyboardButton::callback("Get Premium", "premium_info")],
        ]);
    }

    Ok((lines.join("\n"), keyboard))
}

/// `/gentoken` - creates a 24-hour single-use redemption link and hands out
/// the shortened deep link.
pub async fn gentoken_command(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let profile = ensure_user(&state, &msg).await?;
    let chat_id = msg.chat.id;

    let token_id = random_token_id(state.config.token_id_length);
    let deep_link = format!("https://t.me/{}?start={}", state.config.bot_username, token_id);
    let short_url = shorten_url(&state, &deep_link).await;

    let link = TokenLink::new(&token_id, profile.user_id, LINK_GRANT, Utc::now());
    let mut conn = state.conn().await?;
    link.save(&mut conn).await?;
    tracing::info!(user_id = profile.user_id, token_id, "token link created");

    bot.send_message(
        chat_id,
        format!(
            "Get {LINK_GRANT} tokens\n\n\
             Open this link and complete the verification:\n{short_url}\n\n\
             Valid for 24 hours. One-time use only."
        ),
    )
    .await?;
    Ok(())
}

fn random_token_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| TOKEN_ID_CHARS[rng.gen_range(0..TOKEN_ID_CHARS.len())] as char)
        .collect()
}

/// Buttons on the account-status panel.
pub async fn callback_handle(bot: Bot, state: Arc<BotState>, q: CallbackQuery) -> HandlerResult {
    let Some(message) = q.message.as_ref().and_then(|m| m.regular_message()) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.id;
    let user_id = q.from.id.0 as i64;

    match q.data.as_deref().unwrap_or_default() {
        "gen_tokens" => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(
                chat_id,
                message_id,
                "You can generate a redemption link with /gentoken.",
            )
            .reply_markup(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback("Back", "token_back"),
            ]]))
            .await?;
        }
        "premium_info" => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(chat_id, message_id, crate::texts::PREMIUM_TXT)
                .reply_markup(InlineKeyboardMarkup::new(vec![vec![
                    InlineKeyboardButton::callback("Back", "token_back"),
                ]]))
                .await?;
        }
        "refresh_tokens" | "token_back" => {
            let profile = ensure_user_by_id(
                &state,
                user_id,
                &q.from.first_name,
                q.from.username.as_deref(),
            )
            .await?;
            let (text, keyboard) = account_status(&state, profile).await?;
            // an unchanged balance makes this edit a no-op Telegram rejects
            if let Err(err) = bot
                .edit_message_text(chat_id, message_id, text)
                .reply_markup(keyboard)
                .await
            {
                tracing::debug!(%err, "status refresh left the message unchanged");
            }
            bot.answer_callback_query(q.id.clone()).text("Status refreshed").await?;
        }
        _ => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_ids_use_the_expected_alphabet() {
        let id = random_token_id(16);
        assert_eq!(id.len(), 16);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn token_ids_are_not_constant() {
        // astronomically unlikely to collide at this length
        assert_ne!(random_token_id(16), random_token_id(16));
    }
}
