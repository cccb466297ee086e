use std::sync::Arc;

use chrono::Utc;
use common::UserProfile;
use teloxide::types::Message;

use crate::errors::BotError;
use crate::settings::BotState;

fn extract_username(msg: &Message) -> String {
    msg.from
        .as_ref()
        .and_then(|u| u.username.clone())
        .or_else(|| msg.chat.username().map(|u| u.to_string()))
        .unwrap_or_default()
}

fn extract_first_name(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| msg.chat.id.0.to_string())
}

pub async fn ensure_user(state: &Arc<BotState>, msg: &Message) -> Result<UserProfile, BotError> {
    let user_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0 as i64)
        .unwrap_or(msg.chat.id.0);
    let mut conn = state.conn().await?;
    let profile = UserProfile::get_or_create(
        &mut conn,
        user_id,
        &extract_first_name(msg),
        &extract_username(msg),
        Utc::now(),
    )
    .await?;
    Ok(profile)
}

pub async fn ensure_user_by_id(
    state: &Arc<BotState>,
    user_id: i64,
    first_name: &str,
    username: Option<&str>,
) -> Result<UserProfile, BotError> {
    let mut conn = state.conn().await?;
    let profile = UserProfile::get_or_create(
        &mut conn,
        user_id,
        first_name,
        username.unwrap_or_default(),
        Utc::now(),
    )
    .await?;
    Ok(profile)
}

#[macro_export]
macro_rules! require_admin {
    ($state:expr, $user_id:expr, $bot:expr, $chat_id:expr) => {{
        if !$state.config.is_admin($user_id) {
            $bot.send_message($chat_id, "This command is restricted to bot admins.")
                .await?;
            return Ok(());
        }
    }};
}
