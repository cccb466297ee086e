use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{wallet, UserProfile};
use teloxide::prelude::*;

use crate::errors::HandlerResult;
use crate::require_admin;
use crate::settings::BotState;

const USER_NOT_FOUND_MESSAGE: &str = "User not found!";
const ADD_TOKEN_USAGE: &str = "Usage: /add_token <amount> <@username|user id>";
const REMOVE_TOKEN_USAGE: &str = "Usage: /remove_token <amount> <@username|user id>";
const ADD_PREMIUM_USAGE: &str =
    "Usage: /add_premium <@username|user id> <1h|1d|1m|1y|lifetime>";
const REMOVE_PREMIUM_USAGE: &str = "Usage: /remove_premium <@username|user id>";

fn sender_id(msg: &Message) -> i64 {
    msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0)
}

async fn resolve_existing(
    state: &Arc<BotState>,
    reference: &str,
) -> Result<Option<UserProfile>, crate::errors::BotError> {
    let mut conn = state.conn().await?;
    let Some(user_id) = UserProfile::resolve(&mut conn, reference).await? else {
        return Ok(None);
    };
    Ok(UserProfile::load(&mut conn, user_id).await?)
}

pub async fn add_token(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    amount: i64,
    user: String,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    require_admin!(state, sender_id(&msg), bot, chat_id);

    if amount <= 0 {
        bot.send_message(chat_id, ADD_TOKEN_USAGE).await?;
        return Ok(());
    }
    let Some(profile) = resolve_existing(&state, &user).await? else {
        bot.send_message(chat_id, USER_NOT_FOUND_MESSAGE).await?;
        return Ok(());
    };

    let mut conn = state.conn().await?;
    let new_balance = wallet::add(&mut conn, profile.user_id, amount).await?;
    tracing::info!(user_id = profile.user_id, amount, "admin token grant");
    bot.send_message(
        chat_id,
        format!(
            "Added {amount} tokens to user {}. New balance: {new_balance}",
            profile.user_id
        ),
    )
    .await?;
    Ok(())
}

pub async fn remove_token(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    amount: i64,
    user: String,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    require_admin!(state, sender_id(&msg), bot, chat_id);

    if amount <= 0 {
        bot.send_message(chat_id, REMOVE_TOKEN_USAGE).await?;
        return Ok(());
    }
    let Some(profile) = resolve_existing(&state, &user).await? else {
        bot.send_message(chat_id, USER_NOT_FOUND_MESSAGE).await?;
        return Ok(());
    };

    let mut conn = state.conn().await?;
    let balance = wallet::balance(&mut conn, profile.user_id).await?;
    let new_balance = (balance - amount).max(0);
    wallet::set_balance(&mut conn, profile.user_id, new_balance).await?;
    tracing::info!(user_id = profile.user_id, amount, "admin token removal");
    bot.send_message(
        chat_id,
        format!(
            "Removed {amount} tokens from user {}. New balance: {new_balance}",
            profile.user_id
        ),
    )
    .await?;
    Ok(())
}

pub async fn add_premium(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    user: String,
    duration: String,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    require_admin!(state, sender_id(&msg), bot, chat_id);

    let Some(expiry) = parse_premium_expiry(&duration, Utc::now()) else {
        bot.send_message(chat_id, ADD_PREMIUM_USAGE).await?;
        return Ok(());
    };
    let Some(mut profile) = resolve_existing(&state, &user).await? else {
        bot.send_message(chat_id, USER_NOT_FOUND_MESSAGE).await?;
        return Ok(());
    };

    profile.is_premium = true;
    profile.premium_expiry = Some(expiry);
    let mut conn = state.conn().await?;
    profile.save(&mut conn).await?;
    tracing::info!(user_id = profile.user_id, %expiry, "premium granted");
    bot.send_message(
        chat_id,
        format!("Premium added until {}", expiry.format("%d %b %Y %H:%M")),
    )
    .await?;
    Ok(())
}

pub async fn remove_premium(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    user: String,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    require_admin!(state, sender_id(&msg), bot, chat_id);

    let user = user.trim();
    if user.is_empty() {
        bot.send_message(chat_id, REMOVE_PREMIUM_USAGE).await?;
        return Ok(());
    }
    let Some(mut profile) = resolve_existing(&state, user).await? else {
        bot.send_message(chat_id, USER_NOT_FOUND_MESSAGE).await?;
        return Ok(());
    };

    profile.is_premium = false;
    profile.premium_expiry = None;
    let mut conn = state.conn().await?;
    profile.save(&mut conn).await?;
    tracing::info!(user_id = profile.user_id, "premium removed");
    bot.send_message(chat_id, "Premium access removed").await?;
    Ok(())
}

/// Removes the user document and wallet entirely.
pub async fn del_user(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    user: String,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    require_admin!(state, sender_id(&msg), bot, chat_id);

    let user = user.trim();
    if user.is_empty() {
        bot.send_message(chat_id, "Usage: /del_user <@username|user id>").await?;
        return Ok(());
    }
    let Some(profile) = resolve_existing(&state, user).await? else {
        bot.send_message(chat_id, USER_NOT_FOUND_MESSAGE).await?;
        return Ok(());
    };

    let mut conn = state.conn().await?;
    UserProfile::delete(&mut conn, profile.user_id).await?;
    tracing::info!(user_id = profile.user_id, "user deleted by admin");
    bot.send_message(chat_id, format!("User {} deleted.", profile.user_id))
        .await?;
    Ok(())
}

/// `1h`/`2d`/`3m`/`1y` or `lifetime`. Months and years are calendar-naive
/// (30 and 365 days).
fn parse_premium_expiry(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim().to_lowercase();
    if raw == "lifetime" {
        return Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).single();
    }

    let (idx, unit) = raw.char_indices().last()?;
    let number: i64 = raw[..idx].parse().ok()?;
    if number <= 0 {
        return None;
    }
    let delta = match unit {
        'h' => Duration::hours(number),
        'd' => Duration::days(number),
        'm' => Duration::days(30 * number),
        'y' => Duration::days(365 * number),
        _ => return None,
    };
    Some(now + delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse_with_their_units() {
        let now = Utc::now();
        assert_eq!(parse_premium_expiry("1h", now), Some(now + Duration::hours(1)));
        assert_eq!(parse_premium_expiry("2d", now), Some(now + Duration::days(2)));
        assert_eq!(parse_premium_expiry("1m", now), Some(now + Duration::days(30)));
        assert_eq!(parse_premium_expiry("1y", now), Some(now + Duration::days(365)));
    }

    #[test]
    fn lifetime_is_far_in_the_future() {
        let now = Utc::now();
        let expiry = parse_premium_expiry("lifetime", now).unwrap();
        assert!(expiry > now + Duration::days(365 * 100));
    }

    #[test]
    fn garbage_durations_are_rejected() {
        let now = Utc::now();
        assert_eq!(parse_premium_expiry("", now), None);
        assert_eq!(parse_premium_expiry("h", now), None);
        assert_eq!(parse_premium_expiry("10", now), None);
        assert_eq!(parse_premium_expiry("-1d", now), None);
        assert_eq!(parse_premium_expiry("1w", now), None);
    }
}
