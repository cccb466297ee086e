use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::errors::DataError;

const TOKEN_LINK_PREFIX: &str = "token_link:";

/// A link can be redeemed for this long after creation.
pub const LINK_VALIDITY_HOURS: i64 = 24;

/// The Redis key outlives the logical validity window so an expired link
/// still reads back and reports "expired" instead of "not found".
const KEY_TTL_SECONDS: u64 = 48 * 3600;

/// Why a stored link cannot be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedeemError {
    #[error("this link has already been used")]
    AlreadyUsed,
    #[error("this link has expired")]
    Expired,
    #[error("this link belongs to another user")]
    WrongOwner,
}

/// Single-use token grant, stored as JSON under `token_link:<token_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLink {
    pub token_id: String,
    pub user_id: i64,
    pub tokens: i64,
    pub used: bool,
    pub expiry: DateTime<Utc>,
}

impl TokenLink {
    pub fn new(token_id: &str, user_id: i64, tokens: i64, now: DateTime<Utc>) -> Self {
        Self {
            token_id: token_id.to_string(),
            user_id,
            tokens,
            used: false,
            expiry: now + Duration::hours(LINK_VALIDITY_HOURS),
        }
    }

    pub async fn save(&self, conn: &mut impl AsyncCommands) -> Result<(), DataError> {
        let key = format!("{}{}", TOKEN_LINK_PREFIX, self.token_id);
        let json = serde_json::to_string(self)?;
        let _: () = conn.set_ex(key, json, KEY_TTL_SECONDS).await?;
        Ok(())
    }

    pub async fn load(
        conn: &mut impl AsyncCommands,
        token_id: &str,
    ) -> Result<Option<Self>, DataError> {
        let key = format!("{}{}", TOKEN_LINK_PREFIX, token_id);
        let value: Option<String> = conn.get(&key).await?;
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn mark_used(
        conn: &mut impl AsyncCommands,
        token_id: &str,
    ) -> Result<(), DataError> {
        let mut link = Self::load(conn, token_id).await?.ok_or(DataError::NotFound)?;
        link.used = true;
        link.save(conn).await
    }

    /// Pure redemption check: used, then expired, then ownership.
    pub fn check_redeemable(&self, user_id: i64, now: DateTime<Utc>) -> Result<(), RedeemError> {
        if self.used {
            return Err(RedeemError::AlreadyUsed);
        }
        if now > self.expiry {
            return Err(RedeemError::Expired);
        }
        if self.user_id != user_id {
            return Err(RedeemError::WrongOwner);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(now: DateTime<Utc>) -> TokenLink {
        TokenLink::new("AB12CD34", 42, 100, now)
    }

    #[test]
    fn fresh_link_is_redeemable_by_owner() {
        let now = Utc::now();
        assert_eq!(link(now).check_redeemable(42, now), Ok(()));
    }

    #[test]
    fn used_link_is_rejected() {
        let now = Utc::now();
        let mut l = link(now);
        l.used = true;
        assert_eq!(l.check_redeemable(42, now), Err(RedeemError::AlreadyUsed));
    }

    #[test]
    fn link_expires_after_the_validity_window() {
        let now = Utc::now();
        let l = link(now);
        let late = now + Duration::hours(LINK_VALIDITY_HOURS) + Duration::seconds(1);
        assert_eq!(l.check_redeemable(42, late), Err(RedeemError::Expired));
        // just inside the window it still works
        let in_time = now + Duration::hours(LINK_VALIDITY_HOURS) - Duration::seconds(1);
        assert_eq!(l.check_redeemable(42, in_time), Ok(()));
    }

    #[test]
    fn foreign_user_is_rejected() {
        let now = Utc::now();
        assert_eq!(link(now).check_redeemable(7, now), Err(RedeemError::WrongOwner));
    }

    #[test]
    fn used_wins_over_expired() {
        let now = Utc::now();
        let mut l = link(now);
        l.used = true;
        let late = now + Duration::hours(LINK_VALIDITY_HOURS * 2);
        assert_eq!(l.check_redeemable(42, late), Err(RedeemError::AlreadyUsed));
    }
}
