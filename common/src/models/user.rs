use std::fmt;

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::models::errors::DataError;
use crate::models::wallet;

const USER_PREFIX: &str = "user:";
const USERNAME_INDEX_PREFIX: &str = "username:";

/// How incoming files are renamed for a given user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenameMode {
    #[default]
    Manual,
    Auto,
    Ai,
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameMode::Manual => write!(f, "Manual"),
            RenameMode::Auto => write!(f, "Auto"),
            RenameMode::Ai => write!(f, "AI"),
        }
    }
}

/// Upload preference for renamed files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendAs {
    #[default]
    Document,
    Media,
}

impl fmt::Display for SendAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendAs::Document => write!(f, "Document"),
            SendAs::Media => write!(f, "Media"),
        }
    }
}

/// Stream-tagging fields rendered into the settings panel. The bot stores
/// them verbatim; it does not embed them into the files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

fn enabled() -> bool {
    true
}

/// Per-user document stored as JSON under `user:<id>`. The token balance
/// deliberately lives outside this document, see [`wallet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: String,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub thumbnail_file_id: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub remove_words: Option<String>,
    #[serde(default)]
    pub rename_mode: RenameMode,
    #[serde(default)]
    pub send_as: SendAs,
    #[serde(default)]
    pub upload_destination: Option<String>,
    #[serde(default)]
    pub sample_video: bool,
    #[serde(default)]
    pub screenshot_enabled: bool,
    #[serde(default = "enabled")]
    pub metadata_enabled: bool,
    #[serde(default)]
    pub metadata: MetadataFields,
    #[serde(default)]
    pub rename_count: u64,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub premium_expiry: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(user_id: i64, first_name: &str, username: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            first_name: first_name.to_string(),
            username: username.to_string(),
            joined_at: now,
            thumbnail_file_id: None,
            caption: None,
            prefix: None,
            suffix: None,
            remove_words: None,
            rename_mode: RenameMode::default(),
            send_as: SendAs::default(),
            upload_destination: None,
            sample_video: false,
            screenshot_enabled: false,
            metadata_enabled: true,
            metadata: MetadataFields::default(),
            rename_count: 0,
            is_premium: false,
            premium_expiry: None,
        }
    }

    pub async fn save(&self, conn: &mut impl AsyncCommands) -> Result<(), DataError> {
        let key = format!("{}{}", USER_PREFIX, self.user_id);
        let json = serde_json::to_string(self)?;
        let _: () = conn.set(key, json).await?;
        if !self.username.is_empty() {
            let index = format!("{}{}", USERNAME_INDEX_PREFIX, self.username.to_lowercase());
            let _: () = conn.set(index, self.user_id).await?;
        }
        Ok(())
    }

    pub async fn get(conn: &mut impl AsyncCommands, user_id: i64) -> Result<Self, DataError> {
        let key = format!("{}{}", USER_PREFIX, user_id);
        let value: Option<String> = conn.get(&key).await?;
        let Some(json) = value else {
            return Err(DataError::NotFound);
        };
        Ok(serde_json::from_str(&json)?)
    }

    pub async fn load(
        conn: &mut impl AsyncCommands,
        user_id: i64,
    ) -> Result<Option<Self>, DataError> {
        match Self::get(conn, user_id).await {
            Ok(profile) => Ok(Some(profile)),
            Err(DataError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Fetches the stored profile, creating a fresh one (and seeding the
    /// token wallet) on first contact.
    pub async fn get_or_create(
        conn: &mut impl AsyncCommands,
        user_id: i64,
        first_name: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DataError> {
        match Self::get(conn, user_id).await {
            Ok(profile) => Ok(profile),
            Err(DataError::NotFound) => {
                let profile = Self::new(user_id, first_name, username, now);
                profile.save(conn).await?;
                wallet::init(conn, user_id).await?;
                Ok(profile)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn delete(conn: &mut impl AsyncCommands, user_id: i64) -> Result<(), DataError> {
        if let Some(profile) = Self::load(conn, user_id).await? {
            if !profile.username.is_empty() {
                let index =
                    format!("{}{}", USERNAME_INDEX_PREFIX, profile.username.to_lowercase());
                let _: () = conn.del(index).await?;
            }
        }
        let _: () = conn.del(format!("{}{}", USER_PREFIX, user_id)).await?;
        let _: () = conn.del(wallet::key(user_id)).await?;
        Ok(())
    }

    /// Resolves an admin-supplied reference, either `@username` or a raw
    /// numeric id, to a user id. Returns `None` when nothing matches.
    pub async fn resolve(
        conn: &mut impl AsyncCommands,
        reference: &str,
    ) -> Result<Option<i64>, DataError> {
        if let Some(name) = reference.strip_prefix('@') {
            let index = format!("{}{}", USERNAME_INDEX_PREFIX, name.to_lowercase());
            let id: Option<i64> = conn.get(&index).await?;
            return Ok(id);
        }
        Ok(reference.parse::<i64>().ok())
    }

    /// Premium is active while the flag is set and the expiry, when present,
    /// has not passed. Demoting an expired record is the caller's job.
    pub fn premium_active(&self, now: DateTime<Utc>) -> bool {
        self.is_premium && self.premium_expiry.map_or(true, |expiry| now <= expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_without_expiry_is_active() {
        let mut profile = UserProfile::new(1, "a", "a", Utc::now());
        profile.is_premium = true;
        assert!(profile.premium_active(Utc::now()));
    }

    #[test]
    fn premium_past_expiry_is_inactive() {
        let now = Utc::now();
        let mut profile = UserProfile::new(1, "a", "a", now);
        profile.is_premium = true;
        profile.premium_expiry = Some(now - chrono::Duration::hours(1));
        assert!(!profile.premium_active(now));
    }

    #[test]
    fn defaults_survive_a_minimal_document() {
        let json = format!(
            r#"{{"user_id":7,"joined_at":"{}"}}"#,
            Utc::now().to_rfc3339()
        );
        let profile: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile.rename_mode, RenameMode::Manual);
        assert_eq!(profile.send_as, SendAs::Document);
        assert!(profile.metadata_enabled);
        assert!(!profile.is_premium);
    }
}
