use std::env;

use redis::aio::MultiplexedConnection;

use crate::errors::BotError;
use crate::session::PendingStore;

#[derive(Clone)]
pub struct BotConfig {
    pub redis_url: String,
    pub admin_user_ids: Vec<i64>,
    pub bot_username: String,
    pub shortener_api_url: String,
    pub shortener_api_key: String,
    pub log_channel_id: Option<i64>,
    pub token_id_length: usize,
}

impl BotConfig {
    pub fn from_env() -> Self {
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());

        let admin_user_ids = env::var("ADMIN_USER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|raw| raw.trim().parse::<i64>().ok())
            .collect();

        let bot_username = env::var("BOT_USERNAME").unwrap_or_else(|_| "renamebot".into());

        let shortener_api_url = env::var("SHORTENER_API_URL")
            .unwrap_or_else(|_| "https://droplink.co/api".into());
        let shortener_api_key = env::var("SHORTENER_API_KEY").unwrap_or_default();

        let log_channel_id = env::var("LOG_CHANNEL_ID")
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        let token_id_length = env::var("TOKEN_ID_LENGTH")
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(8);

        Self {
            redis_url,
            admin_user_ids,
            bot_username,
            shortener_api_url,
            shortener_api_key,
            log_channel_id,
            token_id_length,
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }
}

pub struct BotState {
    pub redis_client: redis::Client,
    pub http_client: reqwest::Client,
    pub config: BotConfig,
    pub pending: PendingStore,
}

impl BotState {
    pub fn new(config: BotConfig) -> Result<Self, BotError> {
        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self {
            redis_client,
            http_client: reqwest::Client::new(),
            config,
            pending: PendingStore::new(),
        })
    }

    pub async fn conn(&self) -> Result<MultiplexedConnection, BotError> {
        Ok(self.redis_client.get_multiplexed_async_connection().await?)
    }
}
