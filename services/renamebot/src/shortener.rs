//! Deep-link shortening through an external API. The only operation in the
//! bot that is retried; everything else is best-effort at-most-once.

use std::time::Duration;

use tracing::warn;

use crate::settings::BotState;

const MAX_ATTEMPTS: u32 = 3;

/// Shortens `deep_link`, falling back to the raw link when the API stays
/// unreachable across all attempts.
pub async fn shorten_url(state: &BotState, deep_link: &str) -> String {
    for attempt in 0..MAX_ATTEMPTS {
        let request = state
            .http_client
            .get(&state.config.shortener_api_url)
            .query(&[
                ("api", state.config.shortener_api_key.as_str()),
                ("url", deep_link),
                ("format", "text"),
            ]);

        match request.send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => {
                    let short = body.trim();
                    if !short.is_empty() {
                        return short.to_string();
                    }
                    warn!(attempt, "shortener returned an empty body");
                }
                Err(err) => warn!(attempt, %err, "failed to read shortener response"),
            },
            Ok(response) => warn!(attempt, status = %response.status(), "shortener API error"),
            Err(err) => warn!(attempt, %err, "shortener request failed"),
        }

        tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
    }

    warn!("shortener unavailable, using the raw deep link");
    deep_link.to_string()
}
