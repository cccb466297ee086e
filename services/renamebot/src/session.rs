//! Pending-input tracking for interactive prompts.
//!
//! One entry per user, held in memory only: a prompt is a short-lived UI
//! affair and does not survive a restart. Every entry carries a deadline;
//! a reply that arrives after it is treated as an ordinary message.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use teloxide::types::{ChatId, MessageId};
use tokio::time::Instant;

use crate::media::MediaFile;
use crate::settings::BotState;

pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// What the bot is waiting for from a user.
#[derive(Debug, Clone, PartialEq)]
pub enum AwaitedInput {
    Prefix,
    Suffix,
    RemoveWords,
    Caption,
    UploadDestination,
    MetaTitle,
    MetaAuthor,
    MetaAudio,
    MetaSubtitle,
    Thumbnail,
    NewFileName(MediaFile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Photo,
}

impl AwaitedInput {
    pub fn kind(&self) -> InputKind {
        match self {
            AwaitedInput::Thumbnail => InputKind::Photo,
            _ => InputKind::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub awaited: AwaitedInput,
    /// Panel or prompt message to edit/delete once the input lands.
    pub panel: Option<(ChatId, MessageId)>,
    expires_at: Instant,
    generation: u64,
}

#[derive(Default)]
pub struct PendingStore {
    inner: Mutex<HashMap<i64, PendingEntry>>,
    counter: AtomicU64,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records what the user is expected to send next. A previous entry for
    /// the same user is overwritten: the latest prompt wins. Returns the
    /// entry's generation, used by the deferred sweep.
    pub fn set(
        &self,
        user_id: i64,
        awaited: AwaitedInput,
        panel: Option<(ChatId, MessageId)>,
    ) -> u64 {
        let generation = self.counter.fetch_add(1, Ordering::Relaxed);
        let entry = PendingEntry {
            awaited,
            panel,
            expires_at: Instant::now() + PROMPT_TIMEOUT,
            generation,
        };
        self.inner
            .lock()
            .expect("pending store lock poisoned")
            .insert(user_id, entry);
        generation
    }

    /// Removes and returns the entry if the input kind matches and the
    /// deadline has not passed. An expired entry is dropped on touch; a
    /// kind mismatch leaves the entry in place.
    pub fn consume(&self, user_id: i64, kind: InputKind) -> Option<PendingEntry> {
        let mut map = self.inner.lock().expect("pending store lock poisoned");
        let entry = map.get(&user_id)?;
        if entry.expires_at <= Instant::now() {
            map.remove(&user_id);
            return None;
        }
        if entry.awaited.kind() != kind {
            return None;
        }
        map.remove(&user_id)
    }

    pub fn clear(&self, user_id: i64) {
        self.inner
            .lock()
            .expect("pending store lock poisoned")
            .remove(&user_id);
    }

    /// Sweep entry point: removes the entry only when it is still the one
    /// that scheduled the sweep, so a newer prompt is never clobbered.
    pub fn expire(&self, user_id: i64, generation: u64) {
        let mut map = self.inner.lock().expect("pending store lock poisoned");
        if map.get(&user_id).is_some_and(|e| e.generation == generation) {
            map.remove(&user_id);
        }
    }
}

/// Registers a prompt and schedules its fire-and-forget expiry sweep.
pub fn schedule_prompt(
    state: &Arc<BotState>,
    user_id: i64,
    awaited: AwaitedInput,
    panel: Option<(ChatId, MessageId)>,
) {
    let generation = state.pending.set(user_id, awaited, panel);
    let state = Arc::clone(state);
    tokio::spawn(async move {
        tokio::time::sleep(PROMPT_TIMEOUT).await;
        state.pending.expire(user_id, generation);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consume_returns_the_matching_entry_once() {
        let store = PendingStore::new();
        store.set(1, AwaitedInput::Prefix, None);
        let entry = store.consume(1, InputKind::Text).expect("entry expected");
        assert_eq!(entry.awaited, AwaitedInput::Prefix);
        assert!(store.consume(1, InputKind::Text).is_none());
    }

    #[tokio::test]
    async fn kind_mismatch_leaves_the_entry_pending() {
        let store = PendingStore::new();
        store.set(1, AwaitedInput::Thumbnail, None);
        assert!(store.consume(1, InputKind::Text).is_none());
        assert!(store.consume(1, InputKind::Photo).is_some());
    }

    #[tokio::test]
    async fn a_new_prompt_overwrites_the_old_one() {
        let store = PendingStore::new();
        store.set(1, AwaitedInput::Prefix, None);
        store.set(1, AwaitedInput::Suffix, None);
        let entry = store.consume(1, InputKind::Text).expect("entry expected");
        assert_eq!(entry.awaited, AwaitedInput::Suffix);
    }

    #[tokio::test(start_paused = true)]
    async fn a_late_reply_is_ignored() {
        let store = PendingStore::new();
        store.set(1, AwaitedInput::Caption, None);
        tokio::time::advance(PROMPT_TIMEOUT + Duration::from_secs(1)).await;
        assert!(store.consume(1, InputKind::Text).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn the_sweep_only_clears_its_own_generation() {
        let store = PendingStore::new();
        let first = store.set(1, AwaitedInput::Prefix, None);
        // a newer prompt arrives before the first sweep fires
        store.set(1, AwaitedInput::Suffix, None);
        store.expire(1, first);
        let entry = store.consume(1, InputKind::Text).expect("newer entry kept");
        assert_eq!(entry.awaited, AwaitedInput::Suffix);
    }

    #[tokio::test]
    async fn users_do_not_share_entries() {
        let store = PendingStore::new();
        store.set(1, AwaitedInput::Prefix, None);
        assert!(store.consume(2, InputKind::Text).is_none());
        assert!(store.consume(1, InputKind::Text).is_some());
    }
}
