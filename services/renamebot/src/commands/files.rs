use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{wallet, RenameMode, SendAs, UserProfile};
use teloxide::net::Download;
use teloxide::{
    prelude::*,
    types::{
        CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message, MessageId,
        ThreadId,
    },
};
use tokio::io::AsyncWriteExt;
use tracing::{error, warn};

use crate::auth::ensure_user;
use crate::commands::delete_later;
use crate::errors::{BotError, HandlerResult};
use crate::media::{readable_file_size, MediaFile, MediaKind};
use crate::rename::{ai_suggest_name, analyze_filename, build_auto_name, is_valid_filename};
use crate::session::{schedule_prompt, AwaitedInput, InputKind, PendingEntry};
use crate::settings::BotState;
use crate::texts;

const NO_FILE_MESSAGE: &str = "No file found. Reply to a document, video or audio file.";
const INVALID_NAME_MESSAGE: &str =
    "Invalid filename! It must not contain / \\ : * ? \" < > |";
const OUT_OF_TOKENS_MESSAGE: &str =
    "You're out of tokens. Use /gentoken to get more, or /premium for unlimited renames.";
const MANUAL_PROMPT: &str = "Manual rename\n\n\
    Send the new file name with extension.\n\
    Timeout: 60 sec.\n\n\
    Note: your original file stays untouched.";
const RENAME_USAGE: &str = "Usage: reply to a file with /rename <new name>";

const VIDEO_EXTENSIONS: [&str; 7] = [".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm"];

/// Entry point for media arriving in a private chat. The rename mode picks
/// the workflow; Auto and AI fall back to the manual prompt when their
/// computed name changes nothing.
pub async fn incoming_file_handle(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let Some(file) = MediaFile::from_message(&msg) else {
        return Ok(());
    };
    let profile = ensure_user(&state, &msg).await?;
    let chat_id = msg.chat.id;

    match profile.rename_mode {
        RenameMode::Manual => prompt_manual_rename(&bot, &state, profile.user_id, file).await,
        RenameMode::Auto => {
            let original = file.display_name().to_string();
            let renamed = build_auto_name(
                &original,
                profile.prefix.as_deref(),
                profile.suffix.as_deref(),
                profile.remove_words.as_deref(),
            );
            if renamed == original {
                return prompt_manual_rename(&bot, &state, profile.user_id, file).await;
            }
            bot.send_message(
                chat_id,
                format!(
                    "Auto-rename applied\n\nOriginal: {original}\nNew name: {renamed}\n\nProcessing file..."
                ),
            )
            .await?;
            execute_rename(&bot, &state, profile, &file, &renamed).await
        }
        RenameMode::Ai => {
            let original = file.display_name().to_string();
            let suggestion = ai_suggest_name(&original);
            if suggestion == original {
                return prompt_manual_rename(&bot, &state, profile.user_id, file).await;
            }
            bot.send_message(
                chat_id,
                format!(
                    "AI rename suggestion\n\nOriginal: {original}\nSuggestion: {suggestion}\n\nProcessing file..."
                ),
            )
            .await?;
            execute_rename(&bot, &state, profile, &file, &suggestion).await
        }
    }
}

async fn prompt_manual_rename(
    bot: &Bot,
    state: &Arc<BotState>,
    user_id: i64,
    file: MediaFile,
) -> HandlerResult {
    let chat_id = file.chat_id;
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("Upload unchanged", "rename_keep")],
        vec![InlineKeyboardButton::callback("Cancel", "rename_cancel")],
    ]);
    let prompt = bot
        .send_message(chat_id, MANUAL_PROMPT)
        .reply_markup(keyboard)
        .await?;
    schedule_prompt(
        state,
        user_id,
        AwaitedInput::NewFileName(file),
        Some((chat_id, prompt.id)),
    );
    Ok(())
}

/// Filename arriving while a manual-rename prompt is pending.
pub async fn manual_rename_input(
    bot: Bot,
    state: Arc<BotState>,
    msg: &Message,
    entry: &PendingEntry,
    file: MediaFile,
    new_name: &str,
) -> HandlerResult {
    // tidy up the chat: the user's reply and the prompt itself
    let _ = bot.delete_message(msg.chat.id, msg.id).await;
    if let Some((chat_id, message_id)) = entry.panel {
        let _ = bot.delete_message(chat_id, message_id).await;
    }

    if !is_valid_filename(new_name) {
        let sent = bot.send_message(msg.chat.id, INVALID_NAME_MESSAGE).await?;
        delete_later(bot, msg.chat.id, sent.id, Duration::from_secs(3));
        return Ok(());
    }

    let profile = ensure_user(&state, msg).await?;
    execute_rename(&bot, &state, profile, &file, new_name).await
}

/// `/rename <new name>` replying to a media message.
pub async fn rename_command(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    new_name: String,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let new_name = new_name.trim();

    let Some(file) = msg.reply_to_message().and_then(MediaFile::from_message) else {
        bot.send_message(chat_id, NO_FILE_MESSAGE).await?;
        return Ok(());
    };
    if new_name.is_empty() {
        bot.send_message(chat_id, RENAME_USAGE).await?;
        return Ok(());
    }
    if !is_valid_filename(new_name) {
        bot.send_message(chat_id, INVALID_NAME_MESSAGE).await?;
        return Ok(());
    }

    let profile = ensure_user(&state, &msg).await?;
    execute_rename(&bot, &state, profile, &file, new_name).await
}

/// Spends a token (unless premium is active), then downloads, renames and
/// re-uploads the file. Upload failures are reported and do not refund the
/// token; there is no cross-step rollback.
async fn execute_rename(
    bot: &Bot,
    state: &Arc<BotState>,
    mut profile: UserProfile,
    file: &MediaFile,
    new_name: &str,
) -> HandlerResult {
    let chat_id = file.chat_id;

    // a user-set prefix/suffix can smuggle reserved characters into an
    // auto-generated name, so every path is checked here again
    if !is_valid_filename(new_name) {
        bot.send_message(chat_id, INVALID_NAME_MESSAGE).await?;
        return Ok(());
    }

    let mut conn = state.conn().await?;

    if !profile.premium_active(Utc::now())
        && !wallet::spend_one(&mut conn, profile.user_id).await?
    {
        bot.send_message(chat_id, OUT_OF_TOKENS_MESSAGE).await?;
        return Ok(());
    }

    let status = bot.send_message(chat_id, "Downloading...").await?;

    match transfer(bot, &profile, file, new_name).await {
        Ok(()) => {
            let _ = bot.delete_message(chat_id, status.id).await;
            bot.send_message(chat_id, format!("File renamed to: {new_name}"))
                .await?;
            profile.rename_count += 1;
            profile.save(&mut conn).await?;
        }
        Err(err) => {
            error!(user_id = profile.user_id, %err, "rename upload failed");
            bot.edit_message_text(chat_id, status.id, format!("Rename failed: {err}"))
                .await?;
        }
    }
    Ok(())
}

/// Download into a per-user temp dir, then re-upload under the new name
/// with the user's caption, thumbnail and destination applied.
async fn transfer(
    bot: &Bot,
    profile: &UserProfile,
    file: &MediaFile,
    new_name: &str,
) -> Result<(), BotError> {
    let dir = std::env::temp_dir().join(format!("renamebot-{}", profile.user_id));
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(new_name);

    let result = transfer_inner(bot, profile, file, new_name, &path).await;

    // best-effort cleanup regardless of outcome
    let _ = tokio::fs::remove_file(&path).await;
    result
}

async fn transfer_inner(
    bot: &Bot,
    profile: &UserProfile,
    file: &MediaFile,
    new_name: &str,
    path: &Path,
) -> Result<(), BotError> {
    let remote = bot.get_file(file.file_id.clone()).await?;
    let mut dst = tokio::fs::File::create(path).await?;
    bot.download_file(&remote.path, &mut dst).await?;
    dst.flush().await?;
    drop(dst);

    let thumb_path = download_thumbnail(bot, profile, path).await;
    let caption = build_caption(profile.caption.as_deref(), new_name, file.file_size);
    let (target, thread) = resolve_destination(profile, file.chat_id);

    let as_video = match file.kind {
        MediaKind::Video => true,
        MediaKind::Document => {
            profile.send_as == SendAs::Media && has_video_extension(new_name)
        }
        MediaKind::Audio => false,
    };

    if as_video {
        let mut req = bot
            .send_video(target, InputFile::file(path))
            .caption(caption)
            .supports_streaming(true);
        if let Some(thumb) = &thumb_path {
            req = req.thumbnail(InputFile::file(thumb));
        }
        if let Some(thread) = thread {
            req = req.message_thread_id(thread);
        }
        req.await?;
    } else if file.kind == MediaKind::Audio {
        let mut req = bot.send_audio(target, InputFile::file(path)).caption(caption);
        if let Some(thumb) = &thumb_path {
            req = req.thumbnail(InputFile::file(thumb));
        }
        if let Some(thread) = thread {
            req = req.message_thread_id(thread);
        }
        req.await?;
    } else {
        let mut req = bot
            .send_document(target, InputFile::file(path))
            .caption(caption);
        if let Some(thumb) = &thumb_path {
            req = req.thumbnail(InputFile::file(thumb));
        }
        if let Some(thread) = thread {
            req = req.message_thread_id(thread);
        }
        req.await?;
    }

    if let Some(thumb) = thumb_path {
        let _ = tokio::fs::remove_file(thumb).await;
    }
    Ok(())
}

/// Telegram wants thumbnails uploaded as files, so the stored photo id is
/// fetched into the temp dir next to the renamed file. Failures degrade to
/// "no thumbnail".
async fn download_thumbnail(bot: &Bot, profile: &UserProfile, beside: &Path) -> Option<PathBuf> {
    let file_id = profile.thumbnail_file_id.as_ref()?;
    let thumb_path = beside.with_file_name(format!("thumb-{}.jpg", profile.user_id));

    let fetch = async {
        let remote = bot.get_file(file_id.clone()).await?;
        let mut dst = tokio::fs::File::create(&thumb_path).await?;
        bot.download_file(&remote.path, &mut dst).await?;
        dst.flush().await?;
        Ok::<(), BotError>(())
    };
    match fetch.await {
        Ok(()) => Some(thumb_path),
        Err(err) => {
            warn!(user_id = profile.user_id, %err, "thumbnail fetch failed, uploading without it");
            None
        }
    }
}

fn build_caption(template: Option<&str>, new_name: &str, file_size: u64) -> String {
    match template {
        Some(template) => template
            .replace("{filename}", new_name)
            .replace("{filesize}", &readable_file_size(file_size)),
        None => new_name.to_string(),
    }
}

/// `-100…` or `-100…:topic` from the settings, falling back to the chat the
/// file came from.
pub fn parse_upload_destination(raw: &str) -> Option<(ChatId, Option<ThreadId>)> {
    let raw = raw.trim();
    let (chat, topic) = match raw.split_once(':') {
        Some((chat, topic)) => (chat, Some(topic)),
        None => (raw, None),
    };
    let chat_id = chat.trim().parse::<i64>().ok()?;
    let thread = match topic {
        Some(topic) => Some(ThreadId(MessageId(topic.trim().parse::<i32>().ok()?))),
        None => None,
    };
    Some((ChatId(chat_id), thread))
}

fn resolve_destination(profile: &UserProfile, fallback: ChatId) -> (ChatId, Option<ThreadId>) {
    profile
        .upload_destination
        .as_deref()
        .and_then(parse_upload_destination)
        .unwrap_or((fallback, None))
}

fn has_video_extension(name: &str) -> bool {
    let lowered = name.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

/// `/analyze` replying to a media message.
pub async fn analyze_command(bot: Bot, msg: Message) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(file) = msg.reply_to_message().and_then(MediaFile::from_message) else {
        bot.send_message(chat_id, NO_FILE_MESSAGE).await?;
        return Ok(());
    };

    let name = file.display_name();
    let findings = analyze_filename(name);

    let mut text = format!(
        "File analysis\n\nFile: {name}\nSize: {}\n\n",
        readable_file_size(file.file_size)
    );
    if findings.is_empty() {
        text.push_str("No issues found. The filename looks good.");
    } else {
        text.push_str("Issues found:\n");
        for (i, finding) in findings.iter().enumerate() {
            text.push_str(&format!("{}. {finding}\n", i + 1));
        }
    }

    bot.send_message(chat_id, text).await?;
    Ok(())
}

pub async fn batchrename_command(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, texts::BATCH_TXT).await?;
    Ok(())
}

/// Buttons on the manual-rename prompt.
pub async fn callback_handle(bot: Bot, state: Arc<BotState>, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let user_id = q.from.id.0 as i64;
    let panel = q
        .message
        .as_ref()
        .and_then(|m| m.regular_message())
        .map(|m| (m.chat.id, m.id));

    match q.data.as_deref().unwrap_or_default() {
        "rename_keep" => {
            // the prompt may already have expired; then there is nothing to send
            if let Some(entry) = state.pending.consume(user_id, InputKind::Text) {
                if let AwaitedInput::NewFileName(file) = entry.awaited {
                    bot.copy_message(file.chat_id, file.chat_id, file.message_id)
                        .await?;
                }
            }
            if let Some((chat_id, message_id)) = panel {
                let _ = bot.delete_message(chat_id, message_id).await;
            }
        }
        "rename_cancel" => {
            state.pending.clear(user_id);
            if let Some((chat_id, message_id)) = panel {
                let _ = bot.delete_message(chat_id, message_id).await;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_parses_plain_and_topic_forms() {
        assert_eq!(
            parse_upload_destination("-1001234567"),
            Some((ChatId(-1001234567), None))
        );
        assert_eq!(
            parse_upload_destination("-1001234567:42"),
            Some((ChatId(-1001234567), Some(ThreadId(MessageId(42)))))
        );
        assert_eq!(parse_upload_destination("not a chat"), None);
        assert_eq!(parse_upload_destination("-100123:abc"), None);
    }

    #[test]
    fn caption_template_variables_are_substituted() {
        assert_eq!(
            build_caption(Some("{filename} ({filesize})"), "movie.mkv", 2048),
            "movie.mkv (2.00 KB)"
        );
        assert_eq!(build_caption(None, "movie.mkv", 0), "movie.mkv");
    }

    #[test]
    fn video_extensions_are_case_insensitive() {
        assert!(has_video_extension("Movie.MKV"));
        assert!(has_video_extension("clip.mp4"));
        assert!(!has_video_extension("track.mp3"));
    }
}
