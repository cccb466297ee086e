use std::sync::Arc;
use std::time::Duration;

use common::{RenameMode, SendAs, UserProfile};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message},
};

use crate::auth::{ensure_user, ensure_user_by_id};
use crate::commands::delete_later;
use crate::errors::HandlerResult;
use crate::session::{schedule_prompt, AwaitedInput, PendingEntry};
use crate::settings::BotState;

const THUMBNAIL_PROMPT: &str = "Thumbnail configuration\n\n\
    Send a photo to save it as your custom thumbnail.\n\
    Timeout: 60 sec.";
const CAPTION_PROMPT: &str = "Caption configuration\n\n\
    Send your custom caption for uploaded files.\n\
    Timeout: 60 sec.\n\n\
    Available variables:\n\
    {filename} - the new file name\n\
    {filesize} - readable file size";
const PREFIX_PROMPT: &str = "Prefix configuration\n\n\
    The prefix is attached to the front of the file name.\n\n\
    Example: prefix @MyChannel gives\n\
    @MyChannel Fast_And_Furious.mkv\n\n\
    Send the prefix. Timeout: 60 sec.";
const SUFFIX_PROMPT: &str = "Suffix configuration\n\n\
    The suffix is attached to the end of the file name, before the \
    extension.\n\n\
    Example: suffix @MyChannel gives\n\
    Fast_And_Furious @MyChannel.mkv\n\n\
    Send the suffix. Timeout: 60 sec.";
const REMOVE_WORDS_PROMPT: &str = "Remove/replace words from file names\n\n\
    find1:change1|find2:change2|...\n\n\
    - 'find' is the word to change\n\
    - 'change' is its replacement; leave it out to delete the word\n\
    - '|' separates the pairs\n\n\
    Example: apple:banana|the:\n\
    changes every 'apple' to 'banana' and removes every 'the'.\n\n\
    Send the rule. Timeout: 60 sec.";
const DESTINATION_INFO: &str = "Upload destination configuration\n\n\
    With a destination set, renamed files are uploaded to your channel or \
    group instead of this chat.\n\n\
    Steps:\n\
    1. Add the bot to your channel or group as an admin.\n\
    2. Send /id there to get a chat id starting with -100.\n\
    3. Send that id here.\n\n\
    A group topic can be targeted with -100xxx:topic_id.";
const DESTINATION_PROMPT: &str =
    "Send the upload destination id. Timeout: 60 sec.";

/// `/settings` - the main panel.
pub async fn settings_command(bot: Bot, msg: Message, state: Arc<BotState>) -> HandlerResult {
    let profile = ensure_user(&state, &msg).await?;
    bot.send_message(msg.chat.id, render_summary(&profile))
        .reply_markup(main_keyboard(&profile))
        .await?;
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn or_none(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "None",
    }
}

fn render_summary(profile: &UserProfile) -> String {
    let auto_status = if profile.rename_mode == RenameMode::Manual {
        "Disabled (Manual Mode)"
    } else {
        "Enabled"
    };
    format!(
        "Settings for {}\n\n\
         Custom thumbnail: {}\n\
         Upload type: {}\n\
         Prefix: {}\n\
         Suffix: {}\n\n\
         Upload destination: {}\n\
         Sample video: {}\n\
         Screenshot: {}\n\n\
         Metadata: {}\n\
         Remove/replace words: {}\n\
         Rename mode: {}\n\
         Auto-rename: {}",
        profile.first_name,
        if profile.thumbnail_file_id.is_some() {
            "Exists"
        } else {
            "Not set"
        },
        profile.send_as.to_string().to_uppercase(),
        or_none(profile.prefix.as_deref()),
        or_none(profile.suffix.as_deref()),
        or_none(profile.upload_destination.as_deref()),
        on_off(profile.sample_video),
        on_off(profile.screenshot_enabled),
        on_off(profile.metadata_enabled),
        or_none(profile.remove_words.as_deref()),
        profile.rename_mode,
        auto_status,
    )
}

fn main_keyboard(profile: &UserProfile) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("Choose Format", "setting_send_as"),
            InlineKeyboardButton::callback("Upload Destination", "setting_upload_dest"),
        ],
        vec![
            InlineKeyboardButton::callback("Set Thumbnail", "setting_thumbnail"),
            InlineKeyboardButton::callback("Set Caption", "setting_caption"),
        ],
        vec![
            InlineKeyboardButton::callback("Set Prefix", "setting_prefix"),
            InlineKeyboardButton::callback("Set Suffix", "setting_suffix"),
        ],
        vec![
            InlineKeyboardButton::callback(
                format!("Rename Mode | {}", profile.rename_mode),
                "setting_rename_mode",
            ),
            InlineKeyboardButton::callback("Set Metadata", "setting_metadata"),
        ],
        vec![
            InlineKeyboardButton::callback("Remove Words", "setting_remove_words"),
            InlineKeyboardButton::callback(
                format!("Sample Video: {}", on_off(profile.sample_video)),
                "setting_sample_video",
            ),
        ],
        vec![InlineKeyboardButton::callback(
            format!("Screenshot: {}", on_off(profile.screenshot_enabled)),
            "setting_screenshot",
        )],
        vec![InlineKeyboardButton::callback("Close", "setting_close")],
    ])
}

fn back_close() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Back", "setting_back"),
        InlineKeyboardButton::callback("Close", "setting_close"),
    ]])
}

fn metadata_text(profile: &UserProfile) -> String {
    format!(
        "Metadata settings for {}\n\n\
         Metadata: {}\n\
         Video title: {}\n\
         Video author: {}\n\
         Audio title: {}\n\
         Subtitle title: {}",
        profile.first_name,
        on_off(profile.metadata_enabled),
        or_none(profile.metadata.title.as_deref()),
        or_none(profile.metadata.author.as_deref()),
        or_none(profile.metadata.audio.as_deref()),
        or_none(profile.metadata.subtitle.as_deref()),
    )
}

fn metadata_keyboard(profile: &UserProfile) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("Metadata: {}", on_off(profile.metadata_enabled)),
            "meta_toggle",
        )],
        vec![InlineKeyboardButton::callback("Set Video Title", "meta_video_title")],
        vec![InlineKeyboardButton::callback("Set Video Author", "meta_video_author")],
        vec![InlineKeyboardButton::callback("Set Audio Title", "meta_audio_title")],
        vec![InlineKeyboardButton::callback("Set Subtitle Title", "meta_subtitle_title")],
        vec![
            InlineKeyboardButton::callback("Back", "setting_back"),
            InlineKeyboardButton::callback("Close", "setting_close"),
        ],
    ])
}

fn send_as_text(profile: &UserProfile) -> String {
    format!(
        "Choose format configuration\n\n\
         Current setting: {}\n\n\
         Document: send as a file attachment.\n\
         Media: send video files as streamable video.",
        profile.send_as
    )
}

fn send_as_keyboard(profile: &UserProfile) -> InlineKeyboardMarkup {
    let check = |matches: bool| if matches { " [x]" } else { "" };
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("Send As Document{}", check(profile.send_as == SendAs::Document)),
            "send_as_document",
        )],
        vec![InlineKeyboardButton::callback(
            format!("Send As Media{}", check(profile.send_as == SendAs::Media)),
            "send_as_media",
        )],
        vec![
            InlineKeyboardButton::callback("Back", "setting_back"),
            InlineKeyboardButton::callback("Close", "setting_close"),
        ],
    ])
}

fn rename_mode_keyboard(profile: &UserProfile) -> InlineKeyboardMarkup {
    let check = |mode: RenameMode| if profile.rename_mode == mode { " [x]" } else { "" };
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("Auto Rename Mode{}", check(RenameMode::Auto)),
            "rename_mode_auto",
        )],
        vec![InlineKeyboardButton::callback(
            format!("Manual Mode{}", check(RenameMode::Manual)),
            "rename_mode_manual",
        )],
        vec![InlineKeyboardButton::callback(
            format!("AI Autorename{}", check(RenameMode::Ai)),
            "rename_mode_ai",
        )],
        vec![
            InlineKeyboardButton::callback("Back", "setting_back"),
            InlineKeyboardButton::callback("Close", "setting_close"),
        ],
    ])
}

/// All `setting_*`, `send_as_*`, `rename_mode_*`, `meta_*` and `dest_*`
/// callbacks.
pub async fn callback_handle(bot: Bot, state: Arc<BotState>, q: CallbackQuery) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    let Some(message) = q.message.as_ref().and_then(|m| m.regular_message()) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.id;
    let data = q.data.as_deref().unwrap_or_default().to_string();

    let mut profile = ensure_user_by_id(
        &state,
        user_id,
        &q.from.first_name,
        q.from.username.as_deref(),
    )
    .await?;

    // prompting sub-panels register a pending entry pointing back at this panel
    let panel = Some((chat_id, message_id));

    match data.as_str() {
        "setting_close" => {
            bot.answer_callback_query(q.id.clone()).await?;
            state.pending.clear(user_id);
            bot.delete_message(chat_id, message_id).await?;
        }
        "setting_back" => {
            bot.answer_callback_query(q.id.clone()).await?;
            state.pending.clear(user_id);
            bot.edit_message_text(chat_id, message_id, render_summary(&profile))
                .reply_markup(main_keyboard(&profile))
                .await?;
        }
        "setting_send_as" => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(chat_id, message_id, send_as_text(&profile))
                .reply_markup(send_as_keyboard(&profile))
                .await?;
        }
        "setting_upload_dest" => {
            bot.answer_callback_query(q.id.clone()).await?;
            let text = format!(
                "{DESTINATION_INFO}\n\nCurrent destination: {}",
                or_none(profile.upload_destination.as_deref())
            );
            let keyboard = InlineKeyboardMarkup::new(vec![
                vec![InlineKeyboardButton::callback("Add in Channel", "dest_add_channel")],
                vec![InlineKeyboardButton::callback("Add in Group", "dest_add_group")],
                vec![
                    InlineKeyboardButton::callback("Back", "setting_back"),
                    InlineKeyboardButton::callback("Close", "setting_close"),
                ],
            ]);
            bot.edit_message_text(chat_id, message_id, text)
                .reply_markup(keyboard)
                .await?;
        }
        "setting_thumbnail" => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(chat_id, message_id, THUMBNAIL_PROMPT)
                .reply_markup(back_close())
                .await?;
            schedule_prompt(&state, user_id, AwaitedInput::Thumbnail, panel);
        }
        "setting_caption" => {
            bot.answer_callback_query(q.id.clone()).await?;
            let text = format!(
                "{CAPTION_PROMPT}\n\nCurrent caption: {}",
                or_none(profile.caption.as_deref())
            );
            bot.edit_message_text(chat_id, message_id, text)
                .reply_markup(back_close())
                .await?;
            schedule_prompt(&state, user_id, AwaitedInput::Caption, panel);
        }
        "setting_prefix" => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(chat_id, message_id, PREFIX_PROMPT)
                .reply_markup(back_close())
                .await?;
            schedule_prompt(&state, user_id, AwaitedInput::Prefix, panel);
        }
        "setting_suffix" => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(chat_id, message_id, SUFFIX_PROMPT)
                .reply_markup(back_close())
                .await?;
            schedule_prompt(&state, user_id, AwaitedInput::Suffix, panel);
        }
        "setting_remove_words" => {
            bot.answer_callback_query(q.id.clone()).await?;
            let text = format!(
                "{REMOVE_WORDS_PROMPT}\n\nCurrent rule: {}",
                or_none(profile.remove_words.as_deref())
            );
            bot.edit_message_text(chat_id, message_id, text)
                .reply_markup(back_close())
                .await?;
            schedule_prompt(&state, user_id, AwaitedInput::RemoveWords, panel);
        }
        "setting_rename_mode" => {
            bot.answer_callback_query(q.id.clone()).await?;
            let text = format!(
                "Rename mode configuration\n\nCurrent mode: {}",
                profile.rename_mode
            );
            bot.edit_message_text(chat_id, message_id, text)
                .reply_markup(rename_mode_keyboard(&profile))
                .await?;
        }
        "setting_metadata" => {
            bot.answer_callback_query(q.id.clone()).await?;
            state.pending.clear(user_id);
            bot.edit_message_text(chat_id, message_id, metadata_text(&profile))
                .reply_markup(metadata_keyboard(&profile))
                .await?;
        }
        "setting_sample_video" => {
            profile.sample_video = !profile.sample_video;
            save(&state, &profile).await?;
            bot.answer_callback_query(q.id.clone())
                .text(format!("Sample video {}", on_off(profile.sample_video)))
                .await?;
            bot.edit_message_text(chat_id, message_id, render_summary(&profile))
                .reply_markup(main_keyboard(&profile))
                .await?;
        }
        "setting_screenshot" => {
            profile.screenshot_enabled = !profile.screenshot_enabled;
            save(&state, &profile).await?;
            bot.answer_callback_query(q.id.clone())
                .text(format!("Screenshot {}", on_off(profile.screenshot_enabled)))
                .await?;
            bot.edit_message_text(chat_id, message_id, render_summary(&profile))
                .reply_markup(main_keyboard(&profile))
                .await?;
        }
        "send_as_document" | "send_as_media" => {
            profile.send_as = if data == "send_as_media" {
                SendAs::Media
            } else {
                SendAs::Document
            };
            save(&state, &profile).await?;
            bot.answer_callback_query(q.id.clone())
                .text(format!("Send as {}", profile.send_as))
                .await?;
            bot.edit_message_text(chat_id, message_id, render_summary(&profile))
                .reply_markup(main_keyboard(&profile))
                .await?;
        }
        "rename_mode_auto" | "rename_mode_manual" | "rename_mode_ai" => {
            profile.rename_mode = match data.as_str() {
                "rename_mode_auto" => RenameMode::Auto,
                "rename_mode_ai" => RenameMode::Ai,
                _ => RenameMode::Manual,
            };
            save(&state, &profile).await?;
            bot.answer_callback_query(q.id.clone())
                .text(format!("Rename mode set to {}", profile.rename_mode))
                .await?;
            bot.edit_message_text(chat_id, message_id, render_summary(&profile))
                .reply_markup(main_keyboard(&profile))
                .await?;
        }
        "meta_toggle" => {
            profile.metadata_enabled = !profile.metadata_enabled;
            save(&state, &profile).await?;
            bot.answer_callback_query(q.id.clone())
                .text(format!("Metadata {}", on_off(profile.metadata_enabled)))
                .await?;
            bot.edit_message_text(chat_id, message_id, metadata_text(&profile))
                .reply_markup(metadata_keyboard(&profile))
                .await?;
        }
        "meta_video_title" | "meta_video_author" | "meta_audio_title" | "meta_subtitle_title" => {
            bot.answer_callback_query(q.id.clone()).await?;
            let (awaited, prompt) = match data.as_str() {
                "meta_video_title" => (AwaitedInput::MetaTitle, "Send the video title."),
                "meta_video_author" => (AwaitedInput::MetaAuthor, "Send the video author."),
                "meta_audio_title" => (AwaitedInput::MetaAudio, "Send the audio title."),
                _ => (AwaitedInput::MetaSubtitle, "Send the subtitle title."),
            };
            bot.edit_message_text(
                chat_id,
                message_id,
                format!("{prompt} Timeout: 60 sec."),
            )
            .reply_markup(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback("Back", "setting_metadata"),
                InlineKeyboardButton::callback("Close", "setting_close"),
            ]]))
            .await?;
            schedule_prompt(&state, user_id, awaited, panel);
        }
        "dest_add_channel" | "dest_add_group" => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(chat_id, message_id, DESTINATION_PROMPT)
                .reply_markup(InlineKeyboardMarkup::new(vec![vec![
                    InlineKeyboardButton::callback("Back", "setting_upload_dest"),
                    InlineKeyboardButton::callback("Close", "setting_close"),
                ]]))
                .await?;
            schedule_prompt(&state, user_id, AwaitedInput::UploadDestination, panel);
        }
        _ => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}

/// Text arriving while a settings prompt is pending. Saves the field, shows
/// a short-lived confirmation and edits the panel back to its parent view.
pub async fn apply_text_setting(
    bot: Bot,
    state: Arc<BotState>,
    msg: &Message,
    entry: &PendingEntry,
    text: &str,
) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    // the raw input should not linger in the chat
    let _ = bot.delete_message(msg.chat.id, msg.id).await;

    let mut profile =
        ensure_user_by_id(&state, user_id, &from.first_name, from.username.as_deref()).await?;

    let value = Some(text.to_string());
    let (confirmation, back_to_metadata) = match &entry.awaited {
        AwaitedInput::Prefix => {
            profile.prefix = value;
            (format!("Prefix saved: {text}"), false)
        }
        AwaitedInput::Suffix => {
            profile.suffix = value;
            (format!("Suffix saved: {text}"), false)
        }
        AwaitedInput::RemoveWords => {
            profile.remove_words = value;
            (format!("Remove-words rule saved: {text}"), false)
        }
        AwaitedInput::Caption => {
            profile.caption = value;
            (format!("Caption saved: {text}"), false)
        }
        AwaitedInput::UploadDestination => {
            if crate::commands::files::parse_upload_destination(text).is_none() {
                let sent = bot
                    .send_message(
                        msg.chat.id,
                        "That does not look like a chat id. Expected -100xxx or -100xxx:topic_id.",
                    )
                    .await?;
                delete_later(bot, msg.chat.id, sent.id, Duration::from_secs(5));
                return Ok(());
            }
            profile.upload_destination = value;
            (format!("Upload destination saved: {text}"), false)
        }
        AwaitedInput::MetaTitle => {
            profile.metadata.title = value;
            (format!("Video title saved: {text}"), true)
        }
        AwaitedInput::MetaAuthor => {
            profile.metadata.author = value;
            (format!("Video author saved: {text}"), true)
        }
        AwaitedInput::MetaAudio => {
            profile.metadata.audio = value;
            (format!("Audio title saved: {text}"), true)
        }
        AwaitedInput::MetaSubtitle => {
            profile.metadata.subtitle = value;
            (format!("Subtitle title saved: {text}"), true)
        }
        // thumbnail and rename input never reach this handler
        _ => return Ok(()),
    };

    save(&state, &profile).await?;

    let sent = bot.send_message(msg.chat.id, confirmation).await?;
    delete_later(bot.clone(), msg.chat.id, sent.id, Duration::from_secs(2));

    if let Some((chat_id, message_id)) = entry.panel {
        if back_to_metadata {
            bot.edit_message_text(chat_id, message_id, metadata_text(&profile))
                .reply_markup(metadata_keyboard(&profile))
                .await?;
        } else {
            bot.edit_message_text(chat_id, message_id, render_summary(&profile))
                .reply_markup(main_keyboard(&profile))
                .await?;
        }
    }
    Ok(())
}

/// Photo arriving while the thumbnail prompt is pending.
pub async fn apply_thumbnail(
    bot: Bot,
    state: Arc<BotState>,
    msg: &Message,
    entry: &PendingEntry,
) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    let _ = bot.delete_message(msg.chat.id, msg.id).await;

    let mut profile =
        ensure_user_by_id(&state, user_id, &from.first_name, from.username.as_deref()).await?;
    profile.thumbnail_file_id = Some(photo.file.id.clone());
    save(&state, &profile).await?;

    let sent = bot.send_message(msg.chat.id, "Thumbnail saved.").await?;
    delete_later(bot.clone(), msg.chat.id, sent.id, Duration::from_secs(2));

    if let Some((chat_id, message_id)) = entry.panel {
        bot.edit_message_text(chat_id, message_id, render_summary(&profile))
            .reply_markup(main_keyboard(&profile))
            .await?;
    }
    Ok(())
}

async fn save(state: &Arc<BotState>, profile: &UserProfile) -> HandlerResult {
    let mut conn = state.conn().await?;
    profile.save(&mut conn).await?;
    Ok(())
}
