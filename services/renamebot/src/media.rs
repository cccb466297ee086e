use teloxide::types::{ChatId, Message, MessageId};

/// Attachment kind the bot can rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Document,
    Video,
    Audio,
}

/// Flattened view of a renameable attachment, so handlers never probe the
/// message for document/video/audio themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub kind: MediaKind,
    pub file_id: String,
    pub file_name: Option<String>,
    pub file_size: u64,
    /// Where the attachment message lives, for copy-without-rename.
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl MediaFile {
    pub fn from_message(msg: &Message) -> Option<Self> {
        let (kind, file_id, file_name, file_size) = if let Some(doc) = msg.document() {
            (
                MediaKind::Document,
                doc.file.id.clone(),
                doc.file_name.clone(),
                doc.file.size,
            )
        } else if let Some(video) = msg.video() {
            (
                MediaKind::Video,
                video.file.id.clone(),
                video.file_name.clone(),
                video.file.size,
            )
        } else if let Some(audio) = msg.audio() {
            (
                MediaKind::Audio,
                audio.file.id.clone(),
                audio.file_name.clone(),
                audio.file.size,
            )
        } else {
            return None;
        };

        Some(Self {
            kind,
            file_id,
            file_name,
            file_size: u64::from(file_size),
            chat_id: msg.chat.id,
            message_id: msg.id,
        })
    }

    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("Unknown")
    }
}

pub fn readable_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_render_with_the_right_unit() {
        assert_eq!(readable_file_size(0), "0 B");
        assert_eq!(readable_file_size(512), "512 B");
        assert_eq!(readable_file_size(2048), "2.00 KB");
        assert_eq!(readable_file_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(readable_file_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn display_name_falls_back_when_unnamed() {
        let file = MediaFile {
            kind: MediaKind::Video,
            file_id: "abc".into(),
            file_name: None,
            file_size: 1,
            chat_id: ChatId(1),
            message_id: MessageId(1),
        };
        assert_eq!(file.display_name(), "Unknown");
    }
}
