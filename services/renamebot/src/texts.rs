//! Static panel texts shared between the command handlers and the
//! navigation callbacks.

pub fn start_text(first_name: &str) -> String {
    format!(
        "Hi {first_name}!\n\n\
         I rename documents, videos and audio files for you.\n\
         Send me a file, or reply to one with /rename <new name>.\n\n\
         /settings - configure renaming\n\
         /token - check your balance\n\
         /help - the full command list"
    )
}

pub const HELP_TXT: &str = "\
Commands:

/settings - settings panel (thumbnail, caption, prefix, suffix, \
remove-words rules, rename mode, upload destination)
/rename <new name> - rename the replied file
/autorename - auto-rename status
/analyze - inspect the replied file's name
/batchrename - about batch renaming

/token - token balance and premium status
/gentoken - generate a token redemption link
/donate - support the project
/premium - premium info
/plan - premium plans
/bought - submit a payment screenshot

Every rename costs one token unless premium is active.";

pub const ABOUT_TXT: &str = "\
A file rename bot.

Supported inputs: documents, videos, audio files.
Rename modes: Manual, Auto (prefix/suffix/remove-words rules), AI \
(heuristic cleanup of release names).";

pub const DONATE_TXT: &str = "\
Donations keep the bot running.

If it saved you some time, consider supporting the project - reach out \
through the support chat (https://t.me/renamebot_support) for details.";

pub const PREMIUM_TXT: &str = "\
Premium removes the token cost: unlimited renames while the subscription \
is active.

Use /plan to see the available plans, then /bought with a payment \
screenshot to get activated. Questions: https://t.me/renamebot_support";

pub const PLANS_TXT: &str = "\
Premium plans:

- 1 month
- 6 months
- 1 year
- lifetime

After paying, reply to your payment screenshot with /bought and an admin \
will activate your subscription.";

pub const CAPTION_TXT: &str = "\
A custom caption is attached to every uploaded file.

Available variables:
{filename} - the new file name
{filesize} - readable file size

Without a caption the file name is used.";

pub const THUMBNAIL_TXT: &str = "\
A custom thumbnail is attached to every uploaded file.

Set it from /settings by sending a photo when prompted; uploading a new \
photo replaces the old thumbnail.";

pub const METADATA_TXT: &str = "\
Metadata fields (video title, author, audio title, subtitle title) are \
stored with your profile and shown in the settings panel.

Configure them from /settings -> Set Metadata.";

pub const BATCH_TXT: &str = "\
Batch rename mode

Send multiple files and each one is processed according to your rename \
settings. Current behaviour: automatic processing based on your settings.";
