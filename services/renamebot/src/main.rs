mod auth;
mod commands;
mod errors;
mod media;
mod rename;
mod session;
mod settings;
mod shortener;
mod texts;

use std::sync::Arc;

use dotenvy::dotenv;
use teloxide::{
    dispatching::UpdateFilterExt,
    dptree,
    prelude::*,
    types::{Message, Update},
};
use tracing_subscriber::EnvFilter;

use crate::errors::BotError;
use crate::media::MediaFile;
use crate::settings::{BotConfig, BotState};

#[tokio::main]
async fn main() -> Result<(), BotError> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env();
    let state = Arc::new(BotState::new(config)?);
    let bot = Bot::from_env();

    tracing::info!("starting rename bot");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<commands::AdminCommand>()
                        .endpoint(commands::dispatch_admin_command),
                )
                .branch(
                    dptree::entry()
                        .filter_command::<commands::Command>()
                        .endpoint(commands::dispatch_command),
                )
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.chat.is_private() && msg.photo().is_some()
                    })
                    .endpoint(commands::inputs::photo_input_handle),
                )
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.chat.is_private() && MediaFile::from_message(&msg).is_some()
                    })
                    .endpoint(commands::files::incoming_file_handle),
                )
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.chat.is_private() && msg.text().is_some()
                    })
                    .endpoint(commands::inputs::text_input_handle),
                ),
        )
        .branch(Update::filter_callback_query().endpoint(commands::callback_handle));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
