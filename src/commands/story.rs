//! Implements the `/story` command.
//!
//! The bot replies with a text file listing every stored media link.

use poise::CreateReply;
use serenity::CreateAttachment;
use tracing::instrument;

use crate::error::UserError;
use crate::lib::i18n::Msg;
use crate::serenity;
use crate::Context;
use crate::GlipaError;

/// Name of the attached file.
const STORY_FILE: &str = "media_story.txt";

/// Send a file with all stored media URLs
#[instrument(skip(ctx))]
#[poise::command(slash_command)]
pub async fn story(ctx: Context<'_>) -> Result<(), GlipaError> {
    let data = ctx.data();
    let links = data.library.links().await;
    if links.is_empty() {
        return Err(UserError::NoMediaStored.into());
    }

    let count = links.len();
    let lang = data.settings.language().await;
    let file = CreateAttachment::bytes(links.join("\n").into_bytes(), STORY_FILE);
    let reply = CreateReply::default()
        .content(Msg::MediaStory { count }.text(lang))
        .attachment(file);

    ctx.send(reply).await?;
    tracing::info!("Sent media story with {count} items.");
    Ok(())
}
