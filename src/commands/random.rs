//! Implements the `/random` command.

use tracing::instrument;

use crate::error::UserError;
use crate::Context;
use crate::GlipaError;

/// Send a random media from storage
#[instrument(skip(ctx))]
#[poise::command(slash_command)]
pub async fn random(ctx: Context<'_>) -> Result<(), GlipaError> {
    let data = ctx.data();
    let Some(url) = data.library.random().await else {
        return Err(UserError::NoMediaToSend.into());
    };

    // The link goes in its own message so discord renders it without an embed border.
    ctx.say(data.words.message()).await?;
    ctx.say(&url).await?;

    tracing::info!("Sent random media: {url}");
    Ok(())
}
