//! Implements the `/scan` command.
//!
//! The bot answers right away and walks the channel history in the background,
//! posting the number of new files in the channel once it's done.

use tracing::instrument;

use crate::error::UserError;
use crate::lib;
use crate::lib::i18n::Msg;
use crate::Context;
use crate::GlipaError;

/// Scan channel history for images and GIFs
#[instrument(skip(ctx), fields(channel=%ctx.channel_id()))]
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn scan(ctx: Context<'_>) -> Result<(), GlipaError> {
    let data = ctx.data();
    let channel = ctx.channel_id();

    let Some(guard) = data.scans.begin(channel) else {
        return Err(UserError::ScanInProgress.into());
    };

    let lang = data.settings.language().await;
    // Dropping the guard on failure frees the channel again.
    ctx.say(Msg::ScanStarted.text(lang)).await?;

    lib::scan::spawn(
        ctx.serenity_context().clone(),
        channel,
        data.library.clone(),
        data.settings.clone(),
        guard,
    );
    tracing::info!("Scan task started.");
    Ok(())
}
