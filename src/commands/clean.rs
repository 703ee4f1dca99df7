//! Implements the `/clean` command.
//!
//! Direct `media.tenor.com` links expire, so they are dropped from storage.
//! `tenor.com/view/...` pages are kept.

use tracing::instrument;

use crate::error::UserError;
use crate::lib::i18n::Msg;
use crate::Context;
use crate::GlipaError;

/// Remove all media.tenor.com links from storage
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn clean(ctx: Context<'_>) -> Result<(), GlipaError> {
    let data = ctx.data();
    let count = data.library.clean_tenor().await?;
    if count == 0 {
        return Err(UserError::NoTenorLinks.into());
    }

    let lang = data.settings.language().await;
    ctx.say(Msg::Cleaned { count }.text(lang)).await?;
    Ok(())
}
