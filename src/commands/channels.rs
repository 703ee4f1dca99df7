//! Implements the `/channels` command.
//!
//! Picks up to three text channels the poster sends media to.

use itertools::Itertools;
use serenity::ChannelId;
use serenity::GuildChannel;
use serenity::Mentionable;
use tracing::instrument;

use crate::error::UserError;
use crate::lib::i18n::Msg;
use crate::log::ephemeral_reply;
use crate::serenity;
use crate::Context;
use crate::GlipaError;

/// Set target channels for posting
#[instrument(skip_all)]
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn channels(
    ctx: Context<'_>,
    #[description = "Target channel 1"]
    #[channel_types("Text")]
    channel1: GuildChannel,
    #[description = "Target channel 2 (optional)"]
    #[channel_types("Text")]
    channel2: Option<GuildChannel>,
    #[description = "Target channel 3 (optional)"]
    #[channel_types("Text")]
    channel3: Option<GuildChannel>,
) -> Result<(), GlipaError> {
    let picked = [Some(channel1), channel2, channel3].map(|c| c.map(|c| c.id));
    let targets = target_ids(picked);
    if targets.is_empty() {
        return Err(UserError::NoChannels.into());
    }

    let settings = ctx
        .data()
        .settings
        .update(|s| s.target_channels = targets.clone())
        .await?;

    let mentions = targets.iter().map(|id| id.mention()).join(", ");
    tracing::info!("Target channels updated: {targets:?}");
    ephemeral_reply(
        &ctx,
        Msg::ChannelsSet {
            channels: &mentions,
        }
        .text(settings.language),
    )
    .await;
    Ok(())
}

/// Ids of the given channels, without duplicates and in order.
fn target_ids(channels: impl IntoIterator<Item = Option<ChannelId>>) -> Vec<ChannelId> {
    channels.into_iter().flatten().unique().collect()
}
