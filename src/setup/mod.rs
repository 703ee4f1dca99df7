//! Builds the discord client.

mod config;
mod framework;

use crate::data::Storage;
use crate::serenity;
use crate::GlipaError;

pub use config::Config;

/// Constructs a [serenity::Client] running the command framework.
pub(super) async fn client(config: Config, storage: Storage) -> Result<serenity::Client, GlipaError> {
    let token = config.token()?;

    // Message content is needed to find links while scanning history.
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config, storage))
        .await?;

    Ok(client)
}
