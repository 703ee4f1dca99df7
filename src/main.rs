//! A discord bot that collects media links from channel history and reposts
//! random ones on a schedule.

mod commands;
mod data;
mod error;
mod lib;
mod log;
mod setup;

pub use poise::serenity_prelude as serenity;

pub use data::Data;
pub use error::GlipaError;
pub use setup::Config;

/// Context passed to every command.
pub type Context<'a> = poise::Context<'a, Data, GlipaError>;

#[tokio::main]
async fn main() -> Result<(), GlipaError> {
    let config = Config::read()?;

    // Kept alive until exit so file logs are flushed.
    let _log_guard = log::install_tracing(&config);

    let data_dir = config.data_dir();
    let storage = data::Storage::open(&data_dir).inspect_err(|e| {
        tracing::error!("Could not open storage in {}: {e}", data_dir.display());
    })?;

    tracing::info!("Starting GlipaBot...");
    let mut client = setup::client(config, storage).await.inspect_err(|e| {
        tracing::error!("Failed to start bot: {e}");
    })?;

    client.start().await?;
    Ok(())
}
