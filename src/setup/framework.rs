//! Setup for [poise::Framework]

use crate::commands;
use crate::data::ActiveScans;
use crate::data::Storage;
use crate::lib::poster::Poster;
use crate::serenity;
use crate::Config;
use crate::Data;
use crate::GlipaError;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, GlipaError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config, storage: Storage) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(move |ctx, rdy, fw| framework_setup(ctx, rdy, fw, config, storage))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, GlipaError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: commands::list(),
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Log when commands start
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        // Log when finishing commands
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on startup.
/// Registers commands, starts the poster and builds [Data].
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
    storage: Storage,
) -> poise::BoxFuture<'a, Result<Data, GlipaError>> {
    Box::pin(async move {
        let commands = &fw.options().commands;
        let app_commands = poise::builtins::create_application_commands(commands);

        if let Some(dev_guild) = config.dev_guild() {
            // Guild commands update instantly, useful for development.
            tracing::info!("Registering {} commands on dev guild.", app_commands.len());
            dev_guild.set_commands(ctx, app_commands).await?;
        } else {
            tracing::info!("Registering {} commands globally.", app_commands.len());
            serenity::Command::set_global_commands(ctx, app_commands).await?;
        }

        let bot_name = &rdy.user.name;
        let stored = storage.library.len().await;
        tracing::info!("{bot_name} is ready with {stored} stored media items!");

        Poster {
            library: storage.library.clone(),
            settings: storage.settings.clone(),
            words: storage.words.clone(),
        }
        .spawn(ctx.clone());

        Ok(Data {
            notify_list: config.notify_list(fw),
            library: storage.library,
            settings: storage.settings,
            words: storage.words,
            scans: ActiveScans::default(),
        })
    })
}
