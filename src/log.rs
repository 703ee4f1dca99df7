//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use itertools::Itertools;
use poise::BoxFuture;
use poise::CreateReply;
use poise::FrameworkError;
use serenity::CreateMessage;
use tracing::debug;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::error::UserError;
use crate::lib::i18n::Language;
use crate::lib::i18n::Msg;
use crate::serenity;
use crate::Config;
use crate::Context;
use crate::Data;
use crate::GlipaError;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Setup format layers, tracing subscribers, and installs tracing.
/// The returned guard must be kept alive for file logs to be flushed.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    // Uses local time.
    let timer = fmt::time::ChronoLocal::rfc_3339();
    let debug = config.console_debug();

    // By default, all INFO traces and above are shown.
    let target = if debug {
        Targets::new()
            .with_default(LevelFilter::INFO)
            .with_target(THIS_CRATE, LevelFilter::DEBUG)
    } else {
        Targets::new().with_default(LevelFilter::INFO)
    };

    // Source locations are only shown in debug mode.
    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_level(true)
        .with_target(true)
        .with_timer(timer.clone())
        .with_filter(target.clone());

    // Put file logs in `log_dir` as "{THIS_CRATE}.log.{DATE}", one file per day.
    let (file_layer, guard) = if config.logs_enabled() {
        let prefix = format!("{THIS_CRATE}.log");
        let appender = tracing_appender::rolling::daily(config.log_dir(), prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_file(debug)
            .with_line_number(debug)
            .with_level(true)
            .with_target(true)
            .with_timer(timer)
            .with_writer(writer)
            .compact()
            .with_filter(target);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

/// Defines various behaviors for how to handle errors.
/// [UserError]s get an ephemeral reply in the current language.
/// Unexpected errors are logged, answered and sent to the notify list.
pub fn handle_framework_error(err: FrameworkError<Data, GlipaError>) -> BoxFuture<()> {
    let handler = async move {
        let lang = match err.ctx() {
            Some(ctx) => ctx.data().settings.language().await,
            None => Language::default(),
        };

        match err {
            // ---
            // Errors that should be invisible to users.
            // ---
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                error!("Error while handling event. Event: {event:?} Error: {error}")
            }

            // ---
            // Errors users see but that aren't bugs, logged at debug level.
            // ---
            FrameworkError::Command {
                error: GlipaError::UserError(user_error),
                ctx,
                ..
            } => user_response(&ctx, user_error, lang).await,
            FrameworkError::SubcommandRequired { ctx } => {
                let subcmds = ctx
                    .command()
                    .subcommands
                    .iter()
                    .map(|s| s.name.as_str())
                    .join(", ");
                user_response(&ctx, UserError::MissingSubcommand { subcmds }, lang).await
            }
            FrameworkError::ArgumentParse {
                error, input, ctx, ..
            } => {
                let user_error = UserError::BadArgs { input };
                Response::builder()
                    .ctx(&ctx)
                    .reply(user_error.localized(lang))
                    .source(user_error)
                    .add_info(error.to_string())
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CooldownHit {
                remaining_cooldown,
                ctx,
                ..
            } => user_response(&ctx, UserError::OnCooldown { remaining_cooldown }, lang).await,
            FrameworkError::MissingBotPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingBotPermissions {
                    missing_permissions,
                };
                user_response(&ctx, user_error, lang).await
            }
            FrameworkError::MissingUserPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingUserPermissions {
                    missing_permissions,
                };
                user_response(&ctx, user_error, lang).await
            }
            FrameworkError::NotAnOwner { ctx, .. } => {
                user_response(&ctx, UserError::NotOwner, lang).await
            }
            FrameworkError::GuildOnly { ctx, .. } => {
                user_response(&ctx, UserError::GuildOnly, lang).await
            }
            FrameworkError::DmOnly { ctx, .. } => user_response(&ctx, UserError::DmOnly, lang).await,
            FrameworkError::NsfwOnly { ctx, .. } => {
                user_response(&ctx, UserError::NsfwOnly, lang).await
            }
            FrameworkError::CommandCheckFailed { error, ctx, .. } => {
                let error = GlipaError::CheckFailed {
                    reason: error.map(|e| e.to_string()),
                };
                Response::builder()
                    .ctx(&ctx)
                    .reply(Msg::NeedAdmin.text(lang))
                    .source(error)
                    .build()
                    .send()
                    .await;
            }

            // ---
            // Unexpected errors: users are told, the error is logged and sent
            // to the notify list.
            // ---
            FrameworkError::Command { error, ctx, .. } => {
                let reply = Msg::Error {
                    error: &error.to_string(),
                }
                .text(lang);
                Response::builder()
                    .ctx(&ctx)
                    .reply(reply)
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                let error = GlipaError::Panic { payload };
                let reply = Msg::Error {
                    error: "something went horribly wrong",
                }
                .text(lang);
                Response::builder()
                    .ctx(&ctx)
                    .reply(reply)
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandStructureMismatch {
                description, ctx, ..
            } => {
                let error = GlipaError::CommandStructureMismatch {
                    description: description.to_string(),
                };
                Response::builder()
                    .ctx(&ctx.into())
                    .reply("Command structure mismatch. Please wait until discord catches up to a bot update.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }

            // ---
            // Errors that should be unreachable, only logged.
            // ---
            FrameworkError::UnknownCommand { .. } => {
                error!("Prefix commands are not supported.")
            }
            FrameworkError::UnknownInteraction { interaction, .. } => {
                let name = &interaction.data.name;
                error!("Received unknown interaction: {name}")
            }
            FrameworkError::DynamicPrefix { .. } => {
                error!("Dynamic prefixes are not supported.")
            }
            _ => error!("Received a framework error with no handler."),
        }
    };

    Box::pin(handler)
}

/// Respond to an expected [UserError].
async fn user_response(ctx: &Context<'_>, user_error: UserError, lang: Language) {
    Response::builder()
        .ctx(ctx)
        .reply(user_error.localized(lang))
        .source(user_error)
        .build()
        .send()
        .await;
}

/// Sends an ephemeral reply to the [Context] author.
pub(crate) async fn ephemeral_reply(ctx: &Context<'_>, content: impl Into<String>) {
    let reply = CreateReply::default().ephemeral(true).content(content);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send ephemeral reply. {e}")
    };
}

/// Sends a notification (via private message) to every user in the notify list.
/// If a message fails, only log and don't retry.
async fn notify_bug(ctx: &Context<'_>, content: impl Into<String>) {
    let message = CreateMessage::new().content(content);

    for user in &ctx.data().notify_list {
        if let Err(e) = user.direct_message(ctx, message.clone()).await {
            error!("Failed to send bug notification. {e}");
        }
    }
}

/// Helper function to create debug information from [Context]
fn debug_info(ctx: &Context) -> String {
    let user = &ctx.author().name;
    let cmd = &ctx.command().name;
    let user_input = ctx.invocation_string();
    let channel = ctx.channel_id();
    format!("{user} tried to use {cmd} with {user_input} in {channel}.")
}

/// Structured response to errors.
/// Always logs as at least [debug level](tracing::debug), but is upgraded to
/// [error level](tracing::error) if `is_error` is set.
/// Additionally, notify messages are accompanied by [debug info](debug_info).
#[derive(bon::Builder)]
#[builder(on(String, into))]
struct Response<'a> {
    /// The context of the response
    ctx: &'a Context<'a>,
    /// The reason for this reply, usually the error causing the response.
    #[builder(into)]
    source: GlipaError,
    /// Optional ephemeral reply to user.
    reply: Option<String>,
    /// Additional information to log
    add_info: Option<String>,
    /// Set to `true` to log as error.
    #[builder(default = false)]
    is_error: bool,
    /// Set to `true` to send notifications of the error.
    /// Does nothing if `is_error` is false.
    #[builder(default = false)]
    notify: bool,
}

impl Response<'_> {
    /// Execute the response
    async fn send(&self) {
        let ctx = self.ctx;

        let log_message = match &self.add_info {
            Some(info) => format!("{} | {info}", self.source),
            None => self.source.to_string(),
        };

        if self.is_error {
            error!("{log_message}");
            if self.notify {
                let content = format!("Debug Info: {}\n{log_message}", debug_info(ctx));
                notify_bug(ctx, content).await;
            }
        } else {
            debug!("{log_message}");
        }

        if let Some(ref reply) = self.reply {
            ephemeral_reply(ctx, reply).await;
        }
    }
}
