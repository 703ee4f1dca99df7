//! Error types used throughout the bot.
//!
//! [GlipaError] is what every command returns. [UserError]s are expected and only
//! shown to the user, everything else is logged as an error.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::lib::i18n::Language;
use crate::lib::i18n::Msg;
use crate::serenity;

/// Top level error.
#[derive(Debug, Error)]
pub enum GlipaError {
    /// Expected errors caused by the user.
    #[error(transparent)]
    UserError(#[from] UserError),

    /// Problems with `config.toml`.
    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    /// Problems reading or writing the data files.
    #[error(transparent)]
    StorageError(#[from] StorageError),

    /// Errors from discord.
    #[error("Discord error: {0}")]
    Serenity(#[from] serenity::Error),

    /// A command check returned false or errored.
    #[error("Command check failed: {}", .reason.as_deref().unwrap_or("no reason given"))]
    CheckFailed { reason: Option<String> },

    /// A command panicked.
    #[error("Command panicked: {}", .payload.as_deref().unwrap_or("<no payload>"))]
    Panic { payload: Option<String> },

    /// Discord sent a command that doesn't match the registered one.
    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },

    /// A channel could not be used for posting.
    #[error("Channel {channel} can't be used for posting: {reason}")]
    UnusableChannel {
        channel: serenity::ChannelId,
        reason: String,
    },
}

/// Errors that are shown to the user and aren't bugs.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("No media stored yet.")]
    NoMediaStored,
    #[error("No media to pick from.")]
    NoMediaToSend,
    #[error("No media.tenor.com links in storage.")]
    NoTenorLinks,
    #[error("No target channels were given.")]
    NoChannels,
    #[error("A scan is already running in this channel.")]
    ScanInProgress,
    #[error("Posting probability must be between 0 and 1, got {0}.")]
    InvalidProbability(f64),
    #[error("Posting interval must be between 1 and 168 hours.")]
    InvalidInterval,
    #[error("This command only works in a server.")]
    GuildOnly,
    #[error("This command only works in direct messages.")]
    DmOnly,
    #[error("This command only works in NSFW channels.")]
    NsfwOnly,
    #[error("Only bot owners can use this command.")]
    NotOwner,
    #[error("Please pick a subcommand: {subcmds}")]
    MissingSubcommand { subcmds: String },
    #[error("Could not understand the arguments{}.", .input.as_ref().map(|i| format!(" '{i}'")).unwrap_or_default())]
    BadArgs { input: Option<String> },
    #[error("Slow down! Try again in {:.1}s.", .remaining_cooldown.as_secs_f32())]
    OnCooldown { remaining_cooldown: Duration },
    #[error("I'm missing permissions: {missing_permissions}")]
    MissingBotPermissions {
        missing_permissions: serenity::Permissions,
    },
    #[error("You are missing permissions: {}", .missing_permissions.map(|p| p.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    MissingUserPermissions {
        missing_permissions: Option<serenity::Permissions>,
    },
}

impl UserError {
    /// The reply shown to the user in the given language.
    pub fn localized(&self, lang: Language) -> String {
        let msg = match self {
            UserError::NoMediaStored => Msg::NoMedia,
            UserError::NoMediaToSend => Msg::NoMediaRandom,
            UserError::NoTenorLinks => Msg::NoTenor,
            UserError::NoChannels => Msg::NoChannels,
            UserError::ScanInProgress => Msg::ScanInProgress,
            UserError::InvalidProbability(_) => Msg::InvalidProbability,
            UserError::InvalidInterval => Msg::InvalidInterval,
            UserError::MissingUserPermissions { .. } => Msg::NeedAdmin,
            other => return other.to_string(),
        };
        msg.text(lang)
    }
}

/// Errors related to `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found. {action_msg}")]
    MissingConfig { action_msg: String },
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("Could not access config file: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors reading or writing the flat data files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed data in '{}': {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("Could not serialize '{}': {source}", .path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Helper to attach a path to an [std::io::Error].
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StorageError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_localized() {
        let err = UserError::NoMediaStored;
        assert_eq!(err.localized(Language::En), Msg::NoMedia.text(Language::En));
        assert_ne!(err.localized(Language::En), err.localized(Language::Ru));
    }

    #[test]
    fn missing_user_permissions_asks_for_admin() {
        let err = UserError::MissingUserPermissions {
            missing_permissions: None,
        };
        assert_eq!(err.localized(Language::Ru), Msg::NeedAdmin.text(Language::Ru));
    }

    #[test]
    fn untranslated_errors_fall_back_to_display() {
        let err = UserError::GuildOnly;
        assert_eq!(err.localized(Language::Ru), err.to_string());
    }

    #[test]
    fn check_failed_without_reason() {
        let err = GlipaError::CheckFailed { reason: None };
        assert_eq!(err.to_string(), "Command check failed: no reason given");
    }
}
