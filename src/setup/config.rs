//! Configuration for running this bot.

use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::GuildId;
use serenity::UserId;

use crate::error::ConfigError;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Environment variable that overrides the token in the config file.
const TOKEN_VAR: &str = "DISCORD_BOT_TOKEN";

/// Placeholder written to new config files.
const TOKEN_PLACEHOLDER: &str = "put_token_here";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// See [StorageConfig]
    storage: StorageConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    pub fn read() -> Result<Config, ConfigError> {
        Config::read_from(Path::new(CONFIG_PATH))
    }

    /// Read a config file.
    /// If the file doesn't exist, create the default config file and return error.
    /// If the file exists but is empty, re-write the default values and return error.
    /// If the file exists but is incomplete, show error and don't change files.
    /// If the file exists and is complete, read file to create a config.
    /// If file existence is indeterminate (e.g. missing permissions), return error.
    pub fn read_from(path: &Path) -> Result<Config, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => {
                write_file(path, &Config::default())?;
                Err(ConfigError::InvalidConfig {
                    reason: format!("Empty config file! Rewriting {} ...", path.display()),
                })
            }
            Ok(content) => {
                // On failure, the error names the field that is wrong.
                let to_toml = toml::Deserializer::new(&content);
                serde_path_to_error::deserialize(to_toml).map_err(|error| {
                    ConfigError::InvalidConfig {
                        reason: error.to_string(),
                    }
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                write_file(path, &Config::default())?;
                Err(ConfigError::MissingConfig {
                    action_msg: format!(
                        "Created {}, fill in the discord token and restart.",
                        path.display()
                    ),
                })
            }
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    /// The discord token. A non-empty [TOKEN_VAR] takes priority over the file.
    pub fn token(&self) -> Result<String, ConfigError> {
        pick_token(std::env::var(TOKEN_VAR).ok(), &self.discord_token)
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils
            .notifications
            .notify_list(&fw.options().owners)
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    /// Directory holding media, settings and the word base.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: TOKEN_PLACEHOLDER.to_string(),

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            storage: StorageConfig {
                data_dir: ".".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },
        }
    }
}

/// Prefer the environment token unless it is blank.
fn pick_token(from_env: Option<String>, from_file: &str) -> Result<String, ConfigError> {
    let from_env = from_env.filter(|t| !t.trim().is_empty());
    checked_token(from_env.as_deref().unwrap_or(from_file))
}

/// Basic sanity check for if a token was given.
fn checked_token(token: &str) -> Result<String, ConfigError> {
    let token = token.trim();
    if token.is_empty() || token.contains(TOKEN_PLACEHOLDER) {
        Err(ConfigError::InvalidConfig {
            reason: format!("Missing discord token, set it in {CONFIG_PATH} or {TOKEN_VAR}"),
        })
    } else {
        Ok(token.to_string())
    }
}

/// Configs for logging.
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Where data files live.
#[derive(Debug, Serialize, Deserialize)]
struct StorageConfig {
    /// Directory for `media_links.txt`, `media_metadata.json`, `settings.json`
    /// and `word_base.json`.
    data_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to register commands on instead of globally, updates quickly.
    #[serde(serialize_with = "guild_to_str", deserialize_with = "guild_from_str")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list from the config and the bot owners.
    fn notify_list(&self, owners: &HashSet<UserId>) -> HashSet<UserId> {
        if !self.enabled {
            return HashSet::new();
        }

        let mut notify_list: HashSet<UserId> = self.userids.iter().copied().collect();
        if self.add_owners {
            notify_list.extend(owners.iter().copied());
        }
        notify_list
    }
}

/// Write the given config to `path`.
fn write_file(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidConfig {
        reason: e.to_string(),
    })?;
    std::fs::write(path, content).map_err(ConfigError::IoError)
}

/// TOML has no null, so an empty string means no guild.
fn guild_to_str<S>(guild: &Option<GuildId>, ser: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match guild {
        Some(id) => ser.serialize_str(&id.get().to_string()),
        None => ser.serialize_str(""),
    }
}

fn guild_from_str<'de, D>(deserializer: D) -> Result<Option<GuildId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "" => Ok(None),
        id => id
            .parse::<u64>()
            .ok()
            .filter(|&n| n != 0)
            .map(|n| Some(GuildId::new(n)))
            .ok_or_else(|| serde::de::Error::custom("expected a guild id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        (dir, path)
    }

    #[test]
    fn missing_config_writes_default() {
        let (_dir, path) = config_path();
        let err = Config::read_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConfig { .. }));

        // The written default is itself a valid config.
        let config = Config::read_from(&path).unwrap();
        assert_eq!(config.log_dir(), "logs");
        assert_eq!(config.data_dir(), PathBuf::from("."));
        assert_eq!(config.dev_guild(), None);
    }

    #[test]
    fn empty_config_is_rewritten() {
        let (_dir, path) = config_path();
        std::fs::write(&path, "  \n").unwrap();
        let err = Config::read_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { .. }));
        assert!(!std::fs::read_to_string(&path).unwrap().trim().is_empty());
    }

    #[test]
    fn incomplete_config_names_the_field() {
        let (_dir, path) = config_path();
        std::fs::write(&path, "discord_token = \"abc\"\n[logging]\nconsole_debug = true\n").unwrap();
        let err = Config::read_from(&path).unwrap_err();
        match err {
            ConfigError::InvalidConfig { reason } => assert!(reason.contains("logging"), "{reason}"),
            other => panic!("unexpected error {other:?}"),
        }
        // File is left alone.
        assert!(std::fs::read_to_string(&path).unwrap().contains("abc"));
    }

    #[test]
    fn dev_guild_parses() {
        let (_dir, path) = config_path();
        let mut text = toml::to_string_pretty(&Config::default()).unwrap();
        text = text.replace("dev_guild = \"\"", "dev_guild = \"310243609641484288\"");
        std::fs::write(&path, text).unwrap();

        let config = Config::read_from(&path).unwrap();
        assert_eq!(config.dev_guild(), Some(GuildId::new(310243609641484288)));
    }

    #[test]
    fn placeholder_token_is_rejected() {
        assert!(checked_token(TOKEN_PLACEHOLDER).is_err());
        assert!(checked_token("   ").is_err());
        assert_eq!(checked_token(" secret ").unwrap(), "secret");
    }

    #[test]
    fn env_token_overrides_unless_blank() {
        assert_eq!(
            pick_token(Some("from_env".to_string()), "from_file").unwrap(),
            "from_env"
        );
        assert_eq!(pick_token(None, "from_file").unwrap(), "from_file");
        assert_eq!(
            pick_token(Some("  ".to_string()), "from_file").unwrap(),
            "from_file"
        );
        assert!(pick_token(Some(String::new()), TOKEN_PLACEHOLDER).is_err());
    }

    #[test]
    fn notify_list_respects_flags() {
        let owners: HashSet<UserId> = [UserId::new(1)].into();
        let mut notify = NotifyConfig {
            enabled: false,
            add_owners: true,
            userids: vec![UserId::new(2)],
        };
        assert!(notify.notify_list(&owners).is_empty());

        notify.enabled = true;
        assert_eq!(
            notify.notify_list(&owners),
            [UserId::new(1), UserId::new(2)].into()
        );

        notify.add_owners = false;
        assert_eq!(notify.notify_list(&owners), [UserId::new(2)].into());
    }
}
