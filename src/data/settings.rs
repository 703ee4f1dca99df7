//! Runtime settings changed through commands, stored in `settings.json`.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::RwLock;

use super::write_atomic;
use crate::error::StorageError;
use crate::lib::i18n::Language;
use crate::serenity::ChannelId;

/// File holding the [Settings].
pub const SETTINGS_FILE: &str = "settings.json";

/// Longest allowed posting interval, one week.
pub const MAX_INTERVAL_HOURS: u64 = 168;
/// Largest allowed posting jitter, half a day.
pub const MAX_JITTER_MINUTES: u64 = 720;

/// Settings that can change while the bot is running.
/// Fields missing from the file take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Language of replies.
    pub language: Language,
    /// Channels the poster sends media to.
    pub target_channels: Vec<ChannelId>,
    /// Whether the poster is active.
    pub posting_enabled: bool,
    /// Chance for each scheduled post to actually happen.
    pub posting_probability: f64,
    /// Hours between scheduled posts.
    pub posting_interval_hours: u64,
    /// Max random offset applied to every scheduled post.
    pub posting_jitter_minutes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Language::En,
            target_channels: Vec::new(),
            posting_enabled: true,
            posting_probability: 0.6,
            posting_interval_hours: 1,
            posting_jitter_minutes: 10,
        }
    }
}

impl Settings {
    /// Force values into their valid ranges.
    fn sanitize(&mut self) {
        if !(0.0..=1.0).contains(&self.posting_probability) {
            let clamped = if self.posting_probability.is_nan() {
                Settings::default().posting_probability
            } else {
                self.posting_probability.clamp(0.0, 1.0)
            };
            tracing::warn!(
                "Posting probability {} out of range, using {clamped}.",
                self.posting_probability
            );
            self.posting_probability = clamped;
        }
        if self.posting_interval_hours == 0 {
            tracing::warn!("Posting interval can't be 0 hours, using 1.");
            self.posting_interval_hours = 1;
        }
        if self.posting_interval_hours > MAX_INTERVAL_HOURS {
            tracing::warn!(
                "Posting interval {}h is too long, using {MAX_INTERVAL_HOURS}h.",
                self.posting_interval_hours
            );
            self.posting_interval_hours = MAX_INTERVAL_HOURS;
        }
        if self.posting_jitter_minutes > MAX_JITTER_MINUTES {
            tracing::warn!(
                "Posting jitter {}min is too long, using {MAX_JITTER_MINUTES}min.",
                self.posting_jitter_minutes
            );
            self.posting_jitter_minutes = MAX_JITTER_MINUTES;
        }
    }

    /// Read settings from `path`, writing the defaults if it doesn't exist.
    pub fn load(path: &Path) -> Result<Settings, StorageError> {
        let mut settings = match std::fs::read_to_string(path) {
            Ok(content) => {
                let de = &mut serde_json::Deserializer::from_str(&content);
                serde_path_to_error::deserialize(de).map_err(|source| StorageError::Malformed {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No {}, writing defaults.", path.display());
                let settings = Settings::default();
                settings.save(path)?;
                settings
            }
            Err(e) => return Err(StorageError::io(path)(e)),
        };
        settings.sanitize();
        tracing::info!("Settings loaded.");
        Ok(settings)
    }

    /// Write settings to `path`.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|source| StorageError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        write_atomic(path, json.as_bytes())
    }
}

/// Shared [Settings] tied to their file.
/// Internally uses an [Arc], so it's cheap to clone.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    path: Arc<PathBuf>,
    inner: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    /// Load the settings file in `dir`.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(SETTINGS_FILE);
        let settings = Settings::load(&path)?;
        Ok(Self {
            path: Arc::new(path),
            inner: Arc::new(RwLock::new(settings)),
        })
    }

    /// Clone of the current settings.
    pub async fn snapshot(&self) -> Settings {
        self.inner.read().await.clone()
    }

    pub async fn language(&self) -> Language {
        self.inner.read().await.language
    }

    /// Change the settings and save them.
    /// If saving fails the change is kept in memory only.
    pub async fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<Settings, StorageError> {
        let mut settings = self.inner.write().await;
        f(&mut settings);
        settings.sanitize();
        settings.save(&self.path)?;
        tracing::info!("Settings saved.");
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_is_merged_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{"language": "ru", "target_channels": [123456789012345678]}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.language, Language::Ru);
        assert_eq!(
            settings.target_channels,
            vec![ChannelId::new(123456789012345678)]
        );
        assert!(settings.posting_enabled);
        assert_eq!(settings.posting_probability, 0.6);
        assert_eq!(settings.posting_interval_hours, 1);
    }

    #[test]
    fn out_of_range_values_are_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{"posting_probability": 3.5, "posting_interval_hours": 0}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.posting_probability, 1.0);
        assert_eq!(settings.posting_interval_hours, 1);
    }

    #[test]
    fn oversized_interval_and_jitter_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{"posting_interval_hours": 3000000000000000, "posting_jitter_minutes": 18446744073709551615}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.posting_interval_hours, MAX_INTERVAL_HOURS);
        assert_eq!(settings.posting_jitter_minutes, MAX_JITTER_MINUTES);
    }

    #[tokio::test]
    async fn update_caps_interval() {
        let dir = tempfile::tempdir().unwrap();
        let handle = SettingsHandle::open(dir.path()).unwrap();
        let settings = handle
            .update(|s| s.posting_interval_hours = u64::MAX)
            .await
            .unwrap();
        assert_eq!(settings.posting_interval_hours, MAX_INTERVAL_HOURS);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"language": "de"}"#).unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(err.to_string().contains("language"));
    }

    #[tokio::test]
    async fn update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let handle = SettingsHandle::open(dir.path()).unwrap();

        handle
            .update(|s| {
                s.language = Language::Ru;
                s.target_channels = vec![ChannelId::new(42)];
            })
            .await
            .unwrap();
        assert_eq!(handle.language().await, Language::Ru);

        let reopened = SettingsHandle::open(dir.path()).unwrap();
        let settings = reopened.snapshot().await;
        assert_eq!(settings.language, Language::Ru);
        assert_eq!(settings.target_channels, vec![ChannelId::new(42)]);
    }
}
