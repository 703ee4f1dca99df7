//! This module contains everything relating to [Data] and the files behind it.

mod media;
mod settings;
mod words;

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serenity::ChannelId;
use serenity::UserId;
use tempfile::NamedTempFile;

use crate::error::StorageError;
use crate::serenity;
pub use media::MediaKind;
pub use media::MediaLibrary;
pub use settings::Settings;
pub use settings::MAX_INTERVAL_HOURS;
pub use settings::SettingsHandle;
pub use words::Words;

/// The data kept between shards
#[derive(Debug)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Stored media links
    pub library: MediaLibrary,
    /// Runtime settings
    pub settings: SettingsHandle,
    /// Message generator
    pub words: Words,
    /// Channels currently being scanned
    pub scans: ActiveScans,
}

/// Everything loaded from the data directory on startup.
#[derive(Debug, Clone)]
pub struct Storage {
    pub library: MediaLibrary,
    pub settings: SettingsHandle,
    pub words: Words,
}

impl Storage {
    /// Open (or create) every data file inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir).map_err(StorageError::io(dir))?;
        Ok(Self {
            library: MediaLibrary::open(dir)?,
            settings: SettingsHandle::open(dir)?,
            words: Words::new(dir),
        })
    }
}

/// Channels with a running scan.
/// Internally uses an [Arc], so it's cheap to clone.
#[derive(Debug, Default, Clone)]
pub struct ActiveScans {
    #[allow(clippy::missing_docs_in_private_items)]
    inner: Arc<Mutex<HashSet<ChannelId>>>,
}

impl ActiveScans {
    /// Mark `channel` as being scanned. Returns `None` if it already was.
    /// The channel is released when the returned guard is dropped.
    pub fn begin(&self, channel: ChannelId) -> Option<ScanGuard> {
        if !self.lock().insert(channel) {
            return None;
        }
        Some(ScanGuard {
            scans: self.clone(),
            channel,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<ChannelId>> {
        // The set stays valid even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running scan of one channel, see [ActiveScans::begin].
#[derive(Debug)]
pub struct ScanGuard {
    scans: ActiveScans,
    channel: ChannelId,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.scans.lock().remove(&self.channel);
    }
}

/// Write `contents` to a temp file next to `path` then move it over `path`,
/// so a crash never leaves a half written file.
/// The temp file is removed if any step fails.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(StorageError::io(dir))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(StorageError::io(tmp.path()))?;
    tmp.persist(path).map_err(|e| StorageError::io(path)(e.error))?;
    Ok(())
}
