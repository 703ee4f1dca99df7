//! The media library: stored links and their metadata.
//!
//! Links are kept in `media_links.txt` (one per line) and metadata in
//! `media_metadata.json`. The in-memory [MediaStore] is the source of truth and is
//! written back after every change.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;
use delegate::delegate;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;

use super::write_atomic;
use crate::error::StorageError;

/// File holding one link per line.
pub const LINKS_FILE: &str = "media_links.txt";
/// File holding the metadata of every link.
pub const METADATA_FILE: &str = "media_metadata.json";

/// Direct tenor CDN links expire, only `tenor.com/view/...` pages are kept.
const TENOR_DIRECT_HOST: &str = "media.tenor.com";
/// Anything shorter can't be a real link.
const MIN_URL_LEN: usize = 10;

/// What kind of media a link points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Gif,
}

/// Metadata stored for each link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub url: String,
    pub date_added: NaiveDateTime,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default)]
    pub generated_text: String,
}

/// Layout of [METADATA_FILE].
#[derive(Debug, Default, Serialize, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    media: Vec<MediaMetadata>,
}

/// Result of [MediaStore::add].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
    Invalid,
    TenorDirect,
}

/// Links and metadata backed by two files in a directory.
#[derive(Debug)]
pub struct MediaStore {
    dir: PathBuf,
    links: Vec<String>,
    metadata: HashMap<String, MediaMetadata>,
}

impl MediaStore {
    /// Load the store from `dir`. Missing files are treated as empty.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        let links_path = dir.join(LINKS_FILE);
        let links = match std::fs::read_to_string(&links_path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StorageError::io(links_path)(e)),
        };

        let meta_path = dir.join(METADATA_FILE);
        let metadata = match std::fs::read_to_string(&meta_path) {
            Ok(content) => {
                let de = &mut serde_json::Deserializer::from_str(&content);
                let file: MetadataFile = serde_path_to_error::deserialize(de).map_err(|source| {
                    StorageError::Malformed {
                        path: meta_path.clone(),
                        source,
                    }
                })?;
                file.media
                    .into_iter()
                    .map(|meta| (meta.url.clone(), meta))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StorageError::io(meta_path)(e)),
        };

        let store = Self {
            dir,
            links,
            metadata,
        };
        tracing::info!("Loaded {} media items from storage.", store.len());
        Ok(store)
    }

    /// Write links and metadata back to disk.
    pub fn save(&self) -> Result<(), StorageError> {
        let mut links = self.links.join("\n");
        if !links.is_empty() {
            links.push('\n');
        }
        write_atomic(&self.links_path(), links.as_bytes())?;

        // Metadata follows link order.
        let file = MetadataFile {
            media: self
                .links
                .iter()
                .filter_map(|url| self.metadata.get(url))
                .cloned()
                .collect(),
        };
        let meta_path = self.metadata_path();
        let json =
            serde_json::to_string_pretty(&file).map_err(|source| StorageError::Serialize {
                path: meta_path.clone(),
                source,
            })?;
        write_atomic(&meta_path, json.as_bytes())?;

        tracing::debug!("Saved {} media items.", self.len());
        Ok(())
    }

    /// Add a link unless it is invalid, a duplicate or a direct tenor link.
    pub fn add(&mut self, url: &str, kind: MediaKind, generated_text: &str) -> AddOutcome {
        if url.chars().count() < MIN_URL_LEN {
            return AddOutcome::Invalid;
        }
        if self.metadata.contains_key(url) || self.links.iter().any(|l| l == url) {
            tracing::debug!("Media already exists: {url}");
            return AddOutcome::Duplicate;
        }
        if !is_web_url(url) {
            tracing::warn!("Invalid URL format: {url}");
            return AddOutcome::Invalid;
        }
        if url.contains(TENOR_DIRECT_HOST) {
            tracing::debug!("Skipped direct tenor link: {url}");
            return AddOutcome::TenorDirect;
        }

        self.links.push(url.to_string());
        self.metadata.insert(
            url.to_string(),
            MediaMetadata {
                url: url.to_string(),
                date_added: chrono::Local::now().naive_local(),
                kind,
                generated_text: generated_text.to_string(),
            },
        );
        tracing::info!("Added new media: {url} ({kind:?})");
        AddOutcome::Added
    }

    /// A random stored link.
    pub fn random(&self) -> Option<String> {
        self.links.choose(&mut rand::rng()).cloned()
    }

    /// Remove every direct tenor link, saving if anything changed.
    /// Returns how many links were removed.
    pub fn clean_tenor(&mut self) -> Result<usize, StorageError> {
        let before = self.links.len();
        self.links.retain(|url| !url.contains(TENOR_DIRECT_HOST));
        self.metadata.retain(|url, _| !url.contains(TENOR_DIRECT_HOST));
        let removed = before - self.links.len();

        if removed > 0 {
            self.save()?;
            tracing::info!("Cleaned {removed} direct tenor links from storage.");
        }
        Ok(removed)
    }

    /// Copy of every stored link, in insertion order.
    pub fn links(&self) -> Vec<String> {
        self.links.clone()
    }

    /// Metadata for a stored link.
    #[cfg(test)]
    pub fn metadata(&self, url: &str) -> Option<MediaMetadata> {
        self.metadata.get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    fn links_path(&self) -> PathBuf {
        self.dir.join(LINKS_FILE)
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }
}

/// Absolute `http` or `https` url with a host.
fn is_web_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}

/// Shared [MediaStore].
/// Internally uses an [Arc], so it's cheap to clone.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    #[allow(clippy::missing_docs_in_private_items)]
    inner: Arc<Mutex<MediaStore>>,
}

impl MediaLibrary {
    /// Load the library from `dir`.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let store = MediaStore::load(dir)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(store)),
        })
    }

    /// Add many links at once, returning how many were new.
    /// Nothing is written to disk, call [MediaLibrary::save] afterwards.
    pub async fn add_all(&self, found: &[(String, MediaKind)]) -> usize {
        let mut store = self.inner.lock().await;
        found
            .iter()
            .filter(|(url, kind)| store.add(url, *kind, "") == AddOutcome::Added)
            .count()
    }

    delegate! {
        to self.inner.lock().await {
            /// Persist the library.
            #[await(false)]
            pub async fn save(&self) -> Result<(), StorageError>;
            /// A random stored link.
            #[await(false)]
            pub async fn random(&self) -> Option<String>;
            /// Remove direct tenor links.
            #[await(false)]
            pub async fn clean_tenor(&self) -> Result<usize, StorageError>;
            /// Copy of every stored link.
            #[await(false)]
            pub async fn links(&self) -> Vec<String>;
            /// Number of stored links.
            #[await(false)]
            pub async fn len(&self) -> usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIF: &str = "https://tenor.com/view/cat-dance-gif-12345";
    const PNG: &str = "https://example.com/pics/cat.png";

    fn empty_store() -> (tempfile::TempDir, MediaStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::load(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_files_load_empty() {
        let (_dir, store) = empty_store();
        assert_eq!(store.len(), 0);
        assert_eq!(store.random(), None);
    }

    #[test]
    fn add_rejects_bad_links() {
        let (_dir, mut store) = empty_store();
        assert_eq!(store.add("http://a", MediaKind::Image, ""), AddOutcome::Invalid);
        assert_eq!(
            store.add("ftp://example.com/a.png", MediaKind::Image, ""),
            AddOutcome::Invalid
        );
        assert_eq!(
            store.add("example.com/cat.png", MediaKind::Image, ""),
            AddOutcome::Invalid
        );
        assert_eq!(
            store.add("https://media.tenor.com/abc/cat.gif", MediaKind::Gif, ""),
            AddOutcome::TenorDirect
        );
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn add_skips_duplicates() {
        let (_dir, mut store) = empty_store();
        assert_eq!(store.add(GIF, MediaKind::Gif, ""), AddOutcome::Added);
        assert_eq!(store.add(GIF, MediaKind::Gif, ""), AddOutcome::Duplicate);
        assert_eq!(store.len(), 1);
        assert_eq!(store.metadata(GIF).unwrap().kind, MediaKind::Gif);
    }

    #[test]
    fn save_and_reload() {
        let (dir, mut store) = empty_store();
        store.add(GIF, MediaKind::Gif, "hello");
        store.add(PNG, MediaKind::Image, "");
        store.save().unwrap();

        let links = std::fs::read_to_string(dir.path().join(LINKS_FILE)).unwrap();
        assert_eq!(links, format!("{GIF}\n{PNG}\n"));

        let reloaded = MediaStore::load(dir.path()).unwrap();
        assert_eq!(reloaded.links(), vec![GIF.to_string(), PNG.to_string()]);
        let meta = reloaded.metadata(GIF).unwrap();
        assert_eq!(meta.generated_text, "hello");
        assert_eq!(meta, store.metadata(GIF).unwrap());
    }

    #[test]
    fn metadata_file_layout() {
        let (dir, mut store) = empty_store();
        store.add(PNG, MediaKind::Image, "");
        store.save().unwrap();

        let raw = std::fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &json["media"][0];
        assert_eq!(entry["url"], PNG);
        assert_eq!(entry["type"], "image");
        assert_eq!(entry["generated_text"], "");
        assert!(entry["date_added"].is_string());
    }

    #[test]
    fn blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LINKS_FILE), format!("\n{PNG}\n   \n{GIF}\n")).unwrap();
        let store = MediaStore::load(dir.path()).unwrap();
        assert_eq!(store.links(), vec![PNG.to_string(), GIF.to_string()]);
    }

    #[test]
    fn malformed_metadata_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), r#"{"media": [{"url": 5}]}"#).unwrap();
        let err = MediaStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[test]
    fn clean_tenor_removes_direct_links() {
        let dir = tempfile::tempdir().unwrap();
        let direct = "https://media.tenor.com/xyz/AAAA/tenor.gif";
        std::fs::write(dir.path().join(LINKS_FILE), format!("{GIF}\n{direct}\n{PNG}\n")).unwrap();
        let mut store = MediaStore::load(dir.path()).unwrap();

        assert_eq!(store.clean_tenor().unwrap(), 1);
        assert_eq!(store.links(), vec![GIF.to_string(), PNG.to_string()]);
        assert_eq!(store.clean_tenor().unwrap(), 0);

        let on_disk = MediaStore::load(dir.path()).unwrap();
        assert_eq!(on_disk.len(), 2);
    }

    #[test]
    fn random_picks_a_stored_link() {
        let (_dir, mut store) = empty_store();
        store.add(GIF, MediaKind::Gif, "");
        store.add(PNG, MediaKind::Image, "");
        for _ in 0..20 {
            let pick = store.random().unwrap();
            assert!(pick == GIF || pick == PNG);
        }
    }

    #[tokio::test]
    async fn library_counts_new_links() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::open(dir.path()).unwrap();
        let found = vec![
            (GIF.to_string(), MediaKind::Gif),
            (GIF.to_string(), MediaKind::Gif),
            (PNG.to_string(), MediaKind::Image),
            ("https://media.tenor.com/a.gif".to_string(), MediaKind::Gif),
        ];
        assert_eq!(library.add_all(&found).await, 2);
        assert_eq!(library.len().await, 2);

        // Only an explicit save reaches the disk.
        assert_eq!(MediaStore::load(dir.path()).unwrap().len(), 0);
        library.save().await.unwrap();
        assert_eq!(MediaStore::load(dir.path()).unwrap().len(), 2);
    }
}
