//! Persistence of the image list.
//!
//! The list is stored as a flat JSON array of [`ImageEntry`] under a key
//! derived from the instance name (`sbSlideApp_<name>`). [`JsonFileStore`]
//! keeps one file per key in the data directory; [`MemoryStore`] backs tests
//! and `--no-persist` runs.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::image_entry::ImageEntry;

/// Prefix for storage keys
pub const STORAGE_KEY_PREFIX: &str = "sbSlideApp_";

/// Storage key for an instance name
pub fn storage_key(instance_name: &str) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, instance_name)
}

/// Backend for the persisted image list.
pub trait ListStore: Send {
    /// Raw stored value for the key, None if nothing was stored
    fn read_raw(&self) -> Result<Option<String>>;
    /// Replace the stored value
    fn write_raw(&self, json: &str) -> Result<()>;
    /// Human readable location, for logs
    fn describe(&self) -> String;

    /// Serialize and store the list.
    fn save(&self, images: &[ImageEntry]) -> Result<()> {
        let json = serde_json::to_string(images).context("Failed to serialize image list")?;
        self.write_raw(&json)?;
        debug!("Saved {} image(s) to {}", images.len(), self.describe());
        Ok(())
    }

    /// Load the stored list. Never fails: absence or bad data yields an empty list.
    fn load(&self) -> Vec<ImageEntry> {
        let raw = match self.read_raw() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No saved slideshow at {}", self.describe());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read saved slideshow: {:#}", e);
                return Vec::new();
            }
        };
        match parse_list(&raw) {
            Ok(images) => {
                info!("Loaded {} image(s) from {}", images.len(), self.describe());
                images
            }
            Err(e) => {
                warn!("Failed to parse saved slideshow at {}: {:#}", self.describe(), e);
                Vec::new()
            }
        }
    }
}

/// Parse a stored list. A list whose first entry has an empty url is treated as no data.
pub fn parse_list(raw: &str) -> Result<Vec<ImageEntry>> {
    let images: Vec<ImageEntry> = serde_json::from_str(raw).context("Invalid image list JSON")?;
    match images.first() {
        Some(first) if first.url.is_empty() => Ok(Vec::new()),
        _ => Ok(images),
    }
}

/// One JSON file per storage key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store for `key` inside `dir`. The key is percent-encoded into the file name.
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{}.json", encode_file_name(key))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ListStore for JsonFileStore {
    fn read_raw(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(Some(raw))
    }

    fn write_raw(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]`, so distinct keys get distinct names.
fn encode_file_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: &str) -> Self {
        Self {
            value: Mutex::new(Some(raw.to_string())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.value.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ListStore for MemoryStore {
    fn read_raw(&self) -> Result<Option<String>> {
        Ok(self.raw())
    }

    fn write_raw(&self, json: &str) -> Result<()> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(json.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl<T: ListStore + Sync> ListStore for std::sync::Arc<T> {
    fn read_raw(&self) -> Result<Option<String>> {
        (**self).read_raw()
    }

    fn write_raw(&self, json: &str) -> Result<()> {
        (**self).write_raw(json)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ImageEntry> {
        let mut b = ImageEntry::new("http://b.com/2.jpg", 640, 480);
        b.display_width = 1440;
        b.display_height = 1080;
        vec![ImageEntry::new("http://a.com/1.png", 100, 50), b]
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("sbSlideshow 2"), "sbSlideApp_sbSlideshow 2");
    }

    #[test]
    fn test_memory_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().is_empty());
        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());
    }

    #[test]
    fn test_bad_json_is_empty() {
        let store = MemoryStore::with_raw("{not json");
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_reads_historical_layout() {
        let raw = r#"[{"width":10,"height":20,"_width":0,"_height":0,"url":"http://x.com/a.gif"}]"#;
        let images = MemoryStore::with_raw(raw).load();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "http://x.com/a.gif");
        assert_eq!((images[0].width, images[0].height), (10, 20));
    }

    #[test]
    fn test_first_entry_without_url_is_empty() {
        let raw = r#"[{"width":10,"height":20,"url":""}]"#;
        assert!(MemoryStore::with_raw(raw).load().is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join("slidebrew_store_test");
        let _ = std::fs::remove_dir_all(&dir);

        let store = JsonFileStore::new(&dir, &storage_key("sbSlideshow 7"));
        assert!(store.path().ends_with("sbSlideApp_sbSlideshow%207.json"));
        assert!(store.load().is_empty());

        store.save(&sample()).unwrap();
        let reopened = JsonFileStore::new(&dir, &storage_key("sbSlideshow 7"));
        assert_eq!(reopened.load(), sample());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_names_keep_keys_apart() {
        let dir = std::env::temp_dir().join("slidebrew_store_names_test");
        let _ = std::fs::remove_dir_all(&dir);

        let spaced = JsonFileStore::new(&dir, &storage_key("sbSlideshow 7"));
        let underscored = JsonFileStore::new(&dir, &storage_key("sbSlideshow_7"));
        let percent = JsonFileStore::new(&dir, &storage_key("sbSlideshow%207"));
        assert_ne!(spaced.path(), underscored.path());
        assert_ne!(spaced.path(), percent.path());

        spaced.save(&sample()).unwrap();
        assert!(underscored.load().is_empty());
        assert!(percent.load().is_empty());
        assert_eq!(spaced.load(), sample());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_encode_file_name() {
        assert_eq!(encode_file_name("a-b_c9"), "a-b_c9");
        assert_eq!(encode_file_name("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_file_name("%"), "%25");
        assert_eq!(encode_file_name("é"), "%C3%A9");
    }
}
