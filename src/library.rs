//! File metadata and tag store.
//!
//! One JSON database file per library root. Records are keyed by the path
//! relative to the root so the whole tree can be moved without invalidating
//! the store. Writes go through a temp file and rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio_io::AudioInfo;

const STORE_FILE_VERSION: u32 = 1;
pub const STORE_FILE_NAME: &str = "epoch123_meta.json";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MetaRecord {
    pub file_size: u64,
    pub duration_secs: f32,
    pub channels: u16,
    pub sample_rate: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MetaRecord {
    pub fn from_info(info: &AudioInfo) -> Self {
        Self {
            file_size: info.file_size,
            duration_secs: info.duration_secs.unwrap_or(0.0),
            channels: info.channels,
            sample_rate: info.sample_rate,
            description: String::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: BTreeMap<String, MetaRecord>,
}

pub struct MetaStore {
    path: PathBuf,
    records: BTreeMap<String, MetaRecord>,
}

impl MetaStore {
    /// Opens the store under `root`, creating an empty one if the database
    /// file does not exist yet.
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(STORE_FILE_NAME);
        let records = if path.is_file() {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read meta store: {}", path.display()))?;
            let data: StoreFile = serde_json::from_slice(&bytes)
                .with_context(|| format!("parse meta store: {}", path.display()))?;
            data.records
        } else {
            BTreeMap::new()
        };
        log::debug!(
            "meta store opened: {} ({} records)",
            path.display(),
            records.len()
        );
        Ok(Self { path, records })
    }

    pub fn save(&self) -> Result<()> {
        let payload = StoreFile {
            version: STORE_FILE_VERSION,
            records: self.records.clone(),
        };
        let text = serde_json::to_vec_pretty(&payload)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)
            .with_context(|| format!("write meta store: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MetaRecord> {
        self.records.get(key)
    }

    pub fn upsert(&mut self, key: &str, record: MetaRecord) {
        self.records.insert(key.to_string(), record);
    }

    pub fn remove(&mut self, key: &str) -> Option<MetaRecord> {
        self.records.remove(key)
    }

    /// Moves a record to a new key, preserving tags. Used by rename and
    /// import so metadata follows the file.
    pub fn rename(&mut self, old_key: &str, new_key: &str) {
        if let Some(record) = self.records.remove(old_key) {
            self.records.insert(new_key.to_string(), record);
        }
    }

    pub fn set_description(&mut self, key: &str, description: &str) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        if record.description == description {
            return false;
        }
        record.description = description.to_string();
        true
    }

    pub fn add_tag(&mut self, key: &str, tag: &str) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        if record.tags.iter().any(|t| t == tag) {
            return false;
        }
        record.tags.push(tag.to_string());
        record.tags.sort();
        true
    }

    pub fn remove_tag(&mut self, key: &str, tag: &str) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        let before = record.tags.len();
        record.tags.retain(|t| t != tag);
        record.tags.len() != before
    }

    /// Keys whose record carries the given tag, in key order.
    pub fn keys_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> {
        self.records
            .iter()
            .filter(move |(_, r)| r.tags.iter().any(|t| t == tag))
            .map(|(k, _)| k.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|k| k.as_str())
    }

    /// Drops records whose file no longer exists under the root. Returns how
    /// many were removed.
    pub fn prune_missing(&mut self, root: &Path) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| root.join(key).is_file());
        let removed = before - self.records.len();
        if removed > 0 {
            log::info!("pruned {removed} stale meta records");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(size: u64) -> MetaRecord {
        MetaRecord {
            file_size: size,
            duration_secs: 1.5,
            channels: 2,
            sample_rate: 44_100,
            description: String::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn tags_dedupe_and_sort() {
        let mut store = MetaStore {
            path: PathBuf::from("unused.json"),
            records: BTreeMap::new(),
        };
        store.upsert("kick.wav", record(10));
        assert!(store.add_tag("kick.wav", "drum"));
        assert!(store.add_tag("kick.wav", "bass"));
        assert!(!store.add_tag("kick.wav", "drum"));
        assert_eq!(store.get("kick.wav").unwrap().tags, vec!["bass", "drum"]);
        assert!(store.remove_tag("kick.wav", "drum"));
        assert!(!store.remove_tag("kick.wav", "drum"));
        assert!(!store.add_tag("missing.wav", "drum"));
    }

    #[test]
    fn rename_moves_record() {
        let mut store = MetaStore {
            path: PathBuf::from("unused.json"),
            records: BTreeMap::new(),
        };
        store.upsert("a.wav", record(1));
        store.add_tag("a.wav", "keep");
        store.rename("a.wav", "b.wav");
        assert!(store.get("a.wav").is_none());
        assert_eq!(store.get("b.wav").unwrap().tags, vec!["keep"]);
    }

    #[test]
    fn keys_with_tag_filters() {
        let mut store = MetaStore {
            path: PathBuf::from("unused.json"),
            records: BTreeMap::new(),
        };
        store.upsert("a.wav", record(1));
        store.upsert("b.wav", record(2));
        store.add_tag("a.wav", "drum");
        let hits: Vec<&str> = store.keys_with_tag("drum").collect();
        assert_eq!(hits, vec!["a.wav"]);
    }
}
