//! Durable subscriber registry.
//!
//! The whole mapping lives in memory and is rewritten to one JSON file on
//! every mutation, so a crash loses at most the in-flight update. The file
//! layout is a single object keyed by subscriber id, compatible with the
//! pre-existing `user_data.json` data files.

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::model::Subscriber;

#[derive(Debug)]
pub struct SubscriptionStore {
    path: PathBuf,
    subscribers: HashMap<String, Subscriber>,
}

impl SubscriptionStore {
    /// Load the registry from `path`.
    ///
    /// An absent file is a normal first run and yields an empty registry. A
    /// present but unreadable file is fatal: starting with a silently emptied
    /// subscriber set would drop every registration on the next write.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self { path, subscribers: HashMap::new() });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read subscriber file: {}", path.display()))?;

        let subscribers: HashMap<String, Subscriber> = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed subscriber file: {}", path.display()))?;

        Ok(Self { path, subscribers })
    }

    pub fn get(&self, id: &str) -> Option<&Subscriber> {
        self.subscribers.get(id)
    }

    /// Insert or overwrite a record and rewrite the file synchronously.
    pub fn put(&mut self, id: impl Into<String>, subscriber: Subscriber) -> Result<()> {
        self.subscribers.insert(id.into(), subscriber);
        self.persist()
    }

    /// Owned copy of the registry for a broadcast run. Iteration order is
    /// unspecified.
    pub fn snapshot(&self) -> Vec<(String, Subscriber)> {
        self.subscribers.iter().map(|(id, sub)| (id.clone(), sub.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Whole-file rewrite via a temp file and rename, so readers never see a
    /// partially written registry.
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string(&self.subscribers)
            .context("Failed to serialize subscriber registry")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write subscriber file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace subscriber file: {}", self.path.display()))?;

        Ok(())
    }
}
