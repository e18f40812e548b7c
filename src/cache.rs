use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::DepledgerError;
use crate::models::{dep_key, Ecosystem};

/// One persisted license resolution, keyed by `(ecosystem, name, version)`.
/// Field names match the on-disk format: `{"t": ..., "n": ..., "v": ..., "l": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "t")]
    pub ecosystem: Ecosystem,
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "l")]
    pub licenses: Vec<String>,
}

impl CacheEntry {
    pub fn key(&self) -> String {
        dep_key(self.ecosystem, &self.name, &self.version)
    }
}

/// Persistent license cache: loaded once at startup, mutated in memory, and
/// fully rewritten on save. Loss on crash is acceptable — every entry is
/// re-derivable from the registry.
#[derive(Debug)]
pub struct Cache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl Cache {
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: HashMap::new(),
        }
    }

    /// Load the cache from disk. A missing or empty file yields an empty
    /// cache; unreadable or unparseable content surfaces
    /// [`DepledgerError::CacheCorrupt`] and the caller decides whether to
    /// continue with an empty cache.
    pub fn load(path: &Path) -> Result<Self, DepledgerError> {
        let mut cache = Self::empty(path);

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(cache),
            Err(err) => {
                return Err(DepledgerError::CacheCorrupt {
                    path: path.to_path_buf(),
                    source: err.into(),
                })
            }
        };
        if data.is_empty() {
            return Ok(cache);
        }

        let entries: Vec<CacheEntry> =
            serde_json::from_slice(&data).map_err(|source| DepledgerError::CacheCorrupt {
                path: path.to_path_buf(),
                source: source.into(),
            })?;

        cache.entries = entries
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect();
        Ok(cache)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Upsert by identity key.
    pub fn put(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.key(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serialize all entries, sorted by identity key for reproducible diffs,
    /// overwriting the previous file content.
    pub fn save(&self) -> Result<()> {
        let mut entries: Vec<&CacheEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.key());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec(&entries)?)?;
        Ok(())
    }
}
