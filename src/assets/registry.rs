//! Asset registry
//!
//! Records what each asset key is and where it lives, and hands loading off
//! to an [`AssetLoader`] on a worker thread. One batch at a time.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What an asset decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Audio,
    Text,
    Json,
    Binary,
}

/// Where an asset comes from and how to treat it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSource {
    pub kind: AssetKind,
    /// Candidate files, tried in order
    pub paths: Vec<PathBuf>,
    /// Free-form loader options
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// A registered asset
#[derive(Debug, Clone, PartialEq)]
pub struct AssetEntry {
    pub source: AssetSource,
    /// When the last successful load finished
    pub loaded_at: Option<SystemTime>,
}

/// Asset loading errors
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    #[error("failed to load '{key}': {reason}")]
    Load { key: String, reason: String },
    #[error("an asset batch is already loading")]
    LoadInProgress,
    #[error("asset loader thread panicked")]
    LoaderPanicked,
    #[error("could not start loader thread: {0}")]
    Spawn(String),
}

/// Does the actual decoding and caching of one asset
pub trait AssetLoader: Send + Sync {
    fn load(&self, key: &str, source: &AssetSource) -> Result<(), AssetError>;
}

type BatchResult = Result<Vec<(String, SystemTime)>, AssetError>;

enum PendingLoad {
    Ready(BatchResult),
    Running(JoinHandle<BatchResult>),
}

/// Registry of asset metadata plus load tracking
pub struct AssetRegistry {
    entries: HashMap<String, AssetEntry>,
    loader: Arc<dyn AssetLoader>,
    pending: Option<PendingLoad>,
}

impl AssetRegistry {
    pub fn new(loader: Arc<dyn AssetLoader>) -> Self {
        Self {
            entries: HashMap::new(),
            loader,
            pending: None,
        }
    }

    /// Record an asset. Re-registering a key replaces it and marks it unloaded.
    pub fn register<I, P>(
        &mut self,
        key: impl Into<String>,
        kind: AssetKind,
        paths: I,
        options: BTreeMap<String, String>,
    ) where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let source = AssetSource {
            kind,
            paths: paths.into_iter().map(Into::into).collect(),
            options,
        };
        self.register_source(key, source);
    }

    pub fn register_source(&mut self, key: impl Into<String>, source: AssetSource) {
        self.entries.insert(
            key.into(),
            AssetEntry {
                source,
                loaded_at: None,
            },
        );
    }

    /// Start loading a batch.
    ///
    /// `None` loads every registered asset that is not loaded yet. Unknown
    /// keys are skipped with a warning. Fails with `LoadInProgress` while a
    /// previous batch has not been collected through `poll_load` or
    /// `wait_for_load`.
    pub fn load_assets(&mut self, keys: Option<&[&str]>) -> Result<(), AssetError> {
        if self.pending.is_some() {
            log::warn!("Ignoring load request: an asset batch is already loading");
            return Err(AssetError::LoadInProgress);
        }

        let mut jobs: Vec<(String, AssetSource)> = match keys {
            Some(keys) => keys
                .iter()
                .filter_map(|&key| match self.entries.get(key) {
                    Some(entry) => Some((key.to_string(), entry.source.clone())),
                    None => {
                        log::warn!("Cannot load unregistered asset '{}'", key);
                        None
                    }
                })
                .collect(),
            None => self
                .entries
                .iter()
                .filter(|(_, entry)| entry.loaded_at.is_none())
                .map(|(key, entry)| (key.clone(), entry.source.clone()))
                .collect(),
        };

        if keys.is_none() {
            jobs.sort_by(|a, b| a.0.cmp(&b.0));
        }

        if jobs.is_empty() {
            self.pending = Some(PendingLoad::Ready(Ok(Vec::new())));
            return Ok(());
        }

        log::info!("Loading {} asset(s)", jobs.len());
        let loader = Arc::clone(&self.loader);
        let handle = thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || -> BatchResult {
                let mut done = Vec::with_capacity(jobs.len());
                for (key, source) in jobs {
                    loader.load(&key, &source)?;
                    done.push((key, SystemTime::now()));
                }
                Ok(done)
            })
            .map_err(|e| AssetError::Spawn(e.to_string()))?;

        self.pending = Some(PendingLoad::Running(handle));
        Ok(())
    }

    /// Non-blocking check on the current batch.
    ///
    /// Returns `None` while it is still running (or nothing was started),
    /// otherwise the loaded keys or the first error.
    pub fn poll_load(&mut self) -> Option<Result<Vec<String>, AssetError>> {
        match self.pending.take()? {
            PendingLoad::Running(handle) if !handle.is_finished() => {
                self.pending = Some(PendingLoad::Running(handle));
                None
            }
            pending => Some(self.settle(pending)),
        }
    }

    /// Block until the current batch settles. Resolves to an empty list when
    /// nothing is loading.
    pub fn wait_for_load(&mut self) -> Result<Vec<String>, AssetError> {
        match self.pending.take() {
            Some(pending) => self.settle(pending),
            None => Ok(Vec::new()),
        }
    }

    fn settle(&mut self, pending: PendingLoad) -> Result<Vec<String>, AssetError> {
        let result = match pending {
            PendingLoad::Ready(result) => result,
            PendingLoad::Running(handle) => handle
                .join()
                .unwrap_or(Err(AssetError::LoaderPanicked)),
        };

        match result {
            Ok(done) => {
                let mut keys = Vec::with_capacity(done.len());
                for (key, at) in done {
                    if let Some(entry) = self.entries.get_mut(&key) {
                        entry.loaded_at = Some(at);
                    }
                    keys.push(key);
                }
                log::info!("Asset batch finished ({} loaded)", keys.len());
                Ok(keys)
            }
            Err(e) => {
                log::warn!("Asset batch failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.loaded_at(key).is_some()
    }

    pub fn loaded_at(&self, key: &str) -> Option<SystemTime> {
        self.entries.get(key).and_then(|entry| entry.loaded_at)
    }

    pub fn entry(&self, key: &str) -> Option<&AssetEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry. A running batch is left to finish on its own.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("entries", &self.entries.len())
            .field("loading", &self.pending.is_some())
            .finish()
    }
}
