//! Decoded asset cache and the stock file loader
//!
//! The cache is shared between the loader thread (writer) and the audio
//! host (reader).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use kira::sound::static_sound::StaticSoundData;
use parking_lot::RwLock;

use super::registry::{AssetError, AssetKind, AssetLoader, AssetSource};

/// A decoded asset
#[derive(Clone)]
pub enum CachedAsset {
    Sound(StaticSoundData),
    Text(String),
    Json(serde_json::Value),
    Binary(Arc<[u8]>),
}

impl CachedAsset {
    pub fn kind(&self) -> AssetKind {
        match self {
            CachedAsset::Sound(_) => AssetKind::Audio,
            CachedAsset::Text(_) => AssetKind::Text,
            CachedAsset::Json(_) => AssetKind::Json,
            CachedAsset::Binary(_) => AssetKind::Binary,
        }
    }
}

impl std::fmt::Debug for CachedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachedAsset::Sound(data) => f.debug_tuple("Sound").field(&data.frames.len()).finish(),
            CachedAsset::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            CachedAsset::Json(_) => f.write_str("Json"),
            CachedAsset::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
        }
    }
}

/// Shared key -> decoded asset map
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    inner: Arc<RwLock<HashMap<String, CachedAsset>>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<CachedAsset> {
        self.inner.read().get(key).cloned()
    }

    /// Sound data for `key`, if it is loaded and is audio
    pub fn sound(&self, key: &str) -> Option<StaticSoundData> {
        match self.inner.read().get(key) {
            Some(CachedAsset::Sound(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, asset: CachedAsset) {
        self.inner.write().insert(key.into(), asset);
    }

    pub fn remove(&self, key: &str) -> Option<CachedAsset> {
        self.inner.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

/// Loads assets from disk into an [`AssetCache`]
#[derive(Debug, Clone)]
pub struct FileLoader {
    cache: AssetCache,
}

impl FileLoader {
    pub fn new(cache: AssetCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    fn decode(kind: AssetKind, path: &Path) -> Result<CachedAsset, String> {
        match kind {
            AssetKind::Audio => StaticSoundData::from_file(path)
                .map(CachedAsset::Sound)
                .map_err(|e| format!("{:?}", e)),
            AssetKind::Text => fs::read_to_string(path)
                .map(CachedAsset::Text)
                .map_err(|e| e.to_string()),
            AssetKind::Json => {
                let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
                serde_json::from_str(&text)
                    .map(CachedAsset::Json)
                    .map_err(|e| e.to_string())
            }
            AssetKind::Binary => fs::read(path)
                .map(|bytes| CachedAsset::Binary(bytes.into()))
                .map_err(|e| e.to_string()),
        }
    }
}

impl AssetLoader for FileLoader {
    /// Try each source path in order; the first that decodes wins
    fn load(&self, key: &str, source: &AssetSource) -> Result<(), AssetError> {
        if source.paths.is_empty() {
            return Err(AssetError::Load {
                key: key.to_string(),
                reason: "no source paths".to_string(),
            });
        }

        let mut last_error = String::new();
        for path in &source.paths {
            if !path.exists() {
                last_error = format!("file not found: {}", path.display());
                continue;
            }
            match Self::decode(source.kind, path) {
                Ok(asset) => {
                    log::debug!("Loaded '{}' from {}", key, path.display());
                    self.cache.insert(key, asset);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!("Could not decode {} for '{}': {}", path.display(), key, e);
                    last_error = format!("{}: {}", path.display(), e);
                }
            }
        }

        Err(AssetError::Load {
            key: key.to_string(),
            reason: last_error,
        })
    }
}
