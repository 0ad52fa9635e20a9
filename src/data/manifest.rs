//! RON audio manifest
//!
//! Describes categories, sounds and extra assets in a data file so games can
//! tweak their mix without recompiling. Falls back to built-in defaults when
//! the file is missing or broken.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{AssetRegistry, AssetSource};
use crate::audio::{AudioHost, CategoryConfig, SoundConfig, SoundRegistry};

/// A sound declared in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDef {
    pub key: String,
    pub category: String,
    pub paths: Vec<PathBuf>,
    #[serde(default)]
    pub config: SoundConfig,
}

/// Everything the audio layer is configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioManifest {
    pub categories: BTreeMap<String, CategoryConfig>,
    pub sounds: Vec<SoundDef>,
    /// Non-sound assets keyed by name
    pub assets: BTreeMap<String, AssetSource>,
}

/// Manifest loading errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] ron::Error),
}

impl AudioManifest {
    /// Load a manifest from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self, ManifestError> {
        Ok(ron::from_str(content)?)
    }

    pub fn to_ron(&self) -> Result<String, ManifestError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Load from file, or use the defaults if that fails
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No audio manifest at {}, using defaults", path.display());
            return default_manifest();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Failed to load audio manifest: {}. Using defaults.", e);
            default_manifest()
        })
    }

    /// Push categories, sounds and assets into the registries
    pub fn apply<H: AudioHost>(&self, sounds: &mut SoundRegistry<H>, assets: &mut AssetRegistry) {
        for (name, config) in &self.categories {
            sounds.define_category(name.clone(), config.clone());
        }

        for def in &self.sounds {
            sounds.register_sound_with_assets(
                assets,
                def.key.clone(),
                def.category.clone(),
                def.paths.clone(),
                Some(def.config.clone()),
            );
        }

        for (key, source) in &self.assets {
            assets.register_source(key.clone(), source.clone());
        }

        log::info!(
            "Applied audio manifest: {} categories, {} sounds, {} assets",
            self.categories.len(),
            self.sounds.len(),
            self.assets.len()
        );
    }
}

/// Built-in categories: effects, interface and background music
pub fn default_manifest() -> AudioManifest {
    let mut categories = BTreeMap::new();
    categories.insert(
        "sfx".to_string(),
        CategoryConfig::new().volume(0.8).max_concurrent(8),
    );
    categories.insert(
        "ui".to_string(),
        CategoryConfig::new().volume(0.6).max_concurrent(3).interrupts(true),
    );
    categories.insert(
        "bgm".to_string(),
        CategoryConfig::new()
            .volume(0.5)
            .looping(true)
            .max_concurrent(1)
            .interrupts(true)
            .fade_in_ms(500)
            .fade_out_ms(1000),
    );

    AudioManifest {
        categories,
        ..Default::default()
    }
}

/// Write the default manifest to `path` for easy editing
pub fn export_default_manifest(path: impl AsRef<Path>) -> Result<(), ManifestError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| ManifestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let ron = default_manifest().to_ron()?;
    fs::write(path, ron).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
