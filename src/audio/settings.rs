//! Player-facing audio settings
//!
//! Produced by `SoundRegistry::save_settings` and consumed by
//! `SoundRegistry::load_settings`. Where they are stored is up to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Global volume, mute state and per-category volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    pub global_volume: f64,
    pub is_muted: bool,
    #[serde(default)]
    pub category_volumes: BTreeMap<String, f64>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            global_volume: 1.0,
            is_muted: false,
            category_volumes: BTreeMap::new(),
        }
    }
}

impl AudioSettings {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
