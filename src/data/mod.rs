//! Data-driven audio configuration
//!
//! Loads the audio manifest from an external RON file so categories and
//! sounds can be tuned without recompiling.

pub mod manifest;

pub use manifest::{default_manifest, export_default_manifest, AudioManifest, ManifestError, SoundDef};
