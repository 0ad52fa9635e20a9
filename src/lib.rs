//! Soundcue - category-based sound management for games
//!
//! Define sound categories with their own volume, looping, concurrency
//! limits and fades, register sounds under them, and let the registry decide
//! what actually plays on top of the kira audio engine.

pub mod assets;
pub mod audio;
pub mod data;

// Re-export commonly used types
pub use assets::{AssetCache, AssetRegistry, FileLoader};
pub use audio::{
    AudioHost, AudioSettings, CategoryConfig, KiraHost, PlayOutcome, SoundConfig, SoundHandle,
    SoundRegistry,
};
pub use data::AudioManifest;
