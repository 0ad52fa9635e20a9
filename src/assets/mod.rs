//! Asset registration and loading
//!
//! Tracks which asset keys exist and which have finished loading. Decoding
//! and caching happen in the loader.

pub mod cache;
pub mod registry;

pub use cache::{AssetCache, CachedAsset, FileLoader};
pub use registry::{AssetEntry, AssetError, AssetKind, AssetLoader, AssetRegistry, AssetSource};
