//! Sound categories
//!
//! A category is a policy bucket: volume, looping, how many sounds may play
//! at once and what happens when that limit is hit.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::host::SoundHandle;

/// Default volume for a new category
pub const DEFAULT_VOLUME: f64 = 1.0;
/// Default concurrency limit for a new category
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Category definition as supplied by the caller or a manifest.
///
/// Every field is optional; missing values fall back to the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub volume: Option<f64>,
    pub looping: Option<bool>,
    pub max_concurrent: Option<usize>,
    pub interrupts: Option<bool>,
    /// Fade-in length in milliseconds
    pub fade_in_ms: Option<u64>,
    /// Fade-out length in milliseconds
    pub fade_out_ms: Option<u64>,
}

impl CategoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = Some(max);
        self
    }

    pub fn interrupts(mut self, interrupts: bool) -> Self {
        self.interrupts = Some(interrupts);
        self
    }

    pub fn fade_in_ms(mut self, ms: u64) -> Self {
        self.fade_in_ms = Some(ms);
        self
    }

    pub fn fade_out_ms(mut self, ms: u64) -> Self {
        self.fade_out_ms = Some(ms);
        self
    }
}

/// A sound that is currently playing in a category
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSound {
    /// Host playback handle
    pub handle: SoundHandle,
    /// Sound key it was started from
    pub key: String,
    /// Per-sound volume multiplier (1.0 unless overridden)
    pub gain: f64,
}

/// A resolved category with its playing sounds
#[derive(Debug, Clone)]
pub struct SoundCategory {
    name: String,
    volume: f64,
    looping: bool,
    max_concurrent: usize,
    interrupts: bool,
    fade_in: Option<Duration>,
    fade_out: Option<Duration>,
    /// Oldest first
    active: Vec<ActiveSound>,
}

impl SoundCategory {
    /// Resolve a config into a category, filling in defaults
    pub fn from_config(name: impl Into<String>, config: &CategoryConfig) -> Self {
        let name = name.into();

        let max_concurrent = match config.max_concurrent {
            Some(0) => {
                log::warn!("Category '{}' asked for max_concurrent = 0, using 1", name);
                1
            }
            Some(n) => n,
            None => DEFAULT_MAX_CONCURRENT,
        };

        let volume = match config.volume {
            Some(v) if v.is_nan() => {
                log::warn!("Category '{}' has a NaN volume, using {}", name, DEFAULT_VOLUME);
                DEFAULT_VOLUME
            }
            Some(v) => v.clamp(0.0, 1.0),
            None => DEFAULT_VOLUME,
        };

        Self {
            volume,
            looping: config.looping.unwrap_or(false),
            max_concurrent,
            interrupts: config.interrupts.unwrap_or(false),
            fade_in: millis(config.fade_in_ms),
            fade_out: millis(config.fade_out_ms),
            active: Vec::new(),
            name,
        }
    }

    /// Category with every field at its default
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::from_config(name, &CategoryConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Clamp and store a new volume. NaN is ignored.
    pub(crate) fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn interrupts(&self) -> bool {
        self.interrupts
    }

    pub fn fade_in(&self) -> Option<Duration> {
        self.fade_in
    }

    pub fn fade_out(&self) -> Option<Duration> {
        self.fade_out
    }

    /// Sounds currently playing, oldest first
    pub fn active(&self) -> &[ActiveSound] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether another sound would exceed the limit
    pub fn is_full(&self) -> bool {
        self.active.len() >= self.max_concurrent
    }

    pub fn contains(&self, handle: SoundHandle) -> bool {
        self.active.iter().any(|s| s.handle == handle)
    }

    pub(crate) fn push_active(&mut self, sound: ActiveSound) {
        self.active.push(sound);
    }

    /// Remove and return the oldest playing sound
    pub(crate) fn pop_oldest(&mut self) -> Option<ActiveSound> {
        if self.active.is_empty() {
            None
        } else {
            Some(self.active.remove(0))
        }
    }

    /// Remove a handle if tracked. Returns whether it was.
    pub(crate) fn remove_handle(&mut self, handle: SoundHandle) -> bool {
        let before = self.active.len();
        self.active.retain(|s| s.handle != handle);
        self.active.len() != before
    }

    pub(crate) fn take_active(&mut self) -> Vec<ActiveSound> {
        std::mem::take(&mut self.active)
    }

    /// Keep the playing sounds of a category that is being redefined
    pub(crate) fn adopt_active(&mut self, previous: SoundCategory) {
        self.active = previous.active;
    }
}

fn millis(ms: Option<u64>) -> Option<Duration> {
    ms.filter(|&ms| ms > 0).map(Duration::from_millis)
}
