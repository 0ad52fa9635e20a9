//! Sound entries and per-sound playback overrides

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Optional playback overrides for a sound.
///
/// Stored per sound at registration and passed per call to `play_sound`.
/// When both are present the call-level value wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Volume multiplier (0.0 - 1.0) applied on top of category and global volume
    pub volume: Option<f64>,
    /// Playback rate factor (1.0 = normal speed)
    pub rate: Option<f64>,
    /// Pitch offset in cents
    pub detune: Option<f64>,
    /// Start offset in seconds
    pub seek: Option<f64>,
    /// Overrides the category loop flag
    pub looping: Option<bool>,
    /// Start delay in seconds
    pub delay: Option<f64>,
}

impl SoundConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn detune(mut self, cents: f64) -> Self {
        self.detune = Some(cents);
        self
    }

    pub fn seek(mut self, seconds: f64) -> Self {
        self.seek = Some(seconds);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = Some(seconds);
        self
    }

    /// Layer `over` on top of `self`; fields set in `over` win
    pub fn merged_with(&self, over: &SoundConfig) -> SoundConfig {
        SoundConfig {
            volume: over.volume.or(self.volume),
            rate: over.rate.or(self.rate),
            detune: over.detune.or(self.detune),
            seek: over.seek.or(self.seek),
            looping: over.looping.or(self.looping),
            delay: over.delay.or(self.delay),
        }
    }

    /// Volume multiplier, clamped to 0.0 - 1.0. NaN counts as unset.
    pub fn gain(&self) -> f64 {
        self.volume
            .filter(|v| !v.is_nan())
            .unwrap_or(1.0)
            .clamp(0.0, 1.0)
    }

    /// Start delay; negative or NaN is no delay, overly large saturates
    pub fn delay_duration(&self) -> Duration {
        match self.delay {
            Some(secs) if secs > 0.0 => {
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
            _ => Duration::ZERO,
        }
    }
}

/// A registered sound key
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEntry {
    pub key: String,
    pub category: String,
    /// Source files, in order of preference
    pub paths: Vec<PathBuf>,
    pub config: SoundConfig,
}
