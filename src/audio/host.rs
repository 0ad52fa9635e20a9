//! Host audio engine boundary
//!
//! The registry never decodes or mixes anything itself. Everything that
//! touches real audio goes through [`AudioHost`], which owns the playback
//! instances and hands out opaque [`SoundHandle`]s.

use std::time::Duration;

use thiserror::Error;

/// Opaque reference to one playing sound instance owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundHandle(pub u64);

/// Fully resolved parameters for a single play call
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackParams {
    /// Starting volume (0.0 - 1.0)
    pub volume: f64,
    pub looping: bool,
    /// Playback rate factor
    pub rate: f64,
    /// Pitch offset in cents
    pub detune: f64,
    /// Start offset in seconds
    pub seek: f64,
    pub delay: Duration,
}

impl PlaybackParams {
    /// Combined rate factor with detune folded in
    pub fn playback_factor(&self) -> f64 {
        self.rate.max(0.01) * 2f64.powf(self.detune / 1200.0)
    }
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looping: false,
            rate: 1.0,
            detune: 0.0,
            seek: 0.0,
            delay: Duration::ZERO,
        }
    }
}

/// Errors a host can report when starting playback
#[derive(Debug, Clone, Error)]
pub enum HostError {
    #[error("audio output is not available")]
    Unavailable,
    #[error("sound '{0}' is not loaded")]
    NotLoaded(String),
    #[error("asset '{0}' is not audio")]
    NotAudio(String),
    #[error("playback failed: {0}")]
    Playback(String),
}

/// The host audio engine as seen by the sound registry.
///
/// Volume changes, pausing and stopping are fire-and-forget: a handle the
/// host no longer knows about is ignored.
pub trait AudioHost {
    /// Whether `key` is present in the host's decoded-asset cache
    fn is_loaded(&self, key: &str) -> bool;

    /// Start playing `key`
    fn play(&mut self, key: &str, params: &PlaybackParams) -> Result<SoundHandle, HostError>;

    /// Set a handle's volume, tweening linearly over `fade` when given
    fn set_volume(&mut self, handle: SoundHandle, volume: f64, fade: Option<Duration>);

    /// Stop a handle, fading out over `fade` first when given
    fn stop(&mut self, handle: SoundHandle, fade: Option<Duration>);

    /// Pause every sound that is not already stopping
    fn pause_all(&mut self);

    /// Resume paused sounds. Sounds that were told to stop stay stopped,
    /// including ones still fading out.
    fn resume_all(&mut self);

    /// Stop every sound immediately, cancelling running fades
    fn stop_all(&mut self);

    /// Handles that finished or were stopped since the last call
    fn drain_finished(&mut self) -> Vec<SoundHandle>;
}
