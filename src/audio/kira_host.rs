//! Kira-backed audio host
//!
//! Plays sounds out of the shared [`AssetCache`] and owns every kira
//! handle. If no audio device can be opened the host stays usable but every
//! play fails with [`HostError::Unavailable`].

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::{
        static_sound::{StaticSoundHandle, StaticSoundSettings},
        PlaybackPosition, PlaybackRate, PlaybackState,
    },
    tween::Tween,
    StartTime, Volume,
};

use crate::assets::AssetCache;

use super::host::{AudioHost, HostError, PlaybackParams, SoundHandle};

/// Tween for a fade, or an immediate change
fn tween(fade: Option<Duration>) -> Tween {
    Tween {
        duration: fade.unwrap_or(Duration::ZERO),
        ..Default::default()
    }
}

/// [`AudioHost`] implementation on top of kira
pub struct KiraHost {
    /// Kira audio manager, `None` when no output device is available
    manager: Option<AudioManager<DefaultBackend>>,
    cache: AssetCache,
    handles: HashMap<SoundHandle, StaticSoundHandle>,
    /// Handles told to stop. kira resumes a stopping sound if it is paused
    /// and resumed, so these are left out of pause_all / resume_all.
    stopping: HashSet<SoundHandle>,
    next_id: u64,
}

impl KiraHost {
    /// Open the default output device
    pub fn new(cache: AssetCache) -> Self {
        let manager = match AudioManager::<DefaultBackend>::new(AudioManagerSettings::default()) {
            Ok(m) => {
                log::info!("Audio manager initialized successfully");
                Some(m)
            }
            Err(e) => {
                log::warn!("Failed to initialize audio manager: {}. Audio disabled.", e);
                None
            }
        };

        Self {
            manager,
            cache,
            handles: HashMap::new(),
            stopping: HashSet::new(),
            next_id: 0,
        }
    }

    /// Check if an audio backend is available
    pub fn is_available(&self) -> bool {
        self.manager.is_some()
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Number of sounds the host still holds handles for
    pub fn playing_count(&self) -> usize {
        self.handles.len()
    }

    /// Whether a handle has been told to stop and is winding down
    pub fn is_stopping(&self, handle: SoundHandle) -> bool {
        self.stopping.contains(&handle)
            || self.handles.get(&handle).is_some_and(|sound| {
                matches!(sound.state(), PlaybackState::Stopping | PlaybackState::Stopped)
            })
    }

    /// Handles that pause / resume may touch
    fn live_handles(&mut self) -> impl Iterator<Item = &mut StaticSoundHandle> + '_ {
        let stopping = &self.stopping;
        self.handles
            .iter_mut()
            .filter(move |(id, _)| !stopping.contains(*id))
            .map(|(_, sound)| sound)
            .filter(|sound| {
                !matches!(sound.state(), PlaybackState::Stopping | PlaybackState::Stopped)
            })
    }
}

impl AudioHost for KiraHost {
    fn is_loaded(&self, key: &str) -> bool {
        self.cache.contains(key)
    }

    fn play(&mut self, key: &str, params: &PlaybackParams) -> Result<SoundHandle, HostError> {
        let Some(manager) = self.manager.as_mut() else {
            return Err(HostError::Unavailable);
        };

        let data = match self.cache.sound(key) {
            Some(data) => data,
            None if self.cache.contains(key) => return Err(HostError::NotAudio(key.to_string())),
            None => return Err(HostError::NotLoaded(key.to_string())),
        };

        let mut settings = StaticSoundSettings::new()
            .volume(Volume::Amplitude(params.volume))
            .playback_rate(PlaybackRate::Factor(params.playback_factor()))
            .start_position(PlaybackPosition::Seconds(params.seek));
        if params.looping {
            settings = settings.loop_region(0.0..);
        }
        if !params.delay.is_zero() {
            settings = settings.start_time(StartTime::Delayed(params.delay));
        }

        let handle = manager
            .play(data.with_settings(settings))
            .map_err(|e| HostError::Playback(format!("{:?}", e)))?;

        self.next_id += 1;
        let id = SoundHandle(self.next_id);
        self.handles.insert(id, handle);
        Ok(id)
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f64, fade: Option<Duration>) {
        if let Some(sound) = self.handles.get_mut(&handle) {
            sound.set_volume(Volume::Amplitude(volume), tween(fade));
        }
    }

    fn stop(&mut self, handle: SoundHandle, fade: Option<Duration>) {
        // Keep the handle until kira reports it stopped so update() sees it
        if let Some(sound) = self.handles.get_mut(&handle) {
            sound.stop(tween(fade));
            self.stopping.insert(handle);
        }
    }

    fn pause_all(&mut self) {
        for sound in self.live_handles() {
            sound.pause(tween(None));
        }
    }

    fn resume_all(&mut self) {
        for sound in self.live_handles() {
            sound.resume(tween(None));
        }
    }

    fn stop_all(&mut self) {
        for (&id, sound) in self.handles.iter_mut() {
            sound.stop(tween(None));
            self.stopping.insert(id);
        }
    }

    fn drain_finished(&mut self) -> Vec<SoundHandle> {
        let finished: Vec<SoundHandle> = self
            .handles
            .iter()
            .filter(|(_, sound)| sound.state() == PlaybackState::Stopped)
            .map(|(&id, _)| id)
            .collect();
        for id in &finished {
            self.handles.remove(id);
            self.stopping.remove(id);
        }
        finished
    }
}

impl std::fmt::Debug for KiraHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiraHost")
            .field("available", &self.manager.is_some())
            .field("cached_assets", &self.cache.len())
            .field("handles", &self.handles.len())
            .finish()
    }
}

// Note: kira's manager isn't Send/Sync, so the host lives on the thread that
// drives the registry. Only the asset cache crosses threads.
