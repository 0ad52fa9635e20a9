//! Sound category registry
//!
//! Tracks categories, registered sounds and the handles currently playing in
//! each category, and applies the concurrency / interrupt / fade policy on
//! every play. All actual audio work is delegated to an [`AudioHost`].

use std::collections::HashMap;
use std::path::PathBuf;

use crate::assets::{AssetKind, AssetRegistry};

use super::category::{ActiveSound, CategoryConfig, SoundCategory};
use super::host::{AudioHost, PlaybackParams, SoundHandle};
use super::settings::AudioSettings;
use super::sound::{SoundConfig, SoundEntry};

/// Result of a play request. Refusals are values, not errors.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The sound started
    Played(SoundHandle),
    /// Audio is globally muted
    Muted,
    /// No sound registered under the key
    UnknownSound,
    /// The sound's category does not exist
    UnknownCategory,
    /// The host has not loaded the sound yet
    NotLoaded,
    /// The category is full and does not interrupt
    LimitReached,
    /// The host failed to start playback
    HostRejected,
}

impl PlayOutcome {
    pub fn handle(self) -> Option<SoundHandle> {
        match self {
            PlayOutcome::Played(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_played(self) -> bool {
        matches!(self, PlayOutcome::Played(_))
    }
}

/// The background music slot
#[derive(Debug, Clone)]
struct CurrentBgm {
    key: String,
    category: String,
    handle: SoundHandle,
}

/// Category-based sound manager over a host audio engine
pub struct SoundRegistry<H: AudioHost> {
    host: H,
    categories: HashMap<String, SoundCategory>,
    sounds: HashMap<String, SoundEntry>,
    /// Global volume (0.0 - 1.0)
    global_volume: f64,
    muted: bool,
    bgm: Option<CurrentBgm>,
    /// Handles detached from their category and fading out
    fading_out: Vec<SoundHandle>,
}

impl<H: AudioHost> SoundRegistry<H> {
    /// Create a registry driving `host`
    pub fn new(host: H) -> Self {
        Self {
            host,
            categories: HashMap::new(),
            sounds: HashMap::new(),
            global_volume: 1.0,
            muted: false,
            bgm: None,
            fading_out: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Create or replace a category.
    ///
    /// Sounds already playing in a replaced category stay tracked under the
    /// new definition.
    pub fn define_category(&mut self, name: impl Into<String>, config: CategoryConfig) {
        let name = name.into();
        let mut category = SoundCategory::from_config(name.clone(), &config);
        if let Some(previous) = self.categories.remove(&name) {
            log::debug!("Redefining sound category '{}'", name);
            category.adopt_active(previous);
        }
        self.categories.insert(name, category);
    }

    /// Register a sound under a category, creating the category with
    /// defaults if it does not exist yet
    pub fn register_sound<I, P>(
        &mut self,
        key: impl Into<String>,
        category: impl Into<String>,
        paths: I,
        config: Option<SoundConfig>,
    ) where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let key = key.into();
        let category = category.into();

        if !self.categories.contains_key(&category) {
            log::info!(
                "Sound '{}' registered under unknown category '{}', creating it with defaults",
                key,
                category
            );
            self.categories
                .insert(category.clone(), SoundCategory::with_defaults(category.clone()));
        }

        let entry = SoundEntry {
            key: key.clone(),
            category,
            paths: paths.into_iter().map(Into::into).collect(),
            config: config.unwrap_or_default(),
        };
        self.sounds.insert(key, entry);
    }

    /// Register a sound and forward its files to the asset registry for loading
    pub fn register_sound_with_assets<I, P>(
        &mut self,
        assets: &mut AssetRegistry,
        key: impl Into<String>,
        category: impl Into<String>,
        paths: I,
        config: Option<SoundConfig>,
    ) where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let key = key.into();
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        assets.register(key.clone(), AssetKind::Audio, paths.clone(), Default::default());
        self.register_sound(key, category, paths, config);
    }

    /// Play a registered sound.
    ///
    /// Applies the category's concurrency policy: a full category either
    /// evicts its oldest sound (when it interrupts) or refuses.
    pub fn play_sound(&mut self, key: &str, overrides: Option<&SoundConfig>) -> PlayOutcome {
        if self.muted {
            log::debug!("Not playing '{}': audio is muted", key);
            return PlayOutcome::Muted;
        }

        let Some(entry) = self.sounds.get(key) else {
            log::warn!("Sound '{}' is not registered", key);
            return PlayOutcome::UnknownSound;
        };

        let Some(category) = self.categories.get_mut(&entry.category) else {
            log::warn!("Sound '{}' refers to missing category '{}'", key, entry.category);
            return PlayOutcome::UnknownCategory;
        };

        if !self.host.is_loaded(key) {
            log::warn!("Sound '{}' has not been loaded", key);
            return PlayOutcome::NotLoaded;
        }

        if category.is_full() {
            if !category.interrupts() {
                log::debug!(
                    "Category '{}' is at its limit of {}, skipping '{}'",
                    category.name(),
                    category.max_concurrent(),
                    key
                );
                return PlayOutcome::LimitReached;
            }
            while category.is_full() {
                let Some(oldest) = category.pop_oldest() else {
                    break;
                };
                log::debug!(
                    "Category '{}' full, interrupting '{}'",
                    category.name(),
                    oldest.key
                );
                self.host.stop(oldest.handle, None);
            }
        }

        let config = match overrides {
            Some(overrides) => entry.config.merged_with(overrides),
            None => entry.config.clone(),
        };
        let gain = config.gain();
        let target = category.volume() * self.global_volume * gain;
        let fade_in = category.fade_in();

        let params = PlaybackParams {
            volume: if fade_in.is_some() { 0.0 } else { target },
            looping: config.looping.unwrap_or(category.looping()),
            rate: config.rate.unwrap_or(1.0),
            detune: config.detune.unwrap_or(0.0),
            seek: config.seek.unwrap_or(0.0).max(0.0),
            delay: config.delay_duration(),
        };

        let handle = match self.host.play(key, &params) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Failed to play sound '{}': {}", key, e);
                return PlayOutcome::HostRejected;
            }
        };

        if let Some(fade) = fade_in {
            self.host.set_volume(handle, target, Some(fade));
        }

        category.push_active(ActiveSound {
            handle,
            key: key.to_string(),
            gain,
        });

        PlayOutcome::Played(handle)
    }

    /// Replace the current background music with `key`.
    ///
    /// The BGM category's concurrency policy applies like for any other
    /// sound.
    pub fn play_bgm(&mut self, key: &str, config: Option<&SoundConfig>) -> PlayOutcome {
        self.stop_bgm();

        let outcome = self.play_sound(key, config);
        if let PlayOutcome::Played(handle) = outcome {
            // play_sound only succeeds for registered keys
            let category = self
                .sounds
                .get(key)
                .map(|entry| entry.category.clone())
                .unwrap_or_default();
            log::info!("Now playing BGM '{}'", key);
            self.bgm = Some(CurrentBgm {
                key: key.to_string(),
                category,
                handle,
            });
        }
        outcome
    }

    /// Stop the background music, fading out when its category has a fade-out
    pub fn stop_bgm(&mut self) {
        let Some(bgm) = self.bgm.take() else {
            return;
        };

        let Some(category) = self.categories.get_mut(&bgm.category) else {
            self.host.stop(bgm.handle, None);
            return;
        };

        // Already ended or evicted
        if !category.remove_handle(bgm.handle) {
            return;
        }

        match category.fade_out() {
            Some(fade) => {
                log::debug!("Fading out BGM '{}' over {:?}", bgm.key, fade);
                self.host.stop(bgm.handle, Some(fade));
                self.fading_out.push(bgm.handle);
            }
            None => self.host.stop(bgm.handle, None),
        }
    }

    /// Stop a single tracked sound immediately
    pub fn stop_sound(&mut self, handle: SoundHandle) {
        let tracked = self
            .categories
            .values_mut()
            .any(|category| category.remove_handle(handle));
        if !tracked {
            log::debug!("Stop requested for untracked handle {:?}", handle);
            return;
        }
        if self.bgm.as_ref().is_some_and(|bgm| bgm.handle == handle) {
            self.bgm = None;
        }
        self.host.stop(handle, None);
    }

    /// Stop every sound playing in a category
    pub fn stop_category(&mut self, name: &str) {
        let Some(category) = self.categories.get_mut(name) else {
            log::warn!("Cannot stop unknown category '{}'", name);
            return;
        };

        for sound in category.take_active() {
            self.host.stop(sound.handle, None);
        }

        if self.bgm.as_ref().is_some_and(|bgm| bgm.category == name) {
            self.bgm = None;
        }
    }

    /// Stop everything, including sounds that are fading out
    pub fn stop_all(&mut self) {
        self.host.stop_all();
        for category in self.categories.values_mut() {
            category.take_active();
        }
        self.fading_out.clear();
        self.bgm = None;
    }

    /// Set a category's volume (0.0 - 1.0) and apply it to its playing sounds
    pub fn set_category_volume(&mut self, name: &str, volume: f64) {
        let Some(category) = self.categories.get_mut(name) else {
            log::warn!("Cannot set volume of unknown category '{}'", name);
            return;
        };
        if volume.is_nan() {
            log::warn!("Ignoring NaN volume for category '{}'", name);
            return;
        }

        category.set_volume(volume);
        Self::apply_volume(&mut self.host, category, self.global_volume);
    }

    /// Set the global volume (0.0 - 1.0) and apply it to every playing sound
    pub fn set_global_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            log::warn!("Ignoring NaN global volume");
            return;
        }
        self.global_volume = volume.clamp(0.0, 1.0);
        for category in self.categories.values() {
            Self::apply_volume(&mut self.host, category, self.global_volume);
        }
    }

    fn apply_volume(host: &mut H, category: &SoundCategory, global_volume: f64) {
        for sound in category.active() {
            host.set_volume(sound.handle, category.volume() * global_volume * sound.gain, None);
        }
    }

    /// Mute or unmute. Muting pauses playback; nothing is stopped.
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        if muted {
            log::info!("Audio muted");
            self.host.pause_all();
        } else {
            log::info!("Audio unmuted");
            self.host.resume_all();
        }
    }

    /// Flip the mute state, returning the new one
    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    /// Snapshot of global volume, mute state and category volumes
    pub fn save_settings(&self) -> AudioSettings {
        AudioSettings {
            global_volume: self.global_volume,
            is_muted: self.muted,
            category_volumes: self
                .categories
                .values()
                .map(|category| (category.name().to_string(), category.volume()))
                .collect(),
        }
    }

    /// Apply saved settings through the regular setters.
    ///
    /// Categories named in the settings but not defined yet are created with
    /// defaults so their volume is not lost.
    pub fn load_settings(&mut self, settings: &AudioSettings) {
        self.set_global_volume(settings.global_volume);
        self.set_muted(settings.is_muted);

        for (name, &volume) in &settings.category_volumes {
            if !self.categories.contains_key(name) {
                log::debug!("Settings mention undefined category '{}', creating it", name);
                self.categories
                    .insert(name.clone(), SoundCategory::with_defaults(name.clone()));
            }
            self.set_category_volume(name, volume);
        }
    }

    /// Pull finished sounds from the host and stop tracking them.
    ///
    /// Call once per frame.
    pub fn update(&mut self) {
        for handle in self.host.drain_finished() {
            self.handle_ended(handle);
        }
    }

    /// Forget a handle that the host reports as ended. Safe to call for
    /// handles that were already evicted, stopped or never tracked.
    pub fn handle_ended(&mut self, handle: SoundHandle) {
        for category in self.categories.values_mut() {
            category.remove_handle(handle);
        }
        self.fading_out.retain(|&h| h != handle);
        if self.bgm.as_ref().is_some_and(|bgm| bgm.handle == handle) {
            self.bgm = None;
        }
    }

    /// Stop everything and forget all categories, sounds and state
    pub fn dispose(&mut self) {
        self.stop_all();
        self.categories.clear();
        self.sounds.clear();
        self.global_volume = 1.0;
        self.muted = false;
        log::debug!("Sound registry disposed");
    }

    pub fn category(&self, name: &str) -> Option<&SoundCategory> {
        self.categories.get(name)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn sound(&self, key: &str) -> Option<&SoundEntry> {
        self.sounds.get(key)
    }

    /// Number of sounds playing in a category (0 for unknown categories)
    pub fn active_count(&self, name: &str) -> usize {
        self.categories.get(name).map_or(0, SoundCategory::active_count)
    }

    /// Handles playing in a category, oldest first
    pub fn active_handles(&self, name: &str) -> Vec<SoundHandle> {
        self.categories
            .get(name)
            .map(|category| category.active().iter().map(|s| s.handle).collect())
            .unwrap_or_default()
    }

    /// The volume the registry last applied (or would apply) to a tracked handle
    pub fn effective_volume(&self, handle: SoundHandle) -> Option<f64> {
        self.categories.values().find_map(|category| {
            category
                .active()
                .iter()
                .find(|s| s.handle == handle)
                .map(|s| category.volume() * self.global_volume * s.gain)
        })
    }

    pub fn global_volume(&self) -> f64 {
        self.global_volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Key of the current background music
    pub fn current_bgm(&self) -> Option<&str> {
        self.bgm.as_ref().map(|bgm| bgm.key.as_str())
    }

    pub fn current_bgm_handle(&self) -> Option<SoundHandle> {
        self.bgm.as_ref().map(|bgm| bgm.handle)
    }

    /// Handles that are fading out after leaving their category
    pub fn fading_out(&self) -> &[SoundHandle] {
        &self.fading_out
    }
}

impl<H: AudioHost> std::fmt::Debug for SoundRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundRegistry")
            .field("categories", &self.categories.len())
            .field("sounds", &self.sounds.len())
            .field("global_volume", &self.global_volume)
            .field("muted", &self.muted)
            .field("bgm", &self.current_bgm())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::audio::host::mock::MockHost;

    fn registry(loaded: &[&str]) -> SoundRegistry<MockHost> {
        SoundRegistry::new(MockHost::with_loaded(loaded))
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_register_creates_missing_category() {
        let mut reg = registry(&[]);
        reg.register_sound("click", "ui", ["ui/click.ogg"], None);

        let category = reg.category("ui").unwrap();
        assert_eq!(category.max_concurrent(), 5);
        assert_eq!(category.volume(), 1.0);
        assert_eq!(reg.sound("click").unwrap().category, "ui");
    }

    #[test]
    fn test_register_overwrites() {
        let mut reg = registry(&[]);
        reg.register_sound("hit", "sfx", ["a.ogg"], None);
        reg.register_sound("hit", "combat", ["b.ogg", "b.mp3"], None);

        let entry = reg.sound("hit").unwrap();
        assert_eq!(entry.category, "combat");
        assert_eq!(entry.paths.len(), 2);
    }

    #[test]
    fn test_play_unknown_and_unloaded() {
        let mut reg = registry(&["loaded"]);
        assert_eq!(reg.play_sound("nope", None), PlayOutcome::UnknownSound);

        reg.register_sound("pending", "sfx", ["p.ogg"], None);
        assert_eq!(reg.play_sound("pending", None), PlayOutcome::NotLoaded);
        assert_eq!(reg.active_count("sfx"), 0);
    }

    #[test]
    fn test_host_failure_is_not_tracked() {
        let mut reg = registry(&["hit"]);
        reg.register_sound("hit", "sfx", ["hit.ogg"], None);
        reg.host_mut().fail_next_play = true;

        assert_eq!(reg.play_sound("hit", None), PlayOutcome::HostRejected);
        assert_eq!(reg.active_count("sfx"), 0);
    }

    #[test]
    fn test_limit_without_interrupt() {
        let mut reg = registry(&["a", "b", "c"]);
        reg.define_category("sfx", CategoryConfig::new().max_concurrent(2).interrupts(false));
        for key in ["a", "b", "c"] {
            reg.register_sound(key, "sfx", [format!("{}.ogg", key)], None);
        }

        assert!(reg.play_sound("a", None).is_played());
        assert!(reg.play_sound("b", None).is_played());
        assert_eq!(reg.play_sound("c", None), PlayOutcome::LimitReached);
        assert_eq!(reg.active_count("sfx"), 2);
        assert_eq!(reg.host().sounds.len(), 2);
    }

    #[test]
    fn test_interrupt_evicts_oldest() {
        let mut reg = registry(&["a", "b", "c"]);
        reg.define_category("voice", CategoryConfig::new().max_concurrent(2).interrupts(true));
        for key in ["a", "b", "c"] {
            reg.register_sound(key, "voice", [format!("{}.ogg", key)], None);
        }

        let first = reg.play_sound("a", None).handle().unwrap();
        let second = reg.play_sound("b", None).handle().unwrap();
        let third = reg.play_sound("c", None).handle().unwrap();

        assert_eq!(reg.active_handles("voice"), vec![second, third]);
        assert!(reg.host().sound(first).stopped);
        assert!(!reg.host().sound(second).stopped);

        // The host reporting the evicted handle later changes nothing
        reg.host_mut().finish(first);
        reg.update();
        assert_eq!(reg.active_handles("voice"), vec![second, third]);
    }

    #[test]
    fn test_active_never_exceeds_limit() {
        let mut reg = registry(&["s"]);
        reg.define_category("sfx", CategoryConfig::new().max_concurrent(3).interrupts(true));
        reg.register_sound("s", "sfx", ["s.ogg"], None);

        for _ in 0..20 {
            let _ = reg.play_sound("s", None);
            assert!(reg.active_count("sfx") <= 3);
        }
        assert_eq!(reg.active_count("sfx"), 3);
    }

    #[test]
    fn test_lowered_limit_evicts_down_to_fit() {
        let mut reg = registry(&["s"]);
        reg.define_category("sfx", CategoryConfig::new().max_concurrent(4).interrupts(true));
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        for _ in 0..4 {
            let _ = reg.play_sound("s", None);
        }

        reg.define_category("sfx", CategoryConfig::new().max_concurrent(2).interrupts(true));
        assert_eq!(reg.active_count("sfx"), 4);

        let newest = reg.play_sound("s", None).handle().unwrap();
        assert_eq!(reg.active_count("sfx"), 2);
        assert_eq!(reg.active_handles("sfx").last(), Some(&newest));
    }

    #[test]
    fn test_completion_removes_handle() {
        let mut reg = registry(&["s"]);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        let handle = reg.play_sound("s", None).handle().unwrap();

        reg.host_mut().finish(handle);
        reg.update();
        assert_eq!(reg.active_count("sfx"), 0);

        // Pushed twice by an eager host
        reg.handle_ended(handle);
        assert_eq!(reg.active_count("sfx"), 0);
    }

    #[test]
    fn test_effective_volume_and_overrides() {
        let mut reg = registry(&["s"]);
        reg.define_category("sfx", CategoryConfig::new().volume(0.8).looping(true));
        reg.register_sound("s", "sfx", ["s.ogg"], Some(SoundConfig::new().rate(1.5).volume(0.5)));
        reg.set_global_volume(0.5);

        let handle = reg
            .play_sound("s", Some(&SoundConfig::new().volume(1.0).looping(false)))
            .handle()
            .unwrap();

        let sound = reg.host().sound(handle);
        assert!(approx(sound.params.volume, 0.4));
        assert_eq!(sound.params.rate, 1.5);
        assert!(!sound.params.looping);
        assert!(approx(reg.effective_volume(handle).unwrap(), 0.4));
    }

    #[test]
    fn test_category_loop_flag_applies() {
        let mut reg = registry(&["theme"]);
        reg.define_category("music", CategoryConfig::new().looping(true));
        reg.register_sound("theme", "music", ["theme.ogg"], None);

        let handle = reg.play_sound("theme", None).handle().unwrap();
        assert!(reg.host().sound(handle).params.looping);
    }

    #[test]
    fn test_fade_in_starts_silent() {
        let mut reg = registry(&["amb"]);
        reg.define_category("ambient", CategoryConfig::new().volume(0.6).fade_in_ms(500));
        reg.register_sound("amb", "ambient", ["amb.ogg"], None);

        let handle = reg.play_sound("amb", None).handle().unwrap();
        let sound = reg.host().sound(handle);
        assert_eq!(sound.params.volume, 0.0);
        assert!(approx(sound.volume, 0.6));
        assert_eq!(sound.last_fade, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_global_volume_reapplied() {
        let mut reg = registry(&["a", "b"]);
        reg.define_category("sfx", CategoryConfig::new().volume(0.8));
        reg.define_category("ui", CategoryConfig::new().volume(0.4));
        reg.register_sound("a", "sfx", ["a.ogg"], None);
        reg.register_sound("b", "ui", ["b.ogg"], None);
        let a = reg.play_sound("a", None).handle().unwrap();
        let b = reg.play_sound("b", None).handle().unwrap();

        reg.set_global_volume(1.5);
        assert_eq!(reg.global_volume(), 1.0);

        reg.set_global_volume(0.5);
        assert!(approx(reg.host().sound(a).volume, 0.4));
        assert!(approx(reg.host().sound(b).volume, 0.2));
        assert!(approx(reg.effective_volume(a).unwrap(), 0.4));
    }

    #[test]
    fn test_category_then_global_volume() {
        let mut reg = registry(&["click"]);
        reg.register_sound("click", "ui", ["click.ogg"], None);
        let handle = reg.play_sound("click", None).handle().unwrap();

        reg.set_category_volume("ui", 0.5);
        reg.set_global_volume(0.5);

        assert!(approx(reg.host().sound(handle).volume, 0.25));
        assert!(approx(reg.effective_volume(handle).unwrap(), 0.25));
    }

    #[test]
    fn test_mute_pauses_and_blocks_play() {
        let mut reg = registry(&["s"]);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        let handle = reg.play_sound("s", None).handle().unwrap();

        reg.set_muted(true);
        assert!(reg.host().sound(handle).paused);
        assert_eq!(reg.play_sound("s", None), PlayOutcome::Muted);
        assert_eq!(reg.active_count("sfx"), 1);

        assert!(!reg.toggle_mute());
        assert!(!reg.host().sound(handle).paused);
        assert!(reg.play_sound("s", None).is_played());
    }

    #[test]
    fn test_mute_toggle_keeps_fading_bgm_stopped() {
        let mut reg = registry(&["a", "b"]);
        reg.define_category(
            "bgm",
            CategoryConfig::new()
                .max_concurrent(1)
                .interrupts(true)
                .looping(true)
                .fade_out_ms(1000),
        );
        reg.register_sound("a", "bgm", ["a.ogg"], None);
        reg.register_sound("b", "bgm", ["b.ogg"], None);
        let a = reg.play_bgm("a", None).handle().unwrap();
        let b = reg.play_bgm("b", None).handle().unwrap();

        reg.toggle_mute();
        assert!(!reg.host().sound(a).paused);
        assert!(reg.host().sound(b).paused);

        reg.toggle_mute();
        assert!(reg.host().sound(a).stopped);
        assert_eq!(reg.host().sound(a).stop_fade, Some(Duration::from_millis(1000)));
        assert!(!reg.host().sound(b).paused);
        assert_eq!(reg.fading_out(), &[a]);
    }

    #[test]
    fn test_nan_volume_is_ignored() {
        let mut reg = registry(&["s"]);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        let handle = reg.play_sound("s", None).handle().unwrap();
        reg.set_global_volume(0.5);
        reg.set_category_volume("sfx", 0.8);

        reg.set_global_volume(f64::NAN);
        reg.set_category_volume("sfx", f64::NAN);
        assert_eq!(reg.global_volume(), 0.5);
        assert_eq!(reg.category("sfx").unwrap().volume(), 0.8);
        assert!(approx(reg.host().sound(handle).volume, 0.4));

        let json = reg.save_settings().to_json().unwrap();
        assert_eq!(AudioSettings::from_json(&json).unwrap(), reg.save_settings());
    }

    #[test]
    fn test_stop_category() {
        let mut reg = registry(&["a", "b"]);
        reg.register_sound("a", "sfx", ["a.ogg"], None);
        reg.register_sound("b", "ui", ["b.ogg"], None);
        let a = reg.play_sound("a", None).handle().unwrap();
        let b = reg.play_sound("b", None).handle().unwrap();

        reg.stop_category("sfx");
        assert_eq!(reg.active_count("sfx"), 0);
        assert_eq!(reg.active_count("ui"), 1);
        assert!(reg.host().sound(a).stopped);
        assert!(!reg.host().sound(b).stopped);
    }

    #[test]
    fn test_stop_category_clears_bgm() {
        let mut reg = registry(&["theme", "s"]);
        reg.register_sound("theme", "bgm", ["theme.ogg"], None);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        let theme = reg.play_bgm("theme", None).handle().unwrap();
        let _ = reg.play_sound("s", None);

        reg.stop_category("sfx");
        assert_eq!(reg.current_bgm(), Some("theme"));

        reg.stop_category("bgm");
        assert_eq!(reg.current_bgm(), None);
        assert_eq!(reg.current_bgm_handle(), None);
        assert!(reg.host().sound(theme).stopped);
    }

    #[test]
    fn test_stop_sound() {
        let mut reg = registry(&["a"]);
        reg.register_sound("a", "sfx", ["a.ogg"], None);
        let first = reg.play_sound("a", None).handle().unwrap();
        let second = reg.play_sound("a", None).handle().unwrap();

        reg.stop_sound(first);
        assert_eq!(reg.active_handles("sfx"), vec![second]);
        assert!(reg.host().sound(first).stopped);
    }

    #[test]
    fn test_bgm_switch_fades_out_previous() {
        let mut reg = registry(&["a", "b"]);
        reg.define_category(
            "bgm",
            CategoryConfig::new()
                .max_concurrent(1)
                .interrupts(true)
                .looping(true)
                .fade_out_ms(1000),
        );
        reg.register_sound("a", "bgm", ["a.ogg"], None);
        reg.register_sound("b", "bgm", ["b.ogg"], None);

        let a = reg.play_bgm("a", None).handle().unwrap();
        assert_eq!(reg.current_bgm(), Some("a"));

        let b = reg.play_bgm("b", None).handle().unwrap();
        let old = reg.host().sound(a);
        assert!(old.stopped);
        assert_eq!(old.stop_fade, Some(Duration::from_millis(1000)));
        assert_eq!(reg.current_bgm(), Some("b"));
        assert_eq!(reg.current_bgm_handle(), Some(b));
        assert_eq!(reg.active_handles("bgm"), vec![b]);
        assert_eq!(reg.fading_out(), &[a]);

        // Fade finished on the host side
        reg.host_mut().finish(a);
        reg.update();
        assert!(reg.fading_out().is_empty());
        assert_eq!(reg.current_bgm(), Some("b"));
    }

    #[test]
    fn test_bgm_uses_category_policy() {
        // BGM gets no special treatment: a non-BGM sound in the same
        // single-slot interrupting category evicts the music.
        let mut reg = registry(&["theme", "sting"]);
        reg.define_category("bgm", CategoryConfig::new().max_concurrent(1).interrupts(true));
        reg.register_sound("theme", "bgm", ["theme.ogg"], None);
        reg.register_sound("sting", "bgm", ["sting.ogg"], None);

        let theme = reg.play_bgm("theme", None).handle().unwrap();
        let _ = reg.play_sound("sting", None);
        assert!(reg.host().sound(theme).stopped);
        assert_eq!(reg.active_count("bgm"), 1);

        // BGM slot still names the evicted track until the host reports it
        assert_eq!(reg.current_bgm(), Some("theme"));
        reg.host_mut().finish(theme);
        reg.update();
        assert_eq!(reg.current_bgm(), None);
    }

    #[test]
    fn test_stop_bgm_without_fade() {
        let mut reg = registry(&["theme"]);
        reg.register_sound("theme", "bgm", ["theme.ogg"], None);
        let handle = reg.play_bgm("theme", None).handle().unwrap();

        reg.stop_bgm();
        assert_eq!(reg.current_bgm(), None);
        assert_eq!(reg.host().sound(handle).stop_fade, None);
        assert!(reg.host().sound(handle).stopped);
        assert!(reg.fading_out().is_empty());
    }

    #[test]
    fn test_failed_bgm_leaves_slot_empty() {
        let mut reg = registry(&["theme"]);
        reg.register_sound("theme", "bgm", ["theme.ogg"], None);
        reg.register_sound("missing", "bgm", ["missing.ogg"], None);
        let _ = reg.play_bgm("theme", None);

        assert_eq!(reg.play_bgm("missing", None), PlayOutcome::NotLoaded);
        assert_eq!(reg.current_bgm(), None);
    }

    #[test]
    fn test_stop_all_cancels_fades() {
        let mut reg = registry(&["a", "b", "s"]);
        reg.define_category("bgm", CategoryConfig::new().max_concurrent(1).fade_out_ms(2000));
        reg.register_sound("a", "bgm", ["a.ogg"], None);
        reg.register_sound("b", "bgm", ["b.ogg"], None);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        let a = reg.play_bgm("a", None).handle().unwrap();
        let _ = reg.play_bgm("b", None);
        let _ = reg.play_sound("s", None);
        assert_eq!(reg.fading_out(), &[a]);

        reg.stop_all();
        assert_eq!(reg.host().stop_all_calls, 1);
        assert!(reg.fading_out().is_empty());
        assert_eq!(reg.active_count("bgm"), 0);
        assert_eq!(reg.active_count("sfx"), 0);
        assert_eq!(reg.current_bgm(), None);
        // Fade replaced by an immediate stop
        assert_eq!(reg.host().sound(a).stop_fade, None);
    }

    #[test]
    fn test_settings_round_trip() {
        let mut reg = registry(&[]);
        reg.define_category("sfx", CategoryConfig::new());
        reg.define_category("bgm", CategoryConfig::new());
        reg.set_category_volume("sfx", 0.3);
        reg.set_category_volume("bgm", 0.9);
        reg.set_global_volume(0.7);
        reg.set_muted(true);
        let saved = reg.save_settings();

        let mut fresh = registry(&[]);
        fresh.load_settings(&saved);
        assert_eq!(fresh.save_settings(), saved);
        assert_eq!(fresh.global_volume(), 0.7);
        assert!(fresh.is_muted());
        assert_eq!(fresh.category("sfx").unwrap().volume(), 0.3);
        assert_eq!(fresh.category("bgm").unwrap().volume(), 0.9);
    }

    #[test]
    fn test_load_settings_uses_setters() {
        let mut reg = registry(&["s"]);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        let handle = reg.play_sound("s", None).handle().unwrap();

        let mut settings = AudioSettings {
            global_volume: 0.5,
            is_muted: true,
            ..Default::default()
        };
        settings.category_volumes.insert("sfx".to_string(), 0.5);
        reg.load_settings(&settings);

        let sound = reg.host().sound(handle);
        assert!(sound.paused);
        assert!(approx(sound.volume, 0.25));
    }

    #[test]
    fn test_dispose_is_repeatable() {
        let mut reg = registry(&["s", "theme"]);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        reg.register_sound("theme", "bgm", ["theme.ogg"], None);
        let _ = reg.play_sound("s", None);
        let _ = reg.play_bgm("theme", None);
        reg.set_global_volume(0.2);
        assert_eq!(reg.current_bgm(), Some("theme"));

        reg.dispose();
        assert_eq!(reg.current_bgm(), None);
        assert!(reg.fading_out().is_empty());
        reg.dispose();
        assert!(!reg.has_category("sfx"));
        assert!(reg.sound("s").is_none());
        assert_eq!(reg.global_volume(), 1.0);
        assert_eq!(reg.play_sound("s", None), PlayOutcome::UnknownSound);
    }

    #[test]
    fn test_redefine_keeps_active_sounds() {
        let mut reg = registry(&["s"]);
        reg.register_sound("s", "sfx", ["s.ogg"], None);
        let handle = reg.play_sound("s", None).handle().unwrap();

        reg.define_category("sfx", CategoryConfig::new().volume(0.5));
        assert_eq!(reg.active_handles("sfx"), vec![handle]);
        assert_eq!(reg.category("sfx").unwrap().volume(), 0.5);
    }
}
