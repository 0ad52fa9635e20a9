//! Soundcue - demo player
//!
//! Loads an audio manifest, loads its assets, plays the keys given on the
//! command line and waits for them to finish.
//!
//! Usage: `soundcue [MANIFEST.ron] [KEY...]`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use soundcue::assets::{AssetCache, AssetRegistry, FileLoader};
use soundcue::audio::{KiraHost, PlayOutcome, SoundRegistry};
use soundcue::data::AudioManifest;

/// Update rate for the playback loop
const TARGET_FPS: u64 = 60;
const FRAME_TIME: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// Give up waiting for looping or very long sounds after this long
const MAX_PLAY_TIME: Duration = Duration::from_secs(30);

/// Category whose sounds are started as background music
const BGM_CATEGORY: &str = "bgm";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Soundcue v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1).peekable();
    let has_manifest_arg = args.peek().is_some_and(|arg| arg.ends_with(".ron"));
    let manifest_path = if has_manifest_arg {
        args.next().map(PathBuf::from)
    } else {
        None
    }
    .unwrap_or_else(default_manifest_path);
    let keys: Vec<String> = args.collect();

    let manifest = AudioManifest::load_or_default(&manifest_path);

    let cache = AssetCache::new();
    let mut assets = AssetRegistry::new(Arc::new(FileLoader::new(cache.clone())));
    let mut sounds = SoundRegistry::new(KiraHost::new(cache));
    manifest.apply(&mut sounds, &mut assets);

    assets
        .load_assets(None)
        .context("Failed to start loading assets")?;
    match assets.wait_for_load() {
        Ok(loaded) => log::info!("Loaded {} asset(s)", loaded.len()),
        Err(e) => log::warn!("Some assets failed to load: {}", e),
    }

    if keys.is_empty() {
        log::info!("Nothing to play. Pass sound keys after the manifest path.");
    }

    for key in &keys {
        let is_bgm = sounds
            .sound(key)
            .is_some_and(|entry| entry.category == BGM_CATEGORY);
        let outcome = if is_bgm {
            sounds.play_bgm(key, None)
        } else {
            sounds.play_sound(key, None)
        };
        match outcome {
            PlayOutcome::Played(handle) => log::info!("Playing '{}' ({:?})", key, handle),
            other => log::warn!("Could not play '{}': {:?}", key, other),
        }
    }

    run_until_quiet(&mut sounds);

    sounds.dispose();
    log::info!("Soundcue shut down cleanly");
    Ok(())
}

/// Pump the registry until nothing is playing or the timeout passes
fn run_until_quiet(sounds: &mut SoundRegistry<KiraHost>) {
    let start = Instant::now();

    loop {
        let frame_start = Instant::now();
        sounds.update();

        if sounds.host().playing_count() == 0 {
            break;
        }
        if start.elapsed() >= MAX_PLAY_TIME {
            log::info!("Stopping after {:?}", MAX_PLAY_TIME);
            break;
        }

        let frame_time = frame_start.elapsed();
        if frame_time < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - frame_time);
        }
    }
}

/// `audio.ron` in the platform config directory, or the working directory
fn default_manifest_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "soundcue", "Soundcue") {
        proj_dirs.config_dir().join("audio.ron")
    } else {
        PathBuf::from("./audio.ron")
    }
}
