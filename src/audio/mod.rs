//! Audio system
//!
//! Category-based sound management. The registry keeps the bookkeeping and
//! policy; the host (kira by default) does the playing.

pub mod category;
pub mod host;
pub mod kira_host;
pub mod registry;
pub mod settings;
pub mod sound;

pub use category::{ActiveSound, CategoryConfig, SoundCategory};
pub use host::{AudioHost, HostError, PlaybackParams, SoundHandle};
pub use kira_host::KiraHost;
pub use registry::{PlayOutcome, SoundRegistry};
pub use settings::AudioSettings;
pub use sound::{SoundConfig, SoundEntry};
