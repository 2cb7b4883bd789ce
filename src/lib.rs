//! FLIPBOOK - Frame-sequence playback engine
//!
//! Turns a flat list of image frames into a time-scheduled playback
//! sequence: non-uniform per-frame speed, repeated sub-segments, ping-pong
//! cycles and one-shot reverse-then-stop passes. The scheduler is driven by
//! the host's repaint loop through `Player::tick(now)`, so the same logic
//! runs under a real display loop or a synthetic test clock; the render
//! binding maps the current frame index to a displayed image and gates
//! visibility on [`AssetLoader::is_ready`].
//!
//! ```
//! use std::time::Duration;
//! use flipbook::{FrameSet, Player, PlayerConfig, PlayerEventSender};
//!
//! let frames = FrameSet::from(vec!["f0.png", "f1.png", "f2.png"]);
//! let config = PlayerConfig { base_fps: 24.0, ..PlayerConfig::default() };
//! let mut player = Player::new(frames, config, PlayerEventSender::dummy());
//!
//! player.tick(Duration::ZERO); // arms the clock
//! player.tick(Duration::from_millis(42));
//! assert_eq!(player.current_frame(), Some(0));
//! ```

// Playback engine
pub mod config;
pub mod events;
pub mod frames;
pub mod player;
pub mod sequence;

// Host integration
pub mod loader;

// Re-export commonly used types
pub use config::{LoopSegment, PlayerConfig, SpeedRange};
pub use events::{PlayerEvent, PlayerEventSender};
pub use frames::{FrameRange, FrameSet};
pub use loader::{AssetLoader, AssetState};
pub use player::{PlaybackPhase, Player};
pub use sequence::{BASE_REPEAT_UNIT, PlaybackSequence};
