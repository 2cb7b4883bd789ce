//! Event system for playback state changes.
//!
//! Events are emitted when significant player state changes occur (visible
//! frame changed, sequence rebuilt, animation completed) and handled by the
//! embedding layer to trigger side effects (swapping the displayed image,
//! firing completion hooks).

use crossbeam_channel::Sender;
use uuid::Uuid;

/// Events related to player state changes
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// Visible frame index changed in a player
    FrameChanged {
        player: Uuid,
        old_frame: usize,
        new_frame: usize,
    },

    /// Playback sequence was rebuilt after a configuration change
    SequenceRebuilt { player: Uuid },

    /// A non-looping forward pass or a reverse pass reached its end.
    ///
    /// Emitted exactly once per pass; the completion surface for hosts.
    AnimationComplete { player: Uuid },
}

/// Event sender wrapper for players
///
/// Players hold this sender to emit events when their state changes.
#[derive(Clone, Debug, Default)]
pub struct PlayerEventSender {
    sender: Option<Sender<PlayerEvent>>,
}

impl PlayerEventSender {
    /// Create event sender (connected to channel)
    pub fn new(sender: Sender<PlayerEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    /// Create dummy sender (for tests or when events not needed)
    pub fn dummy() -> Self {
        Self { sender: None }
    }

    /// Emit event (silent if no receiver)
    pub fn emit(&self, event: PlayerEvent) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(event); // Ignore send errors (receiver might be dropped)
        }
    }
}
