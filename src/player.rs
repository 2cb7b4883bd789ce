//! Playback scheduler with drift-free timing
//!
//! **Why**: The host's repaint loop ticks at its own rate; the player
//! advances the sequence cursor at the configured base rate regardless.
//! Each tick accumulates elapsed wall-clock time and advances exactly one
//! sequence step per full interval, carrying the remainder so drift never
//! compounds.
//!
//! **Used by**: Render binding (current frame, events), embedding host
//! (tick driver, configuration updates)
//!
//! # Timing Model
//!
//! Host-driven: `tick(now)` is called once per repaint with a monotonic
//! timestamp. The player never blocks and never registers callbacks, so
//! the same logic runs under a real display loop or a synthetic test
//! clock.
//!
//! # Phase Machine
//!
//! - **Idle**: not advancing; entry state for empty sequences and the
//!   landing state after a reverse pass.
//! - **Forward**: walking the forward sequence. At the end: enter Reverse
//!   (reverse-after-loop with a valid loop segment), freeze Finished
//!   (looping disabled), or wrap to the start.
//! - **Reverse**: one full-window reverse pass; at its end the player
//!   emits completion, marks resume-from-reverse and goes Idle.
//! - **Finished**: terminal; the last frame stays visible forever.
//!
//! The `paused` flag is not a phase: the tick chain keeps running and the
//! clock re-arms every tick, so unpausing resumes instantly with no
//! catch-up burst.

use log::{debug, info};
use std::time::Duration;
use uuid::Uuid;

use crate::config::PlayerConfig;
use crate::events::{PlayerEvent, PlayerEventSender};
use crate::frames::{FrameRange, FrameSet, resolve_window};
use crate::sequence::PlaybackSequence;

/// Current scheduling phase of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Not advancing (empty sequence, or a reverse pass ended)
    Idle,
    /// Walking the forward sequence
    Forward,
    /// Walking the one-shot reverse sequence
    Reverse,
    /// Non-looping playback ended; terminal
    Finished,
}

/// Frame-sequence player: one instance owns one playback state.
///
/// The sequence is derived from the frame set and configuration and is
/// immutable during playback; configuration changes that reshape it
/// rebuild from scratch and reset the cursor.
#[derive(Debug)]
pub struct Player {
    id: Uuid,
    frames: FrameSet,
    config: PlayerConfig,
    /// Active window resolved against the frame set (None = empty set)
    window: Option<FrameRange>,
    /// Forward sequence, ping-pong half included when configured
    sequence: PlaybackSequence,
    /// Reverse sequence, built when entering the Reverse phase
    reverse: PlaybackSequence,
    cursor: usize,
    phase: PlaybackPhase,
    /// Last committed visible frame; survives phase transitions so nothing
    /// beyond the last committed frame is ever shown
    visible: Option<usize>,
    /// Reference clock for the next advance; None = arm on next tick
    last_advance: Option<Duration>,
    /// Dwell marker: no advancement until the wall clock passes it
    hold_until: Option<Duration>,
    /// Set when a reverse pass ends; consumed by the next rebuild
    resume_from_reverse: bool,
    /// Completion already emitted for the current pass
    completed: bool,
    events: PlayerEventSender,
}

impl Player {
    /// Create a player and start forward playback.
    ///
    /// An empty frame set (or a window that resolves to nothing) yields an
    /// Idle player that never advances.
    pub fn new(frames: FrameSet, config: PlayerConfig, events: PlayerEventSender) -> Self {
        let id = Uuid::new_v4();
        let window = resolve_window(config.frame_range, frames.len());
        let sequence = match window {
            Some(w) => PlaybackSequence::build(
                w,
                &config.speed_ranges,
                &config.loop_segments,
                config.ping_pong,
            ),
            None => PlaybackSequence::default(),
        };
        let phase = if sequence.is_empty() {
            PlaybackPhase::Idle
        } else {
            PlaybackPhase::Forward
        };
        info!(
            "Player {} created: {} frames, {} sequence entries",
            id,
            frames.len(),
            sequence.len()
        );

        let visible = sequence.get(0);
        Self {
            id,
            frames,
            config,
            window,
            sequence,
            reverse: PlaybackSequence::default(),
            cursor: 0,
            phase,
            visible,
            last_advance: None,
            hold_until: None,
            resume_from_reverse: false,
            completed: false,
            events,
        }
    }

    /// Player identity carried in emitted events
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The frame set this player animates
    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    /// Current configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Current scheduling phase
    #[inline]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// The forward playback sequence (for bindings and diagnostics)
    pub fn sequence(&self) -> &PlaybackSequence {
        &self.sequence
    }

    /// Visible frame index, `None` only for an empty sequence
    #[inline]
    pub fn current_frame(&self) -> Option<usize> {
        self.visible
    }

    /// Frame the cursor points at in the active sequence
    fn frame_at_cursor(&self) -> Option<usize> {
        match self.phase {
            PlaybackPhase::Reverse => self.reverse.get(self.cursor),
            _ => self.sequence.get(self.cursor),
        }
    }

    /// True once a completion event has been emitted for the current pass
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Toggle the pause flag. No rebuild, no position reset.
    pub fn set_paused(&mut self, paused: bool) {
        if self.config.paused != paused {
            debug!("Player {} paused={}", self.id, paused);
            self.config.paused = paused;
        }
    }

    /// Hold the current frame until the wall clock passes `until`, then
    /// resume as if no time had elapsed.
    pub fn hold_until(&mut self, until: Duration) {
        self.hold_until = Some(until);
    }

    /// Replace the configuration.
    ///
    /// Sequence-shaping changes (window, speed ranges, loop segments,
    /// ping-pong, reverse-after-loop) rebuild and reset; `base_fps`,
    /// `should_loop` and `paused` take effect in place.
    pub fn set_config(&mut self, config: PlayerConfig) {
        let rebuild = self.config.rebuild_required(&config);
        self.config = config;
        if rebuild {
            self.rebuild();
        }
    }

    /// Replace the frame set; always rebuilds.
    pub fn set_frames(&mut self, frames: FrameSet) {
        self.frames = frames;
        self.rebuild();
    }

    /// Reposition to the first sequence position showing `frame` (clamped
    /// into the active window) and re-arm the clock. Forward playback
    /// resumes; an in-flight reverse pass is abandoned.
    pub fn seek_to_frame(&mut self, frame: usize) {
        let Some(window) = self.window else {
            return;
        };
        let clamped = frame.clamp(window.start, window.end);
        let old = self.current_frame();
        self.cursor = self.sequence.position_of_frame(clamped).unwrap_or(0);
        if self.phase == PlaybackPhase::Reverse {
            self.reverse = PlaybackSequence::default();
        }
        if self.phase != PlaybackPhase::Finished {
            self.phase = PlaybackPhase::Forward;
        }
        self.last_advance = None;
        debug!("Player {} seek to frame {} (cursor {})", self.id, clamped, self.cursor);
        self.emit_frame_change(old);
    }

    /// Back to the window start, Forward phase, clock re-armed.
    pub fn restart(&mut self) {
        let old = self.current_frame();
        self.cursor = 0;
        self.reverse = PlaybackSequence::default();
        self.phase = if self.sequence.is_empty() {
            PlaybackPhase::Idle
        } else {
            PlaybackPhase::Forward
        };
        self.completed = false;
        self.last_advance = None;
        self.hold_until = None;
        debug!("Player {} restarted", self.id);
        self.emit_frame_change(old);
    }

    /// Advance the playback clock.
    ///
    /// Called once per host repaint with a monotonic timestamp. Returns
    /// true when the visible frame changed.
    pub fn tick(&mut self, now: Duration) -> bool {
        match self.phase {
            PlaybackPhase::Idle | PlaybackPhase::Finished => return false,
            PlaybackPhase::Forward | PlaybackPhase::Reverse => {}
        }

        if self.config.paused {
            // Keep the reference clock fresh so unpausing has no backlog
            self.last_advance = Some(now);
            return false;
        }

        if let Some(hold) = self.hold_until {
            if now < hold {
                return false;
            }
            // Dwell over: resynchronize to the resume moment
            self.hold_until = None;
            self.last_advance = Some(now);
            return false;
        }

        let interval = self.frame_interval();
        let Some(last) = self.last_advance else {
            self.last_advance = Some(now);
            return false;
        };

        let elapsed = now.saturating_sub(last);
        if elapsed < interval {
            return false;
        }

        // One step per accumulated interval; the remainder carries over so
        // repaint jitter never drifts the frame clock
        let carry = Duration::from_secs_f64(elapsed.as_secs_f64() % interval.as_secs_f64());
        self.last_advance = Some(now.saturating_sub(carry));

        match self.phase {
            PlaybackPhase::Forward => self.advance_forward(),
            PlaybackPhase::Reverse => self.advance_reverse(),
            _ => false,
        }
    }

    /// Seconds-per-step derived from the base rate
    fn frame_interval(&self) -> Duration {
        let fps = if self.config.base_fps.is_finite() && self.config.base_fps > 0.0 {
            self.config.base_fps
        } else {
            1.0
        };
        Duration::from_secs_f64(1.0 / fps as f64)
    }

    fn advance_forward(&mut self) -> bool {
        let old = self.current_frame();

        if self.cursor + 1 < self.sequence.len() {
            self.cursor += 1;
            return self.emit_frame_change(old);
        }

        // End of the forward sequence
        if self.config.play_reverse_after_loop
            && self.config.has_valid_loop_segment(&self.frames)
        {
            if let Some(window) = self.window {
                self.reverse = PlaybackSequence::build_reverse(window, &self.config.speed_ranges);
                self.cursor = 0;
                self.phase = PlaybackPhase::Reverse;
                debug!("Player {} entering reverse pass ({} entries)", self.id, self.reverse.len());
                return self.emit_frame_change(old);
            }
        }

        if !self.config.should_loop {
            self.phase = PlaybackPhase::Finished;
            self.emit_complete();
            debug!("Player {} finished on frame {:?}", self.id, self.current_frame());
            return false; // frozen on the last frame
        }

        debug!("Player {} sequence wrap", self.id);
        self.cursor = 0;
        self.emit_frame_change(old)
    }

    fn advance_reverse(&mut self) -> bool {
        let old = self.current_frame();

        if self.cursor + 1 < self.reverse.len() {
            self.cursor += 1;
            return self.emit_frame_change(old);
        }

        // Reverse pass done: idle until the next configuration reset
        self.phase = PlaybackPhase::Idle;
        self.resume_from_reverse = true;
        self.emit_complete();
        debug!("Player {} reverse pass complete, idle", self.id);
        false
    }

    /// Rebuild the sequence from the current frame set and configuration,
    /// then reset the cursor per the reset policy.
    fn rebuild(&mut self) {
        let old = self.current_frame();

        self.window = resolve_window(self.config.frame_range, self.frames.len());
        self.sequence = match self.window {
            Some(w) => PlaybackSequence::build(
                w,
                &self.config.speed_ranges,
                &self.config.loop_segments,
                self.config.ping_pong,
            ),
            None => PlaybackSequence::default(),
        };
        self.reverse = PlaybackSequence::default();

        // A ping-pong rebuild right after a reverse pass resumes at the
        // window's end frame so the cycle continues where reverse left off
        let resume = std::mem::take(&mut self.resume_from_reverse);
        self.cursor = if resume && self.config.ping_pong {
            self.window
                .and_then(|w| self.sequence.position_of_frame(w.end))
                .unwrap_or(0)
        } else {
            0
        };

        self.phase = if self.sequence.is_empty() {
            PlaybackPhase::Idle
        } else {
            PlaybackPhase::Forward
        };
        self.completed = false;
        self.last_advance = None;
        self.hold_until = None;

        debug!(
            "Player {} rebuilt: {} entries, cursor {}",
            self.id,
            self.sequence.len(),
            self.cursor
        );
        self.events.emit(PlayerEvent::SequenceRebuilt { player: self.id });
        self.emit_frame_change(old);
    }

    /// Commit the frame under the cursor; emit FrameChanged when it differs
    /// from `old`
    fn emit_frame_change(&mut self, old: Option<usize>) -> bool {
        let new = self.frame_at_cursor();
        self.visible = new;
        if old == new {
            return false;
        }
        if let (Some(old_frame), Some(new_frame)) = (old, new) {
            self.events.emit(PlayerEvent::FrameChanged {
                player: self.id,
                old_frame,
                new_frame,
            });
        }
        true
    }

    fn emit_complete(&mut self) {
        if !self.completed {
            self.completed = true;
            self.events.emit(PlayerEvent::AnimationComplete { player: self.id });
        }
    }
}
