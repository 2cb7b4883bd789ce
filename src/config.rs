//! Player configuration: speed ranges, loop segments, playback flags
//!
//! **Why**: The embedding page declares the whole animation up front
//! (which frames run fast, which sub-segment repeats, whether playback
//! ping-pongs) and the engine derives a playback sequence from it.
//!
//! **Used by**: Sequence builder (expansion parameters), Player (reset
//! policy on configuration change)
//!
//! # Degradation Rules
//!
//! Misconfiguration is never rejected:
//! - Loop segments outside the active window are clamped into it
//! - Loop segments with `end < start` or `times < 2` are discarded
//! - Non-positive speed multipliers act as 1.0 (uniform speed)
//!
//! Overlapping speed ranges resolve first-declared-wins.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::frames::{FrameRange, FrameSet};

/// Closed frame-index interval with a playback-speed multiplier.
///
/// `multiplier > 1` plays the interval faster (fewer repeats per frame),
/// `multiplier < 1` slower (more repeats per frame).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub start: usize,
    pub end: usize,
    pub multiplier: f32,
}

impl SpeedRange {
    pub fn new(start: usize, end: usize, multiplier: f32) -> Self {
        Self { start, end, multiplier }
    }

    /// True when `index` falls inside this range
    #[inline]
    pub fn covers(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

/// Speed multiplier for `index`: first declared range covering it wins,
/// uniform speed (1.0) when none does or the winner is non-positive.
pub fn speed_multiplier_for(index: usize, ranges: &[SpeedRange]) -> f32 {
    for range in ranges {
        if range.covers(index) {
            if range.multiplier > 0.0 {
                return range.multiplier;
            }
            return 1.0;
        }
    }
    1.0
}

/// Closed sub-interval replayed in place during forward playback.
///
/// When the forward sweep reaches `end`, the interval `[start, end]` is
/// emitted `times - 1` additional passes before playback continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSegment {
    pub start: usize,
    pub end: usize,
    pub times: u32,
}

impl LoopSegment {
    pub fn new(start: usize, end: usize, times: u32) -> Self {
        Self { start, end, times }
    }
}

/// Normalize loop segments against the active window: clamp bounds into
/// `[window.start, window.end]`, drop inverted segments and `times < 2`.
pub fn normalize_segments(segments: &[LoopSegment], window: FrameRange) -> Vec<LoopSegment> {
    let mut out = Vec::with_capacity(segments.len());
    for seg in segments {
        if seg.times < 2 {
            continue; // no repetition requested
        }
        let start = seg.start.clamp(window.start, window.end);
        let end = seg.end.clamp(window.start, window.end);
        if end < start {
            warn!(
                "Loop segment [{}, {}] inverted after clamping to [{}, {}], dropped",
                seg.start, seg.end, window.start, window.end
            );
            continue;
        }
        out.push(LoopSegment { start, end, times: seg.times });
    }
    out
}

/// Declarative player configuration.
///
/// Changing any field that shapes the playback sequence (window, speed
/// ranges, loop segments, ping-pong, reverse-after-loop) forces a rebuild
/// and position reset; `base_fps`, `should_loop` and `paused` take effect
/// in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Nominal playback rate, steps per second through the sequence
    pub base_fps: f32,
    /// Per-interval speed multipliers (optional, empty = uniform speed)
    pub speed_ranges: Vec<SpeedRange>,
    /// In-place repeated sub-segments (optional, empty = no repeats)
    pub loop_segments: Vec<LoopSegment>,
    /// Playback window, `None` = whole frame set
    pub frame_range: Option<FrameRange>,
    /// Append a backward half so the cycle runs forward-then-backward
    pub ping_pong: bool,
    /// After the forward pass ends, play one full-window reverse pass then
    /// go idle (requires at least one valid loop segment)
    pub play_reverse_after_loop: bool,
    /// Wrap to the sequence start when the forward pass ends
    pub should_loop: bool,
    /// Freeze on the current frame while set
    pub paused: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            base_fps: 30.0,
            speed_ranges: Vec::new(),
            loop_segments: Vec::new(),
            frame_range: None,
            ping_pong: false,
            play_reverse_after_loop: false,
            should_loop: true,
            paused: false,
        }
    }
}

impl PlayerConfig {
    /// True when switching from `self` to `next` must rebuild the playback
    /// sequence and reset the cursor.
    pub fn rebuild_required(&self, next: &Self) -> bool {
        self.frame_range != next.frame_range
            || self.speed_ranges != next.speed_ranges
            || self.loop_segments != next.loop_segments
            || self.ping_pong != next.ping_pong
            || self.play_reverse_after_loop != next.play_reverse_after_loop
    }

    /// True when at least one loop segment survives normalization against
    /// the window resolved for `frames`.
    pub fn has_valid_loop_segment(&self, frames: &FrameSet) -> bool {
        match crate::frames::resolve_window(self.frame_range, frames.len()) {
            Some(window) => !normalize_segments(&self.loop_segments, window).is_empty(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_multiplier_first_match_wins() {
        let ranges = vec![
            SpeedRange::new(0, 5, 2.0),
            SpeedRange::new(3, 8, 0.5),
        ];
        assert_eq!(speed_multiplier_for(4, &ranges), 2.0); // overlap: first declared
        assert_eq!(speed_multiplier_for(7, &ranges), 0.5);
        assert_eq!(speed_multiplier_for(9, &ranges), 1.0); // uncovered
    }

    #[test]
    fn test_non_positive_multiplier_degrades_to_uniform() {
        let ranges = vec![SpeedRange::new(0, 3, 0.0), SpeedRange::new(0, 3, -2.0)];
        assert_eq!(speed_multiplier_for(1, &ranges), 1.0);
    }

    #[test]
    fn test_normalize_clamps_into_window() {
        let window = FrameRange::new(2, 8);
        let segs = vec![LoopSegment::new(0, 20, 3)];
        let out = normalize_segments(&segs, window);
        assert_eq!(out, vec![LoopSegment::new(2, 8, 3)]);
    }

    #[test]
    fn test_normalize_drops_invalid() {
        let window = FrameRange::new(0, 9);
        let segs = vec![
            LoopSegment::new(5, 2, 3), // inverted
            LoopSegment::new(1, 4, 1), // times < 2
            LoopSegment::new(1, 4, 0),
            LoopSegment::new(6, 8, 2), // valid
        ];
        let out = normalize_segments(&segs, window);
        assert_eq!(out, vec![LoopSegment::new(6, 8, 2)]);
    }

    #[test]
    fn test_rebuild_required() {
        let base = PlayerConfig::default();

        let mut fps = base.clone();
        fps.base_fps = 60.0;
        assert!(!base.rebuild_required(&fps));

        let mut paused = base.clone();
        paused.paused = true;
        assert!(!base.rebuild_required(&paused));

        let mut looping = base.clone();
        looping.should_loop = false;
        assert!(!base.rebuild_required(&looping));

        let mut window = base.clone();
        window.frame_range = Some(FrameRange::new(1, 5));
        assert!(base.rebuild_required(&window));

        let mut pp = base.clone();
        pp.ping_pong = true;
        assert!(base.rebuild_required(&pp));

        let mut segs = base.clone();
        segs.loop_segments.push(LoopSegment::new(0, 2, 3));
        assert!(base.rebuild_required(&segs));
    }

    #[test]
    fn test_has_valid_loop_segment() {
        let frames = FrameSet::from(vec!["0", "1", "2", "3"]);
        let mut cfg = PlayerConfig::default();
        assert!(!cfg.has_valid_loop_segment(&frames));

        cfg.loop_segments.push(LoopSegment::new(1, 2, 1));
        assert!(!cfg.has_valid_loop_segment(&frames)); // times < 2 discarded

        cfg.loop_segments.push(LoopSegment::new(1, 2, 2));
        assert!(cfg.has_valid_loop_segment(&frames));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let cfg = PlayerConfig {
            base_fps: 24.0,
            speed_ranges: vec![SpeedRange::new(0, 10, 2.0)],
            loop_segments: vec![LoopSegment::new(2, 5, 3)],
            frame_range: Some(FrameRange::new(0, 40)),
            ping_pong: true,
            play_reverse_after_loop: false,
            should_loop: true,
            paused: false,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PlayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
