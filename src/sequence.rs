//! Playback sequence expansion
//!
//! **Why**: Variable apparent speed at a fixed clock. Instead of changing
//! the tick interval per frame, each frame index is emitted a repeat count
//! derived from its speed multiplier; the scheduler then walks the expanded
//! sequence at the base rate. Loop segments and the ping-pong half are baked
//! into the same flat list, so playback itself is a plain cursor walk.
//!
//! **Used by**: Player (forward and reverse playback)
//!
//! # Expansion Algorithm
//!
//! For each index in the window: `repeat = max(1, round(BASE_REPEAT_UNIT /
//! multiplier))` entries. After emitting an index that closes a loop
//! segment, the segment's interval is re-emitted `times - 1` more passes
//! (inner passes never re-trigger segments). With ping-pong, the interior
//! of the finished sequence is appended reversed, so the natural wrap forms
//! a seamless forward-backward cycle with no doubled endpoint frames.

use serde::{Deserialize, Serialize};

use crate::config::{LoopSegment, SpeedRange, normalize_segments, speed_multiplier_for};
use crate::frames::FrameRange;

/// Nominal repeat count per frame index at multiplier 1.
///
/// Not derived from `base_fps`: the builder trades repeat counts for
/// apparent speed while the tick interval stays constant.
pub const BASE_REPEAT_UNIT: f32 = 4.0;

/// How many consecutive entries one frame index contributes at `multiplier`
pub fn repeat_count(multiplier: f32) -> usize {
    let m = if multiplier > 0.0 { multiplier } else { 1.0 };
    let repeats = (BASE_REPEAT_UNIT / m).round() as i64;
    repeats.max(1) as usize
}

/// Immutable, fully expanded list of frame indices.
///
/// The only structure the scheduler reads during playback. Never mutated
/// once built; configuration changes rebuild it from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSequence {
    entries: Vec<usize>,
}

impl PlaybackSequence {
    /// Expand a window into the forward playback sequence.
    ///
    /// Loop segments are normalized against the window first (clamped,
    /// invalid ones dropped). With `ping_pong` and more than one entry,
    /// the reversed interior is appended.
    pub fn build(
        window: FrameRange,
        speed_ranges: &[SpeedRange],
        loop_segments: &[LoopSegment],
        ping_pong: bool,
    ) -> Self {
        let segments = normalize_segments(loop_segments, window);
        let mut entries = Vec::new();

        for i in window.start..=window.end {
            push_expanded(&mut entries, i, speed_ranges);
            for seg in segments.iter().filter(|s| s.end == i) {
                // First pass already emitted by the forward sweep
                for _ in 1..seg.times {
                    for j in seg.start..=seg.end {
                        push_expanded(&mut entries, j, speed_ranges);
                    }
                }
            }
        }

        if ping_pong && entries.len() > 1 {
            let interior: Vec<usize> =
                entries[1..entries.len() - 1].iter().rev().copied().collect();
            entries.extend(interior);
        }

        Self { entries }
    }

    /// Expand the full-window reverse pass: `window.end` down to
    /// `window.start` with the same per-index repeat logic, no loop
    /// segments, no ping-pong.
    pub fn build_reverse(window: FrameRange, speed_ranges: &[SpeedRange]) -> Self {
        let mut entries = Vec::new();
        for i in (window.start..=window.end).rev() {
            push_expanded(&mut entries, i, speed_ranges);
        }
        Self { entries }
    }

    /// Number of sequence entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frame index at sequence position `pos`
    #[inline]
    pub fn get(&self, pos: usize) -> Option<usize> {
        self.entries.get(pos).copied()
    }

    /// All entries in playback order
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    /// First sequence position showing `frame`
    pub fn position_of_frame(&self, frame: usize) -> Option<usize> {
        self.entries.iter().position(|&f| f == frame)
    }
}

/// Append `index` with its speed-derived repeat count
fn push_expanded(entries: &mut Vec<usize>, index: usize, speed_ranges: &[SpeedRange]) {
    let repeats = repeat_count(speed_multiplier_for(index, speed_ranges));
    for _ in 0..repeats {
        entries.push(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: usize, end: usize) -> FrameRange {
        FrameRange::new(start, end)
    }

    /// Speed range forcing repeat count 1 over the whole window
    fn flat(end: usize) -> Vec<SpeedRange> {
        vec![SpeedRange::new(0, end, BASE_REPEAT_UNIT)]
    }

    fn expand_by_four(frames: &[usize]) -> Vec<usize> {
        frames.iter().flat_map(|&f| std::iter::repeat(f).take(4)).collect()
    }

    #[test]
    fn test_repeat_count() {
        assert_eq!(repeat_count(1.0), 4);
        assert_eq!(repeat_count(2.0), 2);
        assert_eq!(repeat_count(0.5), 8);
        assert_eq!(repeat_count(4.0), 1);
        assert_eq!(repeat_count(16.0), 1); // never below 1
        assert_eq!(repeat_count(0.0), 4); // degraded to uniform
    }

    #[test]
    fn test_uniform_expansion() {
        let seq = PlaybackSequence::build(window(0, 2), &[], &[], false);
        assert_eq!(seq.entries(), &[0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_speed_range_halves_repeats() {
        let ranges = vec![SpeedRange::new(1, 2, 2.0)];
        let seq = PlaybackSequence::build(window(0, 3), &ranges, &[], false);
        assert_eq!(seq.entries(), &[0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_slow_range_doubles_repeats() {
        let ranges = vec![SpeedRange::new(0, 0, 0.5)];
        let seq = PlaybackSequence::build(window(0, 1), &ranges, &[], false);
        assert_eq!(seq.entries(), &[0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_overlapping_ranges_first_declared_wins() {
        let ranges = vec![
            SpeedRange::new(0, 2, 2.0),
            SpeedRange::new(1, 3, 0.5),
        ];
        let seq = PlaybackSequence::build(window(0, 3), &ranges, &[], false);
        // 0..2 at x2 (2 repeats), 3 at x0.5 (8 repeats)
        assert_eq!(seq.entries(), &[0, 0, 1, 1, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_loop_segment_replays_in_place() {
        let segs = vec![LoopSegment::new(2, 5, 3)];
        let seq = PlaybackSequence::build(window(0, 7), &[], &segs, false);

        let mut expected = expand_by_four(&[0, 1, 2, 3, 4, 5]);
        expected.extend(expand_by_four(&[2, 3, 4, 5])); // pass 2
        expected.extend(expand_by_four(&[2, 3, 4, 5])); // pass 3
        expected.extend(expand_by_four(&[6, 7]));
        assert_eq!(seq.entries(), expected.as_slice());
    }

    #[test]
    fn test_loop_segment_repeats_use_speed_ranges() {
        let segs = vec![LoopSegment::new(0, 1, 2)];
        let ranges = vec![SpeedRange::new(1, 1, 2.0)];
        let seq = PlaybackSequence::build(window(0, 1), &ranges, &segs, false);
        // forward: 0x4, 1x2; replay pass: 0x4, 1x2
        assert_eq!(seq.entries(), &[0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_segment_with_times_below_two_is_noop() {
        let segs = vec![LoopSegment::new(0, 1, 1)];
        let seq = PlaybackSequence::build(window(0, 2), &[], &segs, false);
        assert_eq!(seq.len(), 12);
    }

    #[test]
    fn test_segment_clamped_into_window() {
        // Segment reaches past the window; clamped end falls on window end
        let segs = vec![LoopSegment::new(1, 10, 2)];
        let seq = PlaybackSequence::build(window(0, 2), &[], &segs, false);
        let expected = expand_by_four(&[0, 1, 2, 1, 2]);
        assert_eq!(seq.entries(), expected.as_slice());
    }

    #[test]
    fn test_ping_pong_appends_reversed_interior() {
        let seq = PlaybackSequence::build(window(0, 2), &flat(2), &[], true);
        assert_eq!(seq.entries(), &[0, 1, 2, 1]);
    }

    #[test]
    fn test_ping_pong_two_entries_unchanged() {
        let seq = PlaybackSequence::build(window(0, 1), &flat(1), &[], true);
        assert_eq!(seq.entries(), &[0, 1]);
    }

    #[test]
    fn test_ping_pong_single_entry_unchanged() {
        let seq = PlaybackSequence::build(window(3, 3), &flat(3), &[], true);
        assert_eq!(seq.entries(), &[3]);
    }

    #[test]
    fn test_ping_pong_with_repeats() {
        let seq = PlaybackSequence::build(window(0, 2), &[], &[], true);
        let forward = expand_by_four(&[0, 1, 2]);
        let interior: Vec<usize> = forward[1..11].iter().rev().copied().collect();
        let expected: Vec<usize> = forward.iter().copied().chain(interior).collect();
        assert_eq!(seq.entries(), expected.as_slice());
    }

    #[test]
    fn test_build_reverse() {
        let seq = PlaybackSequence::build_reverse(window(0, 2), &[]);
        assert_eq!(seq.entries(), &[2, 2, 2, 2, 1, 1, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_build_reverse_applies_speed_ranges() {
        let ranges = vec![SpeedRange::new(2, 2, 2.0)];
        let seq = PlaybackSequence::build_reverse(window(0, 2), &ranges);
        assert_eq!(seq.entries(), &[2, 2, 1, 1, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_position_of_frame() {
        let seq = PlaybackSequence::build(window(0, 2), &[], &[], false);
        assert_eq!(seq.position_of_frame(0), Some(0));
        assert_eq!(seq.position_of_frame(2), Some(8));
        assert_eq!(seq.position_of_frame(5), None);
    }

    #[test]
    fn test_windowed_sequence() {
        let seq = PlaybackSequence::build(window(2, 3), &[], &[], false);
        assert_eq!(seq.entries(), &[2, 2, 2, 2, 3, 3, 3, 3]);
    }
}
