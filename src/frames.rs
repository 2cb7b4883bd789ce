//! Frame sets and playback windows
//!
//! **Why**: A player animates an ordered list of image locators. The list is
//! fixed for the lifetime of one player instance; a window can restrict
//! playback to a sub-interval without touching the set itself.
//!
//! **Used by**: Sequence builder (window sweep), Player (window resolution),
//! AssetLoader (locator registration)
//!
//! # Window Normalization
//!
//! Requested windows are never rejected: bounds are clamped into
//! `0..frame_count-1` and inverted bounds are swapped. An empty frame set
//! has no window at all.

use log::debug;
use serde::{Deserialize, Serialize};

/// Ordered, immutable set of image locators.
///
/// Indices run `0..len()-1`. The locator strings are opaque to this crate;
/// the embedding host decodes and displays them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSet {
    locators: Vec<String>,
}

impl FrameSet {
    /// Create a frame set from ordered image locators
    pub fn new(locators: Vec<String>) -> Self {
        Self { locators }
    }

    /// Number of frames in the set
    #[inline]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// True when the set holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Locator for frame `index`, if in bounds
    pub fn get(&self, index: usize) -> Option<&str> {
        self.locators.get(index).map(|s| s.as_str())
    }

    /// All locators in frame order
    pub fn locators(&self) -> &[String] {
        &self.locators
    }

    /// Iterate locators in frame order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locators.iter().map(|s| s.as_str())
    }
}

impl From<Vec<String>> for FrameSet {
    fn from(locators: Vec<String>) -> Self {
        Self::new(locators)
    }
}

impl From<Vec<&str>> for FrameSet {
    fn from(locators: Vec<&str>) -> Self {
        Self::new(locators.into_iter().map(String::from).collect())
    }
}

/// Inclusive frame-index window `[start, end]` over a [`FrameSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: usize,
    pub end: usize,
}

impl FrameRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Window covering a whole frame set, or `None` for an empty set
    pub fn full(frame_count: usize) -> Option<Self> {
        if frame_count == 0 {
            return None;
        }
        Some(Self { start: 0, end: frame_count - 1 })
    }

    /// Clamp this window into `0..frame_count-1`, swapping inverted bounds.
    ///
    /// Returns `None` only for an empty frame set.
    pub fn clamped(self, frame_count: usize) -> Option<Self> {
        if frame_count == 0 {
            return None;
        }
        let max = frame_count - 1;
        let start = self.start.min(max);
        let end = self.end.min(max);
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        if start != self.start || end != self.end {
            debug!(
                "Window [{}, {}] clamped to [{}, {}] ({} frames)",
                self.start, self.end, start, end, frame_count
            );
        }
        Some(Self { start, end })
    }

    /// Number of frames in the window (inclusive bounds)
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false // inclusive bounds: a normalized window holds at least one frame
    }

    /// True when `index` falls inside the window
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

/// Resolve the active window for a frame set: explicit windows are clamped,
/// no window means the whole set. `None` when the set is empty.
pub fn resolve_window(range: Option<FrameRange>, frame_count: usize) -> Option<FrameRange> {
    match range {
        Some(r) => r.clamped(frame_count),
        None => FrameRange::full(frame_count),
    }
}
