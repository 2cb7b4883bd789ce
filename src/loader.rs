//! Asset readiness tracking with refcounted acquisition
//!
//! **Why**: The render binding must not show a half-loaded animation. An
//! explicit, injectable service replaces ambient module-level image maps,
//! so multiple player instances sharing frames never race over loader
//! callbacks: each instance acquires the set, the host reports per-locator
//! decode results, and the binding gates visibility on `is_ready`.
//!
//! **Used by**: Embedding host (decode callbacks), render binding
//! (visibility gate)
//!
//! # Fail-Soft Policy
//!
//! A failed locator stays failed: there is no retry, and a set containing
//! one failed locator never becomes ready. The animation is permanently
//! withheld rather than surfaced as an error.

use indexmap::IndexMap;
use log::{debug, warn};
use std::sync::{Arc, Mutex};

use crate::frames::FrameSet;

/// Readiness of one tracked locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    /// Acquired, decode result not reported yet
    Pending,
    /// Host reported a successful decode
    Ready,
    /// Host reported a failed decode (sticky, no retry)
    Failed,
}

#[derive(Debug)]
struct AssetEntry {
    refs: usize,
    state: AssetState,
}

/// Shared, refcounted asset-readiness registry.
///
/// Cloning shares the underlying registry; entries live from the first
/// `acquire` referencing them until the last `release`.
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    assets: Arc<Mutex<IndexMap<String, AssetEntry>>>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every locator of `frames`, bumping refcounts.
    ///
    /// Locators already tracked (by this or another player) keep their
    /// state; new ones start Pending.
    pub fn acquire(&self, frames: &FrameSet) {
        let mut assets = self.assets.lock().unwrap_or_else(|e| e.into_inner());
        for locator in frames.iter() {
            match assets.get_mut(locator) {
                Some(entry) => entry.refs += 1,
                None => {
                    assets.insert(
                        locator.to_string(),
                        AssetEntry { refs: 1, state: AssetState::Pending },
                    );
                }
            }
        }
        debug!("Acquired {} locators ({} tracked)", frames.len(), assets.len());
    }

    /// Drop one reference per locator of `frames`; untracked entries are
    /// removed when their refcount reaches zero.
    pub fn release(&self, frames: &FrameSet) {
        let mut assets = self.assets.lock().unwrap_or_else(|e| e.into_inner());
        for locator in frames.iter() {
            if let Some(entry) = assets.get_mut(locator) {
                entry.refs = entry.refs.saturating_sub(1);
                if entry.refs == 0 {
                    assets.shift_remove(locator);
                }
            }
        }
        debug!("Released {} locators ({} tracked)", frames.len(), assets.len());
    }

    /// Host callback: `locator` decoded successfully.
    ///
    /// A failed locator stays failed; readiness after failure is ignored.
    pub fn mark_ready(&self, locator: &str) {
        let mut assets = self.assets.lock().unwrap_or_else(|e| e.into_inner());
        match assets.get_mut(locator) {
            Some(entry) if entry.state == AssetState::Failed => {
                warn!("Locator {} already failed, ready signal ignored", locator);
            }
            Some(entry) => entry.state = AssetState::Ready,
            None => debug!("Ready signal for untracked locator {}", locator),
        }
    }

    /// Host callback: `locator` failed to decode. Sticky.
    pub fn mark_failed(&self, locator: &str) {
        let mut assets = self.assets.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = assets.get_mut(locator) {
            entry.state = AssetState::Failed;
            warn!("Locator {} failed to load, set will never become ready", locator);
        }
    }

    /// Readiness of one locator, `None` when untracked
    pub fn state(&self, locator: &str) -> Option<AssetState> {
        let assets = self.assets.lock().unwrap_or_else(|e| e.into_inner());
        assets.get(locator).map(|e| e.state)
    }

    /// True when every locator of `frames` is Ready.
    ///
    /// The render binding keeps the player invisible until this holds.
    pub fn is_ready(&self, frames: &FrameSet) -> bool {
        let assets = self.assets.lock().unwrap_or_else(|e| e.into_inner());
        frames.iter().all(|locator| {
            assets
                .get(locator)
                .map(|e| e.state == AssetState::Ready)
                .unwrap_or(false)
        })
    }

    /// Number of tracked locators
    pub fn tracked(&self) -> usize {
        self.assets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> FrameSet {
        FrameSet::from(vec!["a.png", "b.png", "c.png"])
    }

    #[test]
    fn test_acquire_starts_pending() {
        let loader = AssetLoader::new();
        let set = frames();
        loader.acquire(&set);

        assert_eq!(loader.tracked(), 3);
        assert_eq!(loader.state("a.png"), Some(AssetState::Pending));
        assert!(!loader.is_ready(&set));
    }

    #[test]
    fn test_ready_gating_is_all_or_nothing() {
        let loader = AssetLoader::new();
        let set = frames();
        loader.acquire(&set);

        loader.mark_ready("a.png");
        loader.mark_ready("b.png");
        assert!(!loader.is_ready(&set));

        loader.mark_ready("c.png");
        assert!(loader.is_ready(&set));
    }

    #[test]
    fn test_failure_is_sticky() {
        let loader = AssetLoader::new();
        let set = frames();
        loader.acquire(&set);

        loader.mark_ready("a.png");
        loader.mark_ready("b.png");
        loader.mark_failed("c.png");
        assert!(!loader.is_ready(&set));

        // Late ready signal does not resurrect the failed asset
        loader.mark_ready("c.png");
        assert_eq!(loader.state("c.png"), Some(AssetState::Failed));
        assert!(!loader.is_ready(&set));
    }

    #[test]
    fn test_release_drops_at_zero_refs() {
        let loader = AssetLoader::new();
        let set = frames();
        loader.acquire(&set);
        loader.release(&set);

        assert_eq!(loader.tracked(), 0);
        assert_eq!(loader.state("a.png"), None);
    }

    #[test]
    fn test_shared_acquisition_survives_one_release() {
        let loader = AssetLoader::new();
        let set = frames();

        // Two players share the same frames
        loader.acquire(&set);
        loader.acquire(&set);
        for l in set.iter() {
            loader.mark_ready(l);
        }

        loader.release(&set);
        assert_eq!(loader.tracked(), 3);
        assert!(loader.is_ready(&set));

        loader.release(&set);
        assert_eq!(loader.tracked(), 0);
    }

    #[test]
    fn test_empty_set_is_trivially_ready() {
        let loader = AssetLoader::new();
        let set = FrameSet::new(Vec::new());
        assert!(loader.is_ready(&set));
    }

    #[test]
    fn test_untracked_signals_are_ignored() {
        let loader = AssetLoader::new();
        loader.mark_ready("ghost.png");
        loader.mark_failed("ghost.png");
        assert_eq!(loader.tracked(), 0);
    }
}
