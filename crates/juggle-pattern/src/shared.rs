//! A pattern shared between an editing thread and rendering threads.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::PatternError;
use crate::pattern::{LayoutState, Pattern};

/// [`LayoutState`] stored in an atomic so it can be read without the lock.
#[derive(Debug)]
struct AtomicLayoutState(AtomicU8);

impl AtomicLayoutState {
    fn new(state: LayoutState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn load(&self) -> LayoutState {
        LayoutState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: LayoutState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Coarse lock around a [`Pattern`].
///
/// Readers hold the read lock for as long as they sample the layout; edits
/// and layout take the write lock. The layout state is mirrored outside the
/// lock so a render loop can poll [`SharedPattern::needs_layout`] cheaply.
#[derive(Debug)]
pub struct SharedPattern {
    pattern: RwLock<Pattern>,
    state: AtomicLayoutState,
}

impl SharedPattern {
    #[must_use]
    pub fn new(pattern: Pattern) -> Self {
        let state = AtomicLayoutState::new(pattern.state());
        Self {
            pattern: RwLock::new(pattern),
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> LayoutState {
        self.state.load()
    }

    #[must_use]
    pub fn needs_layout(&self) -> bool {
        self.state() != LayoutState::Clean
    }

    /// Mutate the pattern under the write lock.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Pattern) -> R) -> R {
        let mut pattern = self.pattern.write();
        let out = f(&mut pattern);
        self.state.store(pattern.state());
        out
    }

    /// Lay the pattern out, holding the write lock throughout.
    pub fn relayout(&self) -> Result<(), PatternError> {
        let mut pattern = self.pattern.write();
        self.state.store(LayoutState::LayingOut);
        let result = pattern.layout();
        self.state.store(pattern.state());
        result
    }

    /// Read access for queries.
    pub fn read(&self) -> RwLockReadGuard<'_, Pattern> {
        self.pattern.read()
    }

    #[must_use]
    pub fn into_inner(self) -> Pattern {
        self.pattern.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_edits() {
        let shared = SharedPattern::new(Pattern::new(1, 1));
        assert!(shared.needs_layout());
        shared.edit(|p| p.set_title(Some("t".to_string())));
        assert_eq!(shared.state(), LayoutState::Dirty);
        assert!(shared.relayout().is_err());
        assert_eq!(shared.state(), LayoutState::Dirty);
        assert_eq!(shared.read().title(), Some("t"));
    }
}
