#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tracks which levels the player may select.

const FIRST_LEVEL: u32 = 1;

/// Ordered set of unlocked level ids. Level one is always present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progression {
    unlocked: Vec<u32>,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

impl Progression {
    /// Creates a tracker with only the first level unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            unlocked: vec![FIRST_LEVEL],
        }
    }

    /// Unlocks a level. Returns `true` if it was newly added.
    pub fn unlock(&mut self, level: u32) -> bool {
        if level == 0 || self.is_unlocked(level) {
            return false;
        }
        self.unlocked.push(level);
        true
    }

    /// Reports whether the level may be selected.
    #[must_use]
    pub fn is_unlocked(&self, level: u32) -> bool {
        self.unlocked.contains(&level)
    }

    /// Unlocked level ids in unlock order.
    #[must_use]
    pub fn unlocked(&self) -> &[u32] {
        &self.unlocked
    }

    /// Forgets every unlock except the first level.
    pub fn reset(&mut self) {
        self.unlocked.clear();
        self.unlocked.push(FIRST_LEVEL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_is_idempotent() {
        let mut progression = Progression::new();
        assert!(progression.unlock(2));
        assert!(!progression.unlock(2));
        assert!(!progression.unlock(1));
        assert_eq!(progression.unlocked(), &[1, 2]);
    }

    #[test]
    fn reset_returns_to_first_level() {
        let mut progression = Progression::new();
        let _ = progression.unlock(2);
        let _ = progression.unlock(3);
        progression.reset();
        assert_eq!(progression.unlocked(), &[1]);
        assert!(progression.is_unlocked(1));
        assert!(!progression.is_unlocked(3));
    }

    #[test]
    fn level_zero_is_never_unlocked() {
        let mut progression = Progression::new();
        assert!(!progression.unlock(0));
        assert!(!progression.is_unlocked(0));
    }
}
