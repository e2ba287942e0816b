//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag polled voluntarily at suspension points; setting it never
/// forcibly aborts work already in flight.
///
/// Clones share the same underlying flag, so the caller keeps one handle and
/// passes another into the run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the whole run.
    pub fn set(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Resets the flag at the start of a run.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_set());
        token.set();
        assert!(other.is_set());
        other.clear();
        assert!(!token.is_set());
    }
}
