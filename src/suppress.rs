//! Feedback-suppression bookkeeping.
//!
//! Every synthetic key event the engine injects is echoed back through the OS
//! hook. Before each injected key-down or key-up, one pending-ignore credit is
//! added here; the listener side consumes one credit per reported press or
//! release and drops the event, so the engine's own output never re-enters the
//! history or triggers commands.

use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Pending {
    presses: usize,
    releases: usize,
}

/// Shared pending-ignore counters for presses and releases.
///
/// Cloning shares the underlying counters: the injection layer credits, the
/// manager consumes. Counters never go below zero; consuming at zero simply
/// reports that the event was genuine user input.
#[derive(Debug, Clone, Default)]
pub struct SuppressionCounters {
    inner: Arc<Mutex<Pending>>,
}

impl SuppressionCounters {
    /// Create counters with no pending credits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` pending press credits. Call immediately before injecting the
    /// key-downs that will produce the echoes.
    pub fn credit_presses(&self, n: usize) {
        self.lock().presses += n;
    }

    /// Add `n` pending release credits.
    pub fn credit_releases(&self, n: usize) {
        self.lock().releases += n;
    }

    /// Consume one press credit. Returns false when none are pending, i.e.
    /// the observed press is genuine.
    pub fn consume_press(&self) -> bool {
        let mut pending = self.lock();
        if pending.presses > 0 {
            pending.presses -= 1;
            true
        } else {
            false
        }
    }

    /// Consume one release credit. Returns false when none are pending.
    pub fn consume_release(&self) -> bool {
        let mut pending = self.lock();
        if pending.releases > 0 {
            pending.releases -= 1;
            true
        } else {
            false
        }
    }

    /// Current `(presses, releases)` pending counts.
    pub fn pending(&self) -> (usize, usize) {
        let pending = self.lock();
        (pending.presses, pending.releases)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_consume() {
        let counters = SuppressionCounters::new();
        counters.credit_presses(2);
        counters.credit_releases(1);
        assert_eq!(counters.pending(), (2, 1));

        assert!(counters.consume_press());
        assert!(counters.consume_press());
        assert!(!counters.consume_press());

        assert!(counters.consume_release());
        assert!(!counters.consume_release());
        assert_eq!(counters.pending(), (0, 0));
    }

    #[test]
    fn test_consume_at_zero_is_genuine_input() {
        let counters = SuppressionCounters::new();
        // Never goes negative, no matter how often it is consumed.
        for _ in 0..5 {
            assert!(!counters.consume_press());
            assert!(!counters.consume_release());
        }
        assert_eq!(counters.pending(), (0, 0));
    }

    #[test]
    fn test_clones_share_state() {
        let counters = SuppressionCounters::new();
        let other = counters.clone();
        counters.credit_presses(1);
        assert!(other.consume_press());
        assert!(!counters.consume_press());
    }
}
