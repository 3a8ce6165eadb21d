//! At-most-once delivery of the maintenance advisory

use std::sync::atomic::{AtomicBool, Ordering};

/// Session scoped record of whether the advisory has been shown.
///
/// Once closed, the gate never reopens.
#[derive(Debug, Default)]
pub struct NotificationGate {
    shown: AtomicBool,
}

impl NotificationGate {
    /// Create an open gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for exactly one caller, closing the gate in the same step.
    pub fn try_consume(&self) -> bool {
        self.shown
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// True until the advisory has been shown
    pub fn is_open(&self) -> bool {
        !self.shown.load(Ordering::Acquire)
    }
}
