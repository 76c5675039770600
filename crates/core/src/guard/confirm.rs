//! Lock whose release is decided by a confirmation callback.

use std::sync::Arc;

use super::protocol::{Lock, Transition};
use super::{GuardId, GuardOptions, History, KeyChord};

/// Routes each back/forward attempt through a callback.
///
/// The callback receives a [`Transition`] and calls `proceed()` to leave or
/// `reset()` to stay, either before returning or later (for instance after a
/// dialog resolves). Until `proceed()` runs, the guard keeps absorbing pops.
pub struct ConfirmGuard {
    lock: Lock,
}

impl ConfirmGuard {
    pub fn new(
        history: Arc<dyn History>, options: GuardOptions, on_attempt: impl Fn(Transition) + Send + Sync + 'static,
    ) -> Self {
        Self { lock: Lock::new(history, options, Box::new(on_attempt)) }
    }

    pub fn id(&self) -> GuardId {
        self.lock.id()
    }

    pub fn enable(&self) {
        self.lock.enable();
    }

    pub fn disable(&self) {
        self.lock.disable();
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Target captured from the most recent unresolved attempt.
    pub fn pending(&self) -> Option<String> {
        self.lock.pending()
    }

    /// Whether the host should suppress this key press.
    pub fn intercept_key(&self, chord: &KeyChord) -> bool {
        chord.gesture().is_some_and(|gesture| self.lock.report_key(gesture))
    }
}
