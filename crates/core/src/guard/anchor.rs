//! Unconditional "no back" lock.

use std::sync::Arc;

use super::protocol::{Lock, Transition};
use super::{AttemptSource, GuardId, GuardOptions, History, KeyChord};

/// An absorbed back/forward attempt, for telemetry only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopAttempt {
    /// Where the attempt was heading (or the default route).
    pub location: String,
    pub source: AttemptSource,
}

/// Absorbs every back/forward attempt while enabled.
///
/// The optional callback observes attempts; it has no way to release the lock.
/// Dropping the guard removes its listener.
pub struct AnchorGuard {
    lock: Lock,
}

impl AnchorGuard {
    pub fn new(history: Arc<dyn History>, options: GuardOptions) -> Self {
        Self::build(history, options, None)
    }

    pub fn with_telemetry(
        history: Arc<dyn History>, options: GuardOptions, on_attempt: impl Fn(&PopAttempt) + Send + Sync + 'static,
    ) -> Self {
        Self::build(history, options, Some(Box::new(on_attempt)))
    }

    fn build(
        history: Arc<dyn History>, options: GuardOptions, on_attempt: Option<Box<dyn Fn(&PopAttempt) + Send + Sync>>,
    ) -> Self {
        let lock = Lock::new(
            history,
            options,
            Box::new(move |transition: Transition| {
                let attempt = PopAttempt { location: transition.location().to_string(), source: transition.source() };
                transition.reset();
                if let Some(observe) = &on_attempt {
                    observe(&attempt);
                }
            }),
        );
        Self { lock }
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

    /// Whether the host should suppress this key press.
    pub fn intercept_key(&self, chord: &KeyChord) -> bool {
        chord.gesture().is_some_and(|gesture| self.lock.report_key(gesture))
    }
}
