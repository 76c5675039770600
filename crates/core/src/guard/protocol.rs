//! Lock protocol shared by both guard variants.
//!
//! A pop observed while locked is handled in two phases. Phase one re-pushes
//! the anchor and cannot fail. Phase two records the attempted target and hands
//! a [`Transition`] to the variant's callback; a panicking callback is caught and
//! logged. Phase two never runs before phase one has returned.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::history::{EntryState, History, HistoryEntry, ListenerId, PopEvent, PopListener};
use super::{Action, AttemptSource, GuardError, GuardId, GuardOptions};

pub(crate) type Dispatch = Box<dyn Fn(Transition) + Send + Sync>;

#[derive(Debug, Default)]
struct LockState {
    locked: bool,
    pending: Option<String>,
    anchored_at: Option<String>,
    listener: Option<ListenerId>,
}

struct Inner {
    id: GuardId,
    history: Arc<dyn History>,
    options: GuardOptions,
    callback: Dispatch,
    state: Mutex<LockState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Phase one: put the anchor back on top. Returns false when unlocked.
    fn reanchor(&self) -> bool {
        let state = self.state();
        if !state.locked {
            return false;
        }
        let at = state.anchored_at.clone().unwrap_or_else(|| self.history.location());
        self.history.push_state(HistoryEntry::anchor(self.id, at));
        true
    }

    /// Record the attempted target. Landing on one of our own anchors, or an
    /// event without a location, yields no target.
    fn capture(&self, event: &PopEvent) -> Option<String> {
        let target = match (&event.location, event.state) {
            (_, EntryState::Anchor(id)) if id == self.id => None,
            (Some(location), _) => Some(location.clone()),
            (None, _) => None,
        };
        self.state().pending = target.clone();
        target
    }

    /// Phase two: hand the attempt to the variant's callback.
    fn dispatch(self: &Arc<Self>, target: Option<String>, source: AttemptSource) -> Result<(), GuardError> {
        let location = target.unwrap_or_else(|| self.options.default_route.clone());
        let transition =
            Transition { location, action: Action::Pop, source, guard: self.id, lock: Arc::downgrade(self) };

        catch_unwind(AssertUnwindSafe(|| (self.callback)(transition))).map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            GuardError::CallbackPanicked(message)
        })
    }

    fn on_pop(self: &Arc<Self>, event: &PopEvent) {
        if !self.reanchor() {
            return;
        }
        let target = self.capture(event);
        tracing::debug!(guard = ?self.id, target = ?target, "absorbed history pop");

        if let Err(e) = self.dispatch(target, AttemptSource::History) {
            tracing::error!(guard = ?self.id, error = %e, "lock kept after callback failure");
        }
    }

    fn release(&self) -> Option<ListenerId> {
        let mut state = self.state();
        state.locked = false;
        state.pending = None;
        state.listener.take()
    }
}

/// An intercepted navigation attempt awaiting a decision.
///
/// Until [`proceed`](Self::proceed) is called, every further pop is
/// re-anchored the same way. A transition only holds a weak reference to its
/// guard; once the guard is dropped, resolving it does nothing.
pub struct Transition {
    location: String,
    action: Action,
    source: AttemptSource,
    guard: GuardId,
    lock: Weak<Inner>,
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("location", &self.location)
            .field("action", &self.action)
            .field("source", &self.source)
            .field("guard", &self.guard)
            .finish()
    }
}

impl Transition {
    /// Where the attempt was heading (or the default route).
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn source(&self) -> AttemptSource {
        self.source
    }

    /// Stop intercepting and navigate to this attempt's location.
    ///
    /// Attempts reported after this one do not change where it goes.
    pub fn proceed(self) {
        let Some(inner) = self.lock.upgrade() else {
            tracing::debug!(guard = ?self.guard, "guard gone; proceed ignored");
            return;
        };

        if let Some(id) = inner.release() {
            inner.history.unsubscribe(id);
        }
        tracing::info!(guard = ?inner.id, target = %self.location, "navigation released");
        inner.history.navigate(&self.location);
    }

    /// Drop the pending target and stay locked.
    pub fn reset(self) {
        if let Some(inner) = self.lock.upgrade() {
            inner.state().pending = None;
        }
    }
}

/// One guard's lock. Dropping it removes the pop listener.
pub(crate) struct Lock {
    inner: Arc<Inner>,
}

impl Lock {
    pub(crate) fn new(history: Arc<dyn History>, options: GuardOptions, dispatch: Dispatch) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: GuardId::next(),
                history,
                options,
                callback: dispatch,
                state: Mutex::new(LockState::default()),
            }),
        }
    }

    pub(crate) fn id(&self) -> GuardId {
        self.inner.id
    }

    /// Subscribe and push one anchor at the current location. No-op when
    /// already locked.
    pub(crate) fn enable(&self) {
        let inner = &self.inner;
        let mut state = inner.state();
        if state.locked {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(inner);
        let listener: PopListener = Arc::new(move |event: &PopEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.on_pop(event);
            }
        });

        let location = inner.history.location();
        state.listener = Some(inner.history.subscribe_pop(listener));
        inner.history.push_state(HistoryEntry::anchor(inner.id, location.clone()));
        state.anchored_at = Some(location.clone());
        state.pending = None;
        state.locked = true;

        tracing::info!(guard = ?inner.id, location = %location, "navigation locked");
    }

    /// Remove the listener. Anchors already pushed stay on the stack.
    pub(crate) fn disable(&self) {
        if let Some(id) = self.inner.release() {
            self.inner.history.unsubscribe(id);
            tracing::info!(guard = ?self.inner.id, "navigation unlocked");
        }
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.inner.state().locked
    }

    pub(crate) fn pending(&self) -> Option<String> {
        self.inner.state().pending.clone()
    }

    /// Report a swallowed keyboard shortcut. Returns false when unlocked.
    pub(crate) fn report_key(&self, gesture: super::Gesture) -> bool {
        if !self.is_locked() {
            return false;
        }
        self.inner.state().pending = None;
        tracing::debug!(guard = ?self.inner.id, ?gesture, "swallowed history shortcut");

        if let Err(e) = self.inner.dispatch(None, AttemptSource::Key(gesture)) {
            tracing::error!(guard = ?self.inner.id, error = %e, "lock kept after callback failure");
        }
        true
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        self.disable();
    }
}
