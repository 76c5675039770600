//! Host session-history interface and an in-memory implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::GuardId;

/// Marker stored with each history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Ordinary application navigation.
    Route,
    /// Sentinel pushed by the guard with this id.
    Anchor(GuardId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub location: String,
    pub state: EntryState,
}

impl HistoryEntry {
    pub fn route(location: impl Into<String>) -> Self {
        Self { location: location.into(), state: EntryState::Route }
    }

    pub fn anchor(guard: GuardId, location: impl Into<String>) -> Self {
        Self { location: location.into(), state: EntryState::Anchor(guard) }
    }

    pub fn is_anchor_of(&self, guard: GuardId) -> bool {
        self.state == EntryState::Anchor(guard)
    }
}

/// A history pop delivered by the host.
///
/// `location` is the entry the user landed on, when the host exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopEvent {
    pub location: Option<String>,
    pub state: EntryState,
}

pub type PopListener = Arc<dyn Fn(&PopEvent) + Send + Sync>;

/// Cancellation token returned by [`History::subscribe_pop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The host's session-history API.
///
/// Implementations must not deliver pop events synchronously from
/// `push_state`, `navigate` or `subscribe_pop`; pops only originate from user
/// gestures (or [`SessionHistory::go`] in the in-memory host).
pub trait History: Send + Sync {
    /// Location of the entry currently shown.
    fn location(&self) -> String;

    /// Push an entry after the current one, discarding forward entries.
    fn push_state(&self, entry: HistoryEntry);

    /// Perform a real application navigation.
    fn navigate(&self, location: &str);

    fn subscribe_pop(&self, listener: PopListener) -> ListenerId;

    /// Remove a listener. Returns false if it was already gone.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

struct Stack {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

/// In-memory session history: an entry stack with a cursor.
pub struct SessionHistory {
    stack: Mutex<Stack>,
    listeners: Mutex<Vec<(ListenerId, PopListener)>>,
    next_listener: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            stack: Mutex::new(Stack { entries: vec![HistoryEntry::route(initial)], cursor: 0 }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Move one entry back. Returns false at the start of history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Move one entry forward. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move the cursor by `delta` and deliver a pop event for the landed entry.
    ///
    /// Returns false, without dispatching, when the move is zero or out of range.
    pub fn go(&self, delta: isize) -> bool {
        let landed = {
            let mut stack = lock(&self.stack);
            let Some(target) = stack.cursor.checked_add_signed(delta) else {
                return false;
            };
            if delta == 0 || target >= stack.entries.len() {
                return false;
            }
            stack.cursor = target;
            stack.entries[target].clone()
        };

        self.dispatch(&PopEvent { location: Some(landed.location), state: landed.state });
        true
    }

    /// Deliver a pop event to every current listener.
    ///
    /// Listeners are snapshotted first, so a listener may push entries or
    /// unsubscribe while the event is being delivered.
    pub fn dispatch(&self, event: &PopEvent) {
        let listeners: Vec<PopListener> = lock(&self.listeners).iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn current(&self) -> HistoryEntry {
        let stack = lock(&self.stack);
        stack.entries[stack.cursor].clone()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        lock(&self.stack).entries.clone()
    }

    pub fn cursor(&self) -> usize {
        lock(&self.stack).cursor
    }

    pub fn len(&self) -> usize {
        lock(&self.stack).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

impl History for SessionHistory {
    fn location(&self) -> String {
        self.current().location
    }

    fn push_state(&self, entry: HistoryEntry) {
        let mut stack = lock(&self.stack);
        let keep = stack.cursor + 1;
        stack.entries.truncate(keep);
        stack.entries.push(entry);
        stack.cursor = keep;
    }

    fn navigate(&self, location: &str) {
        tracing::debug!(location, "navigating");
        self.push_state(HistoryEntry::route(location));
    }

    fn subscribe_pop(&self, listener: PopListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        listeners.len() != before
    }
}
