//! History-anchor navigation guard.
//!
//! A guard neutralizes back/forward attempts (hardware back button, edge swipe,
//! keyboard shortcuts) by pushing an anchor entry onto session history and
//! re-pushing it on every observed pop. Two variants share the protocol:
//!
//! - [`AnchorGuard`] absorbs every attempt; an optional telemetry callback sees
//!   each one but cannot release the lock.
//! - [`ConfirmGuard`] hands each attempt to a callback as a [`Transition`], which
//!   the callback resolves with [`Transition::proceed`] or [`Transition::reset`],
//!   immediately or after its own confirmation flow.
//!
//! The host history is reached through the [`History`] trait;
//! [`SessionHistory`] is an in-memory implementation.

mod anchor;
mod confirm;
pub mod gesture;
pub mod history;
mod protocol;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::AppConfig;

pub use anchor::{AnchorGuard, PopAttempt};
pub use confirm::ConfirmGuard;
pub use gesture::{Gesture, KeyChord};
pub use history::{EntryState, History, HistoryEntry, ListenerId, PopEvent, PopListener, SessionHistory};
pub use protocol::Transition;

/// Identifies one guard instance; tags the anchor entries it pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuardId(u64);

impl GuardId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Kind of navigation a [`Transition`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pop,
}

/// What triggered an intercepted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptSource {
    /// The host delivered a history pop.
    History,
    /// A keyboard shortcut was swallowed before the host acted on it.
    Key(Gesture),
}

/// Options shared by both guard variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOptions {
    /// Where `proceed()` goes when the attempt carried no usable target.
    pub default_route: String,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self { default_route: "/".to_string() }
    }
}

impl GuardOptions {
    pub fn with_default_route(route: impl Into<String>) -> Self {
        Self { default_route: route.into() }
    }
}

impl From<&AppConfig> for GuardOptions {
    fn from(config: &AppConfig) -> Self {
        Self::with_default_route(config.default_route.clone())
    }
}

/// Failures inside the guard. None of these release the lock.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("navigation callback panicked: {0}")]
    CallbackPanicked(String),
}
