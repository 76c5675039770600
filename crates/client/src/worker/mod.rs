//! Offline cache controller.
//!
//! Drives one cache generation through `install -> activate -> fetch*`:
//!
//! - **install** pre-caches the asset manifest into the store named by the
//!   current [`CacheVersion`](fitshell_core::CacheVersion), all or nothing.
//! - **activate** deletes every store whose name is not the current version.
//! - **fetch** answers from the store when it can and writes successful
//!   same-origin network responses back into it.
//!
//! Each handler takes the storage or store handle it works on explicitly;
//! [`CacheController`] only sequences them and tracks the [`Phase`].

mod activate;
mod controller;
mod install;
mod manifest;
mod strategy;

#[cfg(test)]
mod testing;

pub use activate::{ActivationReport, activate};
pub use controller::{CacheController, CacheStatus, ControllerHandle, LifecycleEvent, Phase};
pub use install::install;
pub use manifest::Manifest;
pub use strategy::{Fetched, ResponseSource, cache_first, is_cacheable};
