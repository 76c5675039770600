//! SQLite-backed storage for versioned offline cache stores.
//!
//! A [`CacheStorage`] holds any number of named [`CacheStore`]s. Each store maps
//! a request key (method + URL) to a stored response. Store names are cache
//! versions: the controller keeps exactly one current store and deletes the rest.
//!
//! - Keys are SHA-256 over method and canonical URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Deleting a store cascades to its entries

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;
pub mod version;

pub use crate::Error;

pub use connection::CacheStorage;
pub use entries::StoredEntry;
pub use stores::CacheStore;
pub use version::{CacheVersion, DEFAULT_CACHE_VERSION};
