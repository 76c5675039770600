//! Core types and shared functionality for fitshell.
//!
//! This crate provides:
//! - Versioned cache storage with SQLite backend
//! - Request/response values shared by storage and the fetch path
//! - The history-anchor navigation guard
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;

pub use cache::{CacheStorage, CacheStore, CacheVersion};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, RequestMode, Response, ResponseType};
