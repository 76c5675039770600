//! Cache generation names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Cache generation shipped with this build. Bump on every release so that
/// activation purges the previous generation's store.
pub const DEFAULT_CACHE_VERSION: &str = "fitshell-v1";

/// Name of one generation of cached assets.
///
/// Exactly one version is current; every other store name found in storage
/// is stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(String);

impl CacheVersion {
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("cache version cannot be empty".into()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a store name found in storage belongs to another generation.
    pub fn is_stale(&self, store_name: &str) -> bool {
        self.0 != store_name
    }
}

impl Default for CacheVersion {
    fn default() -> Self {
        Self(DEFAULT_CACHE_VERSION.to_string())
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_version_rejected() {
        assert!(matches!(CacheVersion::new(""), Err(Error::InvalidInput(_))));
        assert!(matches!(CacheVersion::new("   "), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_is_stale() {
        let current = CacheVersion::new("v2").unwrap();
        assert!(current.is_stale("v1"));
        assert!(!current.is_stale("v2"));
    }

    #[test]
    fn test_default_version() {
        assert_eq!(CacheVersion::default().as_str(), DEFAULT_CACHE_VERSION);
    }
}
