//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FITSHELL_*)
//! 2. TOML config file (if FITSHELL_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheVersion, DEFAULT_CACHE_VERSION};

mod validation;

pub use validation::ConfigError;

/// Assets pre-cached at install time when no manifest is configured.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/index.html",
    "/manifest.json",
    "/favicon.ico",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
    "/images/hero.jpg",
];

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FITSHELL_*)
/// 2. TOML config file (if FITSHELL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation.
    ///
    /// Set via FITSHELL_CACHE_VERSION. Must change on every release.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the app is served from; manifest paths resolve against it and
    /// responses from any other origin are never cached.
    ///
    /// Set via FITSHELL_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Asset manifest pre-cached on install.
    ///
    /// Usually provided by build tooling through the TOML file.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via FITSHELL_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FITSHELL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via FITSHELL_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FITSHELL_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Route the navigation guard falls back to when a pop event carries no
    /// usable target.
    ///
    /// Set via FITSHELL_DEFAULT_ROUTE environment variable.
    #[serde(default = "default_route")]
    pub default_route: String,
}

fn default_cache_version() -> String {
    DEFAULT_CACHE_VERSION.into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_manifest() -> Vec<String> {
    DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./fitshell-cache.sqlite")
}

fn default_user_agent() -> String {
    "fitshell/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_route() -> String {
    "/".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            origin: default_origin(),
            manifest: default_manifest(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            default_route: default_route(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured cache generation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the version is empty.
    pub fn cache_version(&self) -> Result<CacheVersion, ConfigError> {
        CacheVersion::new(self.cache_version.clone())
            .map_err(|e| ConfigError::Invalid { field: "cache_version".into(), reason: e.to_string() })
    }

    /// The configured origin as a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin does not parse.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FITSHELL_`
    /// 2. TOML file from `FITSHELL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FITSHELL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FITSHELL_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_version, DEFAULT_CACHE_VERSION);
        assert_eq!(config.db_path, PathBuf::from("./fitshell-cache.sqlite"));
        assert_eq!(config.user_agent, "fitshell/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.default_route, "/");
        assert_eq!(config.manifest.len(), DEFAULT_MANIFEST.len());
        assert!(config.manifest.contains(&"/index.html".to_string()));
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_cache_version_accessor() {
        let config = AppConfig { cache_version: "build-42".into(), ..Default::default() };
        assert_eq!(config.cache_version().unwrap().as_str(), "build-42");
    }

    #[test]
    fn test_load_layers_env_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "fitshell.toml",
                r#"
                cache_version = "from-file"
                manifest = ["/index.html", "/app.js"]
                default_route = "/home"
                "#,
            )?;
            jail.set_env("FITSHELL_CONFIG_FILE", "fitshell.toml");
            jail.set_env("FITSHELL_CACHE_VERSION", "from-env");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.cache_version, "from-env");
            assert_eq!(config.manifest, vec!["/index.html".to_string(), "/app.js".to_string()]);
            assert_eq!(config.default_route, "/home");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FITSHELL_TIMEOUT_MS", "10");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
