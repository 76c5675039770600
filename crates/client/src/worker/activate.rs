//! Removal of stale cache generations.

use fitshell_core::{CacheStorage, CacheVersion, Error};
use futures_util::future::join_all;
use serde::Serialize;

/// What an activation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivationReport {
    /// The current store, if it exists.
    pub kept: Option<String>,
    /// Stores that were deleted.
    pub deleted: Vec<String>,
    /// Stores whose deletion failed, with the error message.
    pub failed: Vec<(String, String)>,
}

/// Delete every store not named `version`.
///
/// Deletions run concurrently. A failed deletion is logged and reported but
/// does not fail the pass; only an error listing the stores does.
pub async fn activate(storage: &CacheStorage, version: &CacheVersion) -> Result<ActivationReport, Error> {
    let names = storage.store_names().await?;
    let mut report = ActivationReport::default();

    let stale: Vec<String> = names
        .into_iter()
        .filter(|name| {
            if version.is_stale(name) {
                true
            } else {
                report.kept = Some(name.clone());
                false
            }
        })
        .collect();

    let deletions = stale.iter().map(|name| async move { (name, storage.delete_store(name).await) });

    for (name, outcome) in join_all(deletions).await {
        match outcome {
            Ok(_) => {
                tracing::info!(store = %name, "deleted stale cache store");
                report.deleted.push(name.clone());
            }
            Err(e) => {
                tracing::warn!(store = %name, error = %e, "failed to delete stale cache store");
                report.failed.push((name.clone(), e.to_string()));
            }
        }
    }

    tracing::info!(
        current = version.as_str(),
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "cache activated"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_activate_deletes_other_versions() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        for name in ["fitshell-v0", "scratch", "fitshell-v1"] {
            storage.open_store(name).await.unwrap();
        }
        let version = CacheVersion::new("fitshell-v1").unwrap();

        let report = activate(&storage, &version).await.unwrap();

        assert_eq!(report.kept.as_deref(), Some("fitshell-v1"));
        let mut deleted = report.deleted.clone();
        deleted.sort();
        assert_eq!(deleted, vec!["fitshell-v0".to_string(), "scratch".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(storage.store_names().await.unwrap(), vec!["fitshell-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_without_current_store() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("fitshell-v0").await.unwrap();
        let version = CacheVersion::new("fitshell-v1").unwrap();

        let report = activate(&storage, &version).await.unwrap();

        assert_eq!(report.kept, None);
        assert_eq!(report.deleted, vec!["fitshell-v0".to_string()]);
        assert!(storage.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_deletion_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let storage = CacheStorage::open(&path).await.unwrap();
        for name in ["pinned", "fitshell-v0", "fitshell-v1"] {
            storage.open_store(name).await.unwrap();
        }

        let admin = tokio_rusqlite::Connection::open(&path).await.unwrap();
        admin
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER keep_pinned BEFORE DELETE ON cache_stores
                     WHEN old.name = 'pinned'
                     BEGIN SELECT RAISE(ABORT, 'store is pinned'); END;",
                )
            })
            .await
            .unwrap();

        let version = CacheVersion::new("fitshell-v1").unwrap();
        let report = activate(&storage, &version).await.unwrap();

        assert_eq!(report.kept.as_deref(), Some("fitshell-v1"));
        assert_eq!(report.deleted, vec!["fitshell-v0".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "pinned");
        assert!(report.failed[0].1.contains("store is pinned"));

        let mut remaining = storage.store_names().await.unwrap();
        remaining.sort();
        assert_eq!(remaining, vec!["fitshell-v1".to_string(), "pinned".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("fitshell-v1").await.unwrap();
        let version = CacheVersion::new("fitshell-v1").unwrap();

        activate(&storage, &version).await.unwrap();
        let report = activate(&storage, &version).await.unwrap();

        assert!(report.deleted.is_empty());
        assert_eq!(report.kept.as_deref(), Some("fitshell-v1"));
    }
}
