//! Pre-caching the asset manifest.

use std::time::Instant;

use fitshell_core::{CacheStorage, CacheStore, CacheVersion, Error, Request, Response};
use futures_util::future::join_all;

use super::manifest::Manifest;
use crate::fetch::Network;

/// Fetch every manifest URL and store the responses under `version`.
///
/// All fetches run concurrently. If any of them fails or returns a
/// non-success status, nothing is written and the error names the first
/// failing URL in manifest order. On success every response lands in a
/// single transaction.
pub async fn install(
    storage: &CacheStorage,
    network: &dyn Network,
    version: &CacheVersion,
    manifest: &Manifest,
) -> Result<CacheStore, Error> {
    let start = Instant::now();
    let store = storage.open_store(version.as_str()).await?;

    tracing::info!(store = store.name(), assets = manifest.len(), "installing cache");

    let fetches = manifest.urls().iter().map(|url| async move {
        let request = Request::get(url.clone());
        let outcome = network.fetch(request.clone()).await;
        (request, outcome)
    });

    let mut pairs: Vec<(Request, Response)> = Vec::with_capacity(manifest.len());
    for (request, outcome) in join_all(fetches).await {
        let response = outcome.map_err(|e| Error::InstallFailed { url: request.url.to_string(), reason: e.to_string() })?;
        if !response.is_success() {
            return Err(Error::InstallFailed {
                url: request.url.to_string(),
                reason: format!("status {}", response.status),
            });
        }
        pairs.push((request, response));
    }

    store
        .put_all(&pairs)
        .await
        .inspect_err(|e| tracing::error!(store = store.name(), error = %e, "install commit failed"))?;

    tracing::info!(
        store = store.name(),
        assets = pairs.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "cache installed"
    );

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{StubNetwork, get, origin};

    fn manifest(paths: &[&str]) -> Manifest {
        Manifest::resolve(&origin(), paths).unwrap()
    }

    #[tokio::test]
    async fn test_install_stores_every_asset() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = StubNetwork::new().ok("/index.html", b"<html>").ok("/manifest.json", b"{}");
        let version = CacheVersion::new("v1").unwrap();

        let store = install(&storage, &network, &version, &manifest(&["/index.html", "/manifest.json"]))
            .await
            .unwrap();

        assert_eq!(store.name(), "v1");
        assert_eq!(store.len().await.unwrap(), 2);
        let index = store.match_request(&get("/index.html")).await.unwrap().unwrap();
        assert_eq!(&index.body[..], b"<html>");
        assert_eq!(network.calls(), 2);
    }

    #[tokio::test]
    async fn test_install_missing_asset_stores_nothing() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = StubNetwork::new().ok("/index.html", b"<html>").ok("/manifest.json", b"{}");
        let version = CacheVersion::new("v1").unwrap();

        let result = install(
            &storage,
            &network,
            &version,
            &manifest(&["/index.html", "/manifest.json", "/icons/icon-192.png"]),
        )
        .await;

        match result {
            Err(Error::InstallFailed { url, reason }) => {
                assert_eq!(url, "https://app.example/icons/icon-192.png");
                assert_eq!(reason, "status 404");
            }
            other => panic!("expected InstallFailed, got {other:?}"),
        }

        let store = storage.store("v1").await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_install_network_error_stores_nothing() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = StubNetwork::new().ok("/index.html", b"<html>").fail("/images/hero.jpg");
        let version = CacheVersion::new("v1").unwrap();

        let result = install(&storage, &network, &version, &manifest(&["/index.html", "/images/hero.jpg"])).await;

        assert!(matches!(result, Err(Error::InstallFailed { .. })));
        assert!(storage.store("v1").await.unwrap().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_reinstall_replaces_entries() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let version = CacheVersion::new("v1").unwrap();
        let paths = manifest(&["/index.html"]);

        install(&storage, &StubNetwork::new().ok("/index.html", b"old"), &version, &paths)
            .await
            .unwrap();
        let store = install(&storage, &StubNetwork::new().ok("/index.html", b"new"), &version, &paths)
            .await
            .unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        let index = store.match_request(&get("/index.html")).await.unwrap().unwrap();
        assert_eq!(&index.body[..], b"new");
    }
}
