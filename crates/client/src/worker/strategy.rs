//! Cache-first fetch with write-back.

use fitshell_core::{CacheStore, Error, Request, Response, ResponseType};
use serde::Serialize;

use crate::fetch::Network;

/// Where a fetched response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub response: Response,
    pub source: ResponseSource,
}

/// Whether a network response may be written to the store.
///
/// Only `200` same-origin answers to whole-resource GET requests qualify.
/// Partial (`206`), empty (`204`), opaque, cross-origin, redirect and error
/// responses are passed through untouched.
pub fn is_cacheable(request: &Request, response: &Response) -> bool {
    request.is_get() && !request.is_range() && response.status == 200 && response.response_type == ResponseType::Basic
}

/// Serve `request` from `store`, falling back to the network on a miss.
///
/// Store failures are logged and treated as a miss or a skipped write; the
/// caller still gets the network response. Network failures propagate.
pub async fn cache_first(store: &CacheStore, network: &dyn Network, request: Request) -> Result<Fetched, Error> {
    if request.is_get() && !request.is_range() {
        match store.match_request(&request).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, store = store.name(), "cache hit");
                return Ok(Fetched { response, source: ResponseSource::Cache });
            }
            Ok(None) => tracing::debug!(url = %request.url, store = store.name(), "cache miss"),
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; using network"),
        }
    }

    let response = network.fetch(request.clone()).await?;

    if !is_cacheable(&request, &response) {
        tracing::debug!(
            url = %request.url,
            status = response.status,
            response_type = %response.response_type,
            "response not cacheable"
        );
        return Ok(Fetched { response, source: ResponseSource::Network });
    }

    let copy = response.clone();
    if let Err(e) = store.put(&request, &copy).await {
        tracing::warn!(url = %request.url, error = %e, "cache write failed; response still delivered");
    }

    Ok(Fetched { response, source: ResponseSource::Network })
}
