//! Controller fixtures for tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use fitshell_client::{CacheController, ControllerHandle, Manifest, Network};
use fitshell_core::{CacheStorage, CacheVersion, Error, Request, Response, ResponseType};
use rmcp::model::CallToolResult;
use url::Url;

pub(crate) const ORIGIN: &str = "https://app.example";

/// Serves fixed bodies for same-origin paths; everything else is a 404.
pub(crate) struct FixedNetwork {
    bodies: HashMap<String, &'static str>,
}

impl FixedNetwork {
    pub(crate) fn new(routes: &[(&str, &'static str)]) -> Self {
        let origin = Url::parse(ORIGIN).unwrap();
        let bodies = routes
            .iter()
            .map(|(path, body)| (origin.join(path).unwrap().to_string(), *body))
            .collect();
        Self { bodies }
    }
}

#[async_trait::async_trait]
impl Network for FixedNetwork {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        let (status, body) = match self.bodies.get(request.url.as_str()) {
            Some(body) => (200, *body),
            None => (404, "not found"),
        };
        let response_type =
            if request.url.host_str() == Some("app.example") { ResponseType::Basic } else { ResponseType::Cors };
        Ok(Response {
            url: request.url,
            status,
            status_text: String::new(),
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: Bytes::from_static(body.as_bytes()),
            response_type,
        })
    }
}

/// A running controller with `/index.html` in its manifest.
pub(crate) async fn running(routes: &[(&str, &'static str)]) -> (Arc<CacheController>, ControllerHandle, Url) {
    let origin = Url::parse(ORIGIN).unwrap();
    let storage = CacheStorage::open_in_memory().await.unwrap();
    let manifest = Manifest::resolve(&origin, &["/index.html"]).unwrap();
    let controller = Arc::new(CacheController::new(
        storage,
        Arc::new(FixedNetwork::new(routes)),
        CacheVersion::new("fitshell-v1").unwrap(),
        manifest,
    ));
    let handle = Arc::clone(&controller).spawn(8);
    (controller, handle, origin)
}

/// Parse the JSON text block of a tool result.
pub(crate) fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
