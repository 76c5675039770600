//! offline_fetch tool implementation.
//!
//! Sends a request through the cache controller, so the answer comes from the
//! current cache store when possible.

use fitshell_client::fetch::{content_type, resolve};
use fitshell_client::{ControllerHandle, ResponseSource};
use fitshell_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::json_result;
use crate::error::ToolError;

const METHODS: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Input parameters for offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchParams {
    /// Absolute URL, or a path resolved against the app origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET responses are cached.
    #[serde(default)]
    pub method: Option<String>,
}

/// Output structure for offline_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineFetchOutput {
    /// The URL requested, after resolution.
    pub url: String,
    /// Final URL of the response.
    pub final_url: String,
    pub status: u16,
    /// basic, cors, opaque or error.
    pub response_type: String,
    pub content_type: Option<String>,
    /// "cache" or "network".
    pub source: String,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the offline_fetch tool.
pub async fn fetch_impl(
    handle: &ControllerHandle, origin: &Url, params: OfflineFetchParams,
) -> Result<CallToolResult, McpError> {
    let method = params.method.as_deref().unwrap_or("GET").to_ascii_uppercase();
    if !METHODS.contains(&method.as_str()) {
        return Err(ToolError::InvalidInput(format!("unsupported method: {method}")).into());
    }

    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let fetched = handle.fetch(Request::new(&method, url.clone())).await?;

    let response = fetched.response;
    let source = match fetched.source {
        ResponseSource::Cache => "cache",
        ResponseSource::Network => "network",
    };
    tracing::debug!(url = %url, status = response.status, source, "offline_fetch");

    let output = OfflineFetchOutput {
        url: url.to_string(),
        final_url: response.url.to_string(),
        status: response.status,
        response_type: response.response_type.to_string(),
        content_type: content_type(&response),
        source: source.to_string(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
    };

    Ok(json_result(&output)?)
}
