//! cache_status tool implementation.
//!
//! Reports the controller phase and the stores present in storage.

use fitshell_client::CacheController;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    /// Lifecycle phase of the controller.
    pub phase: String,
    /// Name of the current cache store.
    pub version: String,
    /// Every store in storage, oldest first.
    pub stores: Vec<String>,
    /// Entries in the current store.
    pub entries: u64,
    /// Number of assets in the install manifest.
    pub manifest_len: usize,
    /// ISO8601 timestamp of this report.
    pub checked_at: String,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(controller: &CacheController) -> Result<CallToolResult, McpError> {
    let status = controller.status().await?;

    let output = CacheStatusOutput {
        phase: status.phase.to_string(),
        version: status.version,
        stores: status.stores,
        entries: status.entries,
        manifest_len: controller.manifest().len(),
        checked_at: chrono::Utc::now().to_rfc3339(),
    };

    Ok(json_result(&output)?)
}
