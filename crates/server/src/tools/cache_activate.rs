//! cache_activate tool implementation.
//!
//! Re-runs activation: every store other than the current version is deleted.

use fitshell_client::ControllerHandle;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the cache_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheActivateOutput {
    /// The current store, if present.
    pub kept: Option<String>,
    /// Stores deleted by this pass.
    pub deleted: Vec<String>,
    /// Stores that could not be deleted, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Implementation of the cache_activate tool.
pub async fn activate_impl(handle: &ControllerHandle) -> Result<CallToolResult, McpError> {
    let report = handle.activate().await?;

    let output = CacheActivateOutput { kept: report.kept, deleted: report.deleted, failed: report.failed };

    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, running};

    #[tokio::test]
    async fn test_activate_before_install_fails() {
        let (_controller, handle, _) = running(&[("/index.html", "<html>")]).await;

        let err = activate_impl(&handle).await.unwrap_err();
        assert_eq!(err.code.0, -32022);
    }

    #[tokio::test]
    async fn test_activate_after_install() {
        let (_controller, handle, _) = running(&[("/index.html", "<html>")]).await;
        handle.install().await.unwrap();

        let out: CacheActivateOutput = output(&activate_impl(&handle).await.unwrap());

        assert_eq!(out.kept.as_deref(), Some("fitshell-v1"));
        assert!(out.deleted.is_empty());
        assert!(out.failed.is_empty());
    }
}
