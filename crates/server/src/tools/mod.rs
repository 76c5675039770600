//! MCP tool implementations.
//!
//! This module contains all tools exposed by the fitshell server.

pub mod cache_activate;
pub mod cache_status;
pub mod offline_fetch;

#[cfg(test)]
pub(crate) mod testing;

pub use cache_activate::activate_impl;
pub use cache_status::status_impl;
pub use offline_fetch::{OfflineFetchParams, fetch_impl};

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::ToolError;

/// Wrap a serializable output as a single pretty-printed text block.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json = serde_json::to_string_pretty(output)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
