//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mcp-alphafold server, plus
//! the shared rendering of lookup results.
//!
//! Lookup tools never fail at the protocol level for upstream or input
//! problems: they return `{"error": "<code>: <message>"}` flagged as a tool
//! error. Only cache maintenance surfaces protocol errors.

pub mod alphafold;
pub mod cache;
pub mod uniprot;

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::{Map, Value, json};

use foldmcp_client::ParsedResult;
use foldmcp_core::Error;

pub(crate) fn default_true() -> bool {
    true
}

/// Render a lookup outcome as a tool result.
///
/// `output_json` selects pretty JSON text content; otherwise the value goes
/// into structured content. Structured content must be an object, so
/// non-object values are wrapped as `{"results": value}`.
pub fn render<T: Serialize>(outcome: Result<ParsedResult<T>, Error>, output_json: bool) -> CallToolResult {
    let failure = match outcome {
        Ok(Ok(value)) => match serde_json::to_value(&value) {
            Ok(value) => return render_success(value, output_json),
            Err(e) => format!("500: failed to serialize result: {e}"),
        },
        Ok(Err(request_error)) => request_error.to_string(),
        Err(error) => error.to_string(),
    };

    tracing::debug!("tool call failed: {}", failure);
    render_error(json!({ "error": failure }), output_json)
}

fn render_success(value: Value, output_json: bool) -> CallToolResult {
    if output_json {
        CallToolResult::success(vec![Content::text(to_pretty(&value))])
    } else {
        CallToolResult::structured(into_object(value))
    }
}

fn render_error(payload: Value, output_json: bool) -> CallToolResult {
    if output_json {
        CallToolResult::error(vec![Content::text(to_pretty(&payload))])
    } else {
        CallToolResult::structured_error(payload)
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn into_object(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        other => {
            let mut map = Map::new();
            map.insert("results".to_string(), other);
            Value::Object(map)
        }
    }
}
