//! Response parsing and normalization.
//!
//! Converts a raw `(status, body)` pair into either a value or a
//! [`RequestError`]. Only status 200 counts as success.
//!
//! Without a schema the body is sniffed:
//! - leading `{` or `[` → JSON
//! - contains a comma → CSV with a header row, one mapping per record
//! - anything else → `{"text": body}`
//!
//! The comma rule misclassifies plain text that happens to contain a comma.
//! It is kept for compatibility with existing callers; a Content-Type check
//! would be the stricter alternative.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status used for bodies that fail to parse or validate.
pub const PARSE_FAILURE_STATUS: u16 = 500;

/// Upstream or parse failure carried alongside a request result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RequestError {
    pub code: u16,
    pub message: String,
}

impl RequestError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Either the parsed value or the failure, never both.
pub type ParsedResult<T> = Result<T, RequestError>;

/// Parse a response without a schema, sniffing the body format.
pub fn parse_response(status: u16, body: &str) -> ParsedResult<Value> {
    if status != 200 {
        return Err(RequestError::new(status, body));
    }

    if body.starts_with('{') || body.starts_with('[') {
        serde_json::from_str(body).map_err(parse_failure)
    } else if body.contains(',') {
        parse_csv(body).map_err(parse_failure)
    } else {
        let mut map = Map::new();
        map.insert("text".to_string(), Value::String(body.to_string()));
        Ok(Value::Object(map))
    }
}

/// Parse a response strictly against `T`.
pub fn parse_typed<T: DeserializeOwned>(status: u16, body: &str) -> ParsedResult<T> {
    if status != 200 {
        return Err(RequestError::new(status, body));
    }
    serde_json::from_str(body).map_err(parse_failure)
}

fn parse_failure(err: impl std::fmt::Display) -> RequestError {
    tracing::warn!("failed to parse upstream response: {}", err);
    RequestError::new(PARSE_FAILURE_STATUS, err.to_string())
}

/// Header-driven CSV: each record becomes a mapping of header → field.
///
/// Short records yield `null` for the missing columns; surplus fields are dropped.
fn parse_csv(body: &str) -> Result<Value, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let field = record.get(i).map_or(Value::Null, |f| Value::String(f.to_string()));
                (header.clone(), field)
            })
            .collect();
        rows.push(Value::Object(row));
    }

    Ok(Value::Array(rows))
}
