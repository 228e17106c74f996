//! Request body rewriting.
//!
//! Injects the selected rank into a JSON object body. Only POST requests with
//! a non-empty body are rewritten; other methods pass through untouched even
//! when they carry a body and a routing key.

use axum::body::Bytes;
use axum::http::Method;
use serde_json::Value;
use thiserror::Error;

/// Body field the backend reads the rank from.
pub const RANK_FIELD: &str = "data_parallel_rank";

/// The body could not be rewritten.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("request body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("request body is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Whether a request with a routing key gets its body rewritten.
pub fn should_rewrite(method: &Method, body: &[u8]) -> bool {
    method == Method::POST && !body.is_empty()
}

/// Insert (or overwrite) [`RANK_FIELD`] in a JSON object body.
///
/// Other fields keep their values and their order.
pub fn inject_rank(body: &[u8], rank: u64) -> Result<Bytes, DecodeError> {
    let mut document: Value = serde_json::from_slice(body)?;

    let object = match &mut document {
        Value::Object(map) => map,
        other => return Err(DecodeError::NotAnObject(kind(other))),
    };
    object.insert(RANK_FIELD.to_string(), Value::from(rank));

    Ok(Bytes::from(serde_json::to_vec(&document)?))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
