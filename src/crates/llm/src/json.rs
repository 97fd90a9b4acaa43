//! Pull a single JSON object out of model text.
//!
//! Models are asked to reply with one JSON object but routinely wrap it in
//! markdown code fences or follow it with prose. Fences are stripped, then
//! the first JSON value starting at the first `{` is decoded and anything
//! after it is ignored. Anything that does not decode to an object is an error.

use crate::error::{LlmError, Result};
use serde_json::Value;

/// Strip a leading ```` ```json ```` / ```` ``` ```` fence and its closing fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json", "JSON", ...) up to the end of the line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Decode the JSON object contained in `text`.
pub fn extract_json_object(text: &str) -> Result<Value> {
    let body = strip_code_fence(text);

    let start = body
        .find('{')
        .ok_or_else(|| LlmError::InvalidResponse("no JSON object in response".to_string()))?;

    let value = serde_json::Deserializer::from_str(&body[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("unterminated JSON object in response".to_string()))?
        .map_err(|e| LlmError::InvalidResponse(format!("malformed JSON: {}", e)))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(LlmError::InvalidResponse("response JSON is not an object".to_string()))
    }
}
