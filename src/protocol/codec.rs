//! Newline-delimited JSON framing for stdio transport

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Serialize a protocol message to a single JSON line
///
/// # Errors
/// Returns error if JSON serialization fails
pub fn encode_line<T: Serialize>(message: &T) -> Result<String> {
    let json = serde_json::to_string(message)?;
    Ok(format!("{json}\n"))
}

/// Deserialize a protocol message from one line of input
///
/// # Errors
/// Returns error if JSON deserialization fails
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T> {
    Ok(serde_json::from_str(line.trim())?)
}
