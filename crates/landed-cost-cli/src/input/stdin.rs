use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Request piped on stdin, deserialised straight into `T`.
///
/// Interactive terminals are never read, so running a command without
/// `--input` falls through to its flags instead of blocking.
pub fn read_piped<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().lock().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

/// Whitespace-only input counts as no request (e.g. `echo | landed calc`).
fn parse_piped<T: DeserializeOwned>(buffer: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let body = buffer.trim();
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| format!("stdin is not a valid request: {}", e).into())
}
