use serde::Deserialize;

/// Standard backend envelope: `{ data: ... }` on success, `{ message }` on
/// failure. Both fields are optional on the wire so one shape covers both.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
}

/// Pull the human-readable message out of an error body, if any.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_slice(body).ok()?;
    if envelope.message.is_empty() {
        None
    } else {
        Some(envelope.message)
    }
}
