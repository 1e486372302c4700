//! Inline image helpers.
//!
//! Images travel as base64 payloads between the client, this service and the
//! model, and are stored on messages as `data:` URLs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// MIME type attached to uploaded photos.
pub const UPLOAD_MIME: &str = "image/jpeg";
/// MIME type attached to generated renders.
pub const GENERATED_MIME: &str = "image/png";

/// Build a `data:` URL from a base64 payload.
#[must_use]
pub fn to_data_url(mime: &str, base64_payload: &str) -> String {
    format!("data:{mime};base64,{base64_payload}")
}

/// Extract the base64 payload from a `data:` URL.
#[must_use]
pub fn payload_of(data_url: &str) -> Option<&str> {
    let rest = data_url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    Some(payload)
}

/// Check that a payload is valid standard base64.
///
/// # Errors
/// Returns the decode error for malformed payloads.
pub fn validate_base64(payload: &str) -> Result<(), base64::DecodeError> {
    BASE64.decode(payload.trim().as_bytes()).map(|_| ())
}
