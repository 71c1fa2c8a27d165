//! Image upload validation.
//!
//! Uploaded files become self-contained `data:` URIs so a stored design can be
//! rebuilt without any external file lookup.

use atelier_core::UploadError;
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

/// Validate an uploaded file and encode it as a base64 data URI
///
/// # Arguments
///
/// * `mime` - Declared MIME type; must start with `image/`
/// * `bytes` - File contents
/// * `max_bytes` - Upload limit in bytes
pub fn encode_upload(mime: &str, bytes: &[u8], max_bytes: usize) -> Result<String, UploadError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") {
        return Err(UploadError::NotAnImage { mime });
    }
    if bytes.len() > max_bytes {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }

    Ok(format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(bytes)
    ))
}

/// Guess a MIME type from a file name
pub fn mime_from_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

/// Read a file from disk and encode it as an upload
pub fn encode_file(path: &Path, max_bytes: usize) -> anyhow::Result<String> {
    use anyhow::Context;

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let uri = encode_upload(&mime_from_path(path), &bytes, max_bytes)
        .with_context(|| format!("Rejected upload {}", path.display()))?;
    Ok(uri)
}
