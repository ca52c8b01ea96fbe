use crate::design::prelude::*;

///
/// MimeType
/// Lowercases and trims whitespace.
///

#[sanitizer]
pub struct MimeType;

impl Sanitizer<String> for MimeType {
    fn sanitize(&self, value: &mut String) -> Result<(), String> {
        let trimmed = value.trim();

        if trimmed.len() != value.len() {
            *value = trimmed.to_owned();
        }

        value.make_ascii_lowercase();

        Ok(())
    }
}

///
/// Url
/// Trims whitespace and ensures a valid scheme (adds `https://` if missing).
///

#[sanitizer]
pub struct Url;

impl Sanitizer<String> for Url {
    fn sanitize(&self, value: &mut String) -> Result<(), String> {
        let trimmed = value.trim();

        let mut normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        };

        *value = std::mem::take(&mut normalized);

        Ok(())
    }
}

///
/// TESTS
///
