///
/// Bookmark codec helpers.
///
/// This module owns the opaque wire-token format used for page bookmarks.
/// It intentionally contains only token encoding/decoding logic and no query
/// semantics. Hex keeps the token URL-safe without an escaping layer.
///

// Defensive decode bound for untrusted bookmark token input.
const MAX_BOOKMARK_TOKEN_HEX_LEN: usize = 8 * 1024;

///
/// BookmarkDecodeError
///

#[derive(Debug, Eq, thiserror::Error, PartialEq)]
pub(crate) enum BookmarkDecodeError {
    #[error("bookmark token is empty")]
    Empty,

    #[error("bookmark token exceeds max length: {len} hex chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("bookmark token must have an even number of hex characters")]
    OddLength,

    #[error("invalid hex character at position {position}")]
    InvalidHex { position: usize },
}

/// Encode raw bookmark bytes as a lowercase hex token.
#[must_use]
pub(crate) fn encode_bookmark(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Decode a lowercase/uppercase hex bookmark token into raw bytes.
///
/// The token may include surrounding whitespace, which is trimmed.
pub(crate) fn decode_bookmark(token: &str) -> Result<Vec<u8>, BookmarkDecodeError> {
    let token = token.trim();

    if token.is_empty() {
        return Err(BookmarkDecodeError::Empty);
    }

    if token.len() > MAX_BOOKMARK_TOKEN_HEX_LEN {
        return Err(BookmarkDecodeError::TooLong {
            len: token.len(),
            max: MAX_BOOKMARK_TOKEN_HEX_LEN,
        });
    }

    if !token.len().is_multiple_of(2) {
        return Err(BookmarkDecodeError::OddLength);
    }

    let mut bytes = Vec::with_capacity(token.len() / 2);
    for (index, chunk) in token.as_bytes().chunks_exact(2).enumerate() {
        let high = hex_nibble(chunk[0]).ok_or(BookmarkDecodeError::InvalidHex {
            position: index * 2,
        })?;
        let low = hex_nibble(chunk[1]).ok_or(BookmarkDecodeError::InvalidHex {
            position: index * 2 + 1,
        })?;
        bytes.push((high << 4) | low);
    }

    Ok(bytes)
}

const fn hex_nibble(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

///
/// TESTS
///
