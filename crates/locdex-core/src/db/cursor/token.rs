use crate::{
    db::{
        cursor::{BookmarkBoundary, QuerySignature},
        direction::Direction,
    },
    serialize::{deserialize, serialize},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

const MAX_BOOKMARK_TOKEN_BYTES: usize = 4 * 1024;

///
/// BookmarkToken
/// Opaque bookmark payload bound to a query-shape signature.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct BookmarkToken {
    signature: QuerySignature,
    boundary: BookmarkBoundary,
    direction: Direction,
}

impl BookmarkToken {
    pub(in crate::db) const fn new(
        signature: QuerySignature,
        boundary: BookmarkBoundary,
        direction: Direction,
    ) -> Self {
        Self {
            signature,
            boundary,
            direction,
        }
    }

    pub(crate) const fn signature(&self) -> QuerySignature {
        self.signature
    }

    pub(crate) const fn boundary(&self) -> &BookmarkBoundary {
        &self.boundary
    }

    pub(in crate::db) const fn direction(&self) -> Direction {
        self.direction
    }

    pub(in crate::db) fn into_parts(self) -> (BookmarkBoundary, Direction) {
        (self.boundary, self.direction)
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, BookmarkTokenError> {
        let wire = BookmarkTokenWire {
            version: BookmarkTokenVersion::V1.encode(),
            signature: self.signature.into_bytes(),
            boundary: self.boundary.clone(),
            direction: self.direction,
        };

        serialize(&wire).map_err(|err| BookmarkTokenError::Encode(err.to_string()))
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, BookmarkTokenError> {
        if bytes.len() > MAX_BOOKMARK_TOKEN_BYTES {
            return Err(BookmarkTokenError::Decode(
                "token exceeds maximum allowed size".into(),
            ));
        }

        let wire: BookmarkTokenWire =
            deserialize(bytes).map_err(|err| BookmarkTokenError::Decode(err.to_string()))?;

        // Decode the protocol version first so compatibility behavior stays
        // centralized.
        BookmarkTokenVersion::decode(wire.version)?;

        Ok(Self {
            signature: QuerySignature::from_bytes(wire.signature),
            boundary: wire.boundary,
            direction: wire.direction,
        })
    }

    #[cfg(test)]
    pub(crate) fn encode_with_version_for_test(
        &self,
        version: u8,
    ) -> Result<Vec<u8>, BookmarkTokenError> {
        let wire = BookmarkTokenWire {
            version,
            signature: self.signature.into_bytes(),
            boundary: self.boundary.clone(),
            direction: self.direction,
        };

        serialize(&wire).map_err(|err| BookmarkTokenError::Encode(err.to_string()))
    }
}

///
/// BookmarkTokenError
/// Bookmark token encoding/decoding failures.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub(crate) enum BookmarkTokenError {
    #[error("failed to encode bookmark token: {0}")]
    Encode(String),

    #[error("failed to decode bookmark token: {0}")]
    Decode(String),

    #[error("unsupported bookmark token version: {version}")]
    UnsupportedVersion { version: u8 },
}

///
/// BookmarkTokenVersion
///
/// Wire-level token version owned by the bookmark protocol boundary.
/// This keeps version parsing and compatibility behavior centralized.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum BookmarkTokenVersion {
    V1,
}

impl BookmarkTokenVersion {
    const V1_TAG: u8 = 1;

    const fn decode(raw: u8) -> Result<Self, BookmarkTokenError> {
        match raw {
            Self::V1_TAG => Ok(Self::V1),
            version => Err(BookmarkTokenError::UnsupportedVersion { version }),
        }
    }

    const fn encode(self) -> u8 {
        match self {
            Self::V1 => Self::V1_TAG,
        }
    }
}

///
/// BookmarkTokenWire
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct BookmarkTokenWire {
    version: u8,
    signature: [u8; 32],
    boundary: BookmarkBoundary,
    #[serde(default)]
    direction: Direction,
}

///
/// TESTS
///
