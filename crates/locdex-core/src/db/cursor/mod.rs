mod boundary;
pub(crate) mod codec;
mod signature;
mod token;

pub(crate) use boundary::{
    BookmarkBoundary, BoundarySlot, apply_order_direction, compare_boundary_slots,
};
pub(crate) use signature::QuerySignature;
pub(crate) use token::{BookmarkToken, BookmarkTokenError};

use crate::{
    db::direction::Direction,
    error::{ErrorClass, ErrorOrigin, InternalError},
    obs,
};
use codec::BookmarkDecodeError;
use thiserror::Error as ThisError;

///
/// PlannedBookmark
/// Validated, executor-ready continuation state decoded from one token.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(in crate::db) struct PlannedBookmark {
    pub(in crate::db) boundary: BookmarkBoundary,
    pub(in crate::db) direction: Direction,
}

///
/// BookmarkError
/// Internal decode/validation failures. Never crosses the public surface:
/// every variant recovers as "no bookmark".
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub(in crate::db) enum BookmarkError {
    #[error(transparent)]
    Codec(#[from] BookmarkDecodeError),

    #[error(transparent)]
    Token(#[from] BookmarkTokenError),

    #[error("bookmark signature does not match the query shape")]
    SignatureMismatch,

    #[error("bookmark boundary arity {actual} does not match sort key arity {expected}")]
    BoundaryArity { actual: usize, expected: usize },
}

/// Decode and validate a caller-supplied bookmark into executor-ready state.
///
/// Bookmarks are caller-opaque and may be stale or tampered with; any
/// failure here is normalized to "start of the order" rather than surfaced,
/// and the recovery is counted in observability state.
pub(in crate::db) fn prepare_bookmark(
    token: Option<&str>,
    expected: QuerySignature,
    arity: usize,
) -> Option<PlannedBookmark> {
    let token = token?;

    match decode_planned(token, expected, arity) {
        Ok(planned) => Some(planned),
        Err(_) => {
            obs::record_bookmark_recovered();
            None
        }
    }
}

fn decode_planned(
    token: &str,
    expected: QuerySignature,
    arity: usize,
) -> Result<PlannedBookmark, BookmarkError> {
    let bytes = codec::decode_bookmark(token)?;
    let token = BookmarkToken::decode(&bytes)?;

    if token.signature() != expected {
        return Err(BookmarkError::SignatureMismatch);
    }

    let (boundary, direction) = token.into_parts();
    if boundary.slots.len() != arity {
        return Err(BookmarkError::BoundaryArity {
            actual: boundary.slots.len(),
            expected: arity,
        });
    }

    Ok(PlannedBookmark {
        boundary,
        direction,
    })
}

/// Encode one page-edge boundary into an opaque, URL-safe bookmark string.
pub(in crate::db) fn encode_planned_bookmark(
    signature: QuerySignature,
    boundary: BookmarkBoundary,
    direction: Direction,
) -> Result<String, InternalError> {
    let bytes = BookmarkToken::new(signature, boundary, direction)
        .encode()
        .map_err(|err| InternalError::new(ErrorClass::Internal, ErrorOrigin::Cursor, err.to_string()))?;

    Ok(codec::encode_bookmark(&bytes))
}

///
/// TESTS
///
