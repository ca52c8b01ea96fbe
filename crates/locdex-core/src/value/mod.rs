mod compare;

pub use compare::canonical_cmp;

use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

///
/// Value
///
/// Canonical field value vocabulary shared by sort keys, filters, and
/// bookmark boundaries. Kept deliberately small: the catalog sorts on text,
/// timestamps, and record ids.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Value {
    Null,
    Text(String),
    Timestamp(Timestamp),
    Ulid(RecordId),
}

impl Value {
    /// Canonical variant rank used for deterministic mixed-variant ordering.
    #[must_use]
    pub const fn canonical_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Text(_) => 1,
            Self::Timestamp(_) => 2,
            Self::Ulid(_) => 3,
        }
    }

    /// Borrow the inner text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Self::Ulid(id)
    }
}
