use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};

///
/// RawRow
/// Serialized row payload as stored, opaque to the store itself.
///

#[derive(Clone, Debug, Deref, DerefMut, Deserialize, Eq, PartialEq, Serialize)]
pub struct RawRow(#[serde(with = "serde_bytes")] Vec<u8>);

impl RawRow {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for RawRow {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
