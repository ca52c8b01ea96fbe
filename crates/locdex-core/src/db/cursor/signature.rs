use crate::db::{
    cursor::codec::encode_bookmark,
    query::{OrderDirection, OrderSpec, PrefixFilter},
};
use sha2::{Digest, Sha256};

///
/// QuerySignature
///
/// Stable, deterministic hash of bookmark-relevant query shape: entity path,
/// order fields, and the active prefix filter. Excludes windowing state
/// (page size) and bookmark boundaries. A bookmark produced under one shape
/// never validates under another.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct QuerySignature([u8; 32]);

impl QuerySignature {
    pub(crate) const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub(crate) const fn into_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Hash one fully-resolved query shape.
    pub(crate) fn compute(
        entity_path: &str,
        order: &OrderSpec,
        filter: Option<&PrefixFilter>,
    ) -> Self {
        let mut hasher = Sha256::new();

        hasher.update(entity_path.as_bytes());
        hasher.update([0x00]);

        for (field, direction) in &order.fields {
            hasher.update(field.as_bytes());
            hasher.update([match direction {
                OrderDirection::Asc => 0x01,
                OrderDirection::Desc => 0x02,
            }]);
        }
        hasher.update([0x00]);

        if let Some(filter) = filter {
            hasher.update(filter.field().as_bytes());
            hasher.update([0x00]);
            hasher.update(filter.prefix().as_bytes());
        }

        Self(hasher.finalize().into())
    }

    #[must_use]
    pub(crate) fn as_hex(&self) -> String {
        encode_bookmark(&self.0)
    }
}

impl std::fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_hex())
    }
}

///
/// TESTS
///
