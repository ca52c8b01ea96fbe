use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize, Serializer, de::Deserializer};
use std::{
    str::FromStr,
    sync::{LazyLock, Mutex},
};
use thiserror::Error as ThisError;
use ulid::Ulid as WrappedUlid;

///
/// RecordIdError
///

#[derive(Debug, ThisError)]
pub enum RecordIdError {
    #[error("invalid record id string")]
    InvalidString,

    #[error("monotonic error - overflow")]
    GeneratorOverflow,
}

///
/// RecordId
///
/// Unique record identifier. A ULID newtype, so id ordering is creation
/// ordering and ids are usable as the final sort-key tie-break.
///

#[derive(Clone, Copy, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct RecordId(WrappedUlid);

impl RecordId {
    pub const STORED_SIZE: u32 = 16;

    pub const MIN: Self = Self::from_bytes([0x00; 16]);
    pub const MAX: Self = Self::from_bytes([0xFF; 16]);

    #[must_use]
    pub const fn nil() -> Self {
        Self(WrappedUlid::nil())
    }

    /// Generate a RecordId with the current timestamp and a random value.
    /// Falls back to nil on generator overflow.
    #[must_use]
    pub fn generate() -> Self {
        Self::try_generate().unwrap_or_else(|_| Self::nil())
    }

    /// Fallible RecordId generation preserving error type (e.g., overflow).
    pub fn try_generate() -> Result<Self, RecordIdError> {
        generator::generate()
    }

    /// Monotonic increment; returns `None` on overflow.
    #[must_use]
    pub fn increment(&self) -> Option<Self> {
        self.0.increment().map(Self)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(WrappedUlid::from_bytes(bytes))
    }

    #[must_use]
    pub const fn from_parts(timestamp_ms: u64, random: u128) -> Self {
        Self(WrappedUlid::from_parts(timestamp_ms, random))
    }

    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::nil()
    }
}

impl From<WrappedUlid> for RecordId {
    fn from(ulid: WrappedUlid) -> Self {
        Self(ulid)
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WrappedUlid::from_string(s)
            .map(Self)
            .map_err(|_| RecordIdError::InvalidString)
    }
}

// Serialize as the canonical 26-character ULID string; keeps the wire form
// identical across CBOR tokens and JSON fixtures.
impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

///
/// Generator
///
/// Process-global monotonic generator. Keeps the previously issued id so
/// same-millisecond generation increments instead of re-randomizing, which
/// preserves generation order under the id tie-break.
///

mod generator {
    use super::{LazyLock, Mutex, RecordId, RecordIdError, WrappedUlid};

    static GENERATOR: LazyLock<Mutex<Generator>> =
        LazyLock::new(|| Mutex::new(Generator::default()));

    pub(super) fn generate() -> Result<RecordId, RecordIdError> {
        let mut generator = GENERATOR.lock().expect("record id generator mutex poisoned");

        generator.generate()
    }

    #[derive(Default)]
    struct Generator {
        previous: RecordId,
    }

    impl Generator {
        // Maybe time went backward, or it is the same ms; increment instead
        // of generating a new random so that output stays monotonic.
        fn generate(&mut self) -> Result<RecordId, RecordIdError> {
            let fresh = RecordId::from(WrappedUlid::new());

            if fresh.timestamp_ms() <= self.previous.timestamp_ms() {
                let Some(next) = self.previous.increment() else {
                    return Err(RecordIdError::GeneratorOverflow);
                };
                self.previous = next;

                return Ok(next);
            }

            self.previous = fresh;

            Ok(fresh)
        }
    }
}

///
/// TESTS
///
