use crate::{db::data::MAX_ROW_BYTES, serialize::SerializeError};
use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Serialize a value into CBOR bytes.
pub(super) fn serialize<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize CBOR bytes into a value.
///
/// Safety guarantees:
/// - Input size is bounded before decode.
/// - Any panic during decode is caught and reported as a deserialize error.
/// - No panic escapes this function.
pub(super) fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > MAX_ROW_BYTES as usize {
        return Err(SerializeError::Deserialize(
            "payload exceeds maximum allowed size".into(),
        ));
    }

    let result = catch_unwind(AssertUnwindSafe(|| from_slice(bytes)));

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Eq, PartialEq, Serialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn cbor_round_trip_preserves_fields() {
        let sample = Sample {
            name: "fr".to_string(),
            count: 7,
        };

        let bytes = serialize(&sample).expect("sample should serialize");
        let decoded: Sample = deserialize(&bytes).expect("sample should decode");

        assert_eq!(decoded, sample);
    }

    #[test]
    fn deserialize_rejects_oversized_payload() {
        let oversized = vec![0_u8; MAX_ROW_BYTES as usize + 1];
        let err = deserialize::<Sample>(&oversized).expect_err("oversized payload must fail");

        assert!(matches!(err, SerializeError::Deserialize(_)));
    }

    #[test]
    fn deserialize_rejects_garbage_bytes() {
        let err = deserialize::<Sample>(&[0xff, 0x00, 0x13]).expect_err("garbage must fail");

        assert!(matches!(err, SerializeError::Deserialize(_)));
    }
}
