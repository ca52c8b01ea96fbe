use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::Value,
};
use canic_utils::hash::Xxh3;

fn feed_i32(h: &mut Xxh3, x: i32) {
    h.update(&x.to_be_bytes());
}
fn feed_i64(h: &mut Xxh3, x: i64) {
    h.update(&x.to_be_bytes());
}
fn feed_i128(h: &mut Xxh3, x: i128) {
    h.update(&x.to_be_bytes());
}
fn feed_u8(h: &mut Xxh3, x: u8) {
    h.update(&[x]);
}
fn feed_u32(h: &mut Xxh3, x: u32) {
    h.update(&x.to_be_bytes());
}
fn feed_u64(h: &mut Xxh3, x: u64) {
    h.update(&x.to_be_bytes());
}
fn feed_u128(h: &mut Xxh3, x: u128) {
    h.update(&x.to_be_bytes());
}
fn feed_bytes(h: &mut Xxh3, b: &[u8]) {
    h.update(b);
}

#[cfg(test)]
thread_local! {
    static TEST_HASH_OVERRIDE: std::cell::Cell<Option<[u8; 16]>> =
        const { std::cell::Cell::new(None) };
}

#[cfg(test)]
#[allow(clippy::redundant_closure_for_method_calls)]
fn test_hash_override() -> Option<[u8; 16]> {
    TEST_HASH_OVERRIDE.with(|cell| cell.get())
}

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::too_many_lines)]
fn write_to_hasher(value: &Value, h: &mut Xxh3) -> Result<(), InternalError> {
    feed_u8(h, value.canonical_tag().to_u8());

    match value {
        Value::Account(a) => {
            let bytes = a.to_bytes().map_err(|err| {
                InternalError::new(
                    ErrorClass::Unsupported,
                    ErrorOrigin::Serialize,
                    err.to_string(),
                )
            })?;
            feed_bytes(h, &bytes);
        }
        Value::Blob(v) => {
            feed_u8(h, 0x01);
            feed_u32(h, v.len() as u32);
            feed_bytes(h, v);
        }
        Value::Bool(b) => {
            feed_u8(h, u8::from(*b));
        }
        Value::Date(d) => feed_i32(h, d.get()),
        Value::Decimal(d) => {
            let normalized = d.normalize();

            // encode (sign, scale, mantissa) deterministically:
            feed_u8(h, u8::from(normalized.is_sign_negative()));
            feed_u32(h, normalized.scale());
            feed_bytes(h, &normalized.mantissa().to_be_bytes());
        }
        Value::Duration(t) => {
            feed_u64(h, t.get());
        }
        Value::Enum(v) => {
            match &v.path {
                Some(path) => {
                    feed_u8(h, 0x01); // path present
                    feed_u32(h, path.len() as u32);
                    feed_bytes(h, path.as_bytes());
                }
                None => feed_u8(h, 0x00), // path absent -> loose match
            }

            feed_u32(h, v.variant.len() as u32);
            feed_bytes(h, v.variant.as_bytes());

            match &v.payload {
                Some(payload) => {
                    feed_u8(h, 0x01); // payload present
                    write_to_hasher(payload, h)?; // include nested value
                }
                None => feed_u8(h, 0x00),
            }
        }
        Value::E8s(v) => {
            feed_u64(h, v.get());
        }
        Value::E18s(v) => {
            feed_bytes(h, &v.to_be_bytes());
        }
        Value::Float32(v) => {
            feed_bytes(h, &v.to_be_bytes());
        }
        Value::Float64(v) => {
            feed_bytes(h, &v.to_be_bytes());
        }
        Value::Int(i) => {
            feed_i64(h, *i);
        }
        Value::Int128(i) => {
            feed_i128(h, i.get());
        }
        Value::IntBig(v) => {
            let bytes = v.to_leb128();
            feed_u32(h, bytes.len() as u32);
            feed_bytes(h, &bytes);
        }
        Value::List(xs) => {
            feed_u32(h, xs.len() as u32);
            for x in xs {
                feed_u8(h, 0xFF);
                write_to_hasher(x, h)?; // recurse, no sub-hash
            }
        }
        Value::Map(entries) => {
            feed_u32(h, entries.len() as u32);
            for (key, value) in entries {
                feed_u8(h, 0xFD);
                write_to_hasher(key, h)?;
                feed_u8(h, 0xFE);
                write_to_hasher(value, h)?;
            }
        }
        Value::Principal(p) => {
            let raw = p.to_bytes().map_err(|err| {
                InternalError::new(
                    ErrorClass::Unsupported,
                    ErrorOrigin::Serialize,
                    err.to_string(),
                )
            })?;
            feed_u32(h, raw.len() as u32);
            feed_bytes(h, &raw);
        }
        Value::Subaccount(s) => {
            feed_bytes(h, &s.to_bytes());
        }
        Value::Text(s) => {
            // If you need case/Unicode insensitivity, normalize; else skip (much faster)
            // let norm = normalize_nfkc_casefold(s);
            // feed_u32( h, norm.len() as u32);
            // feed_bytes( h, norm.as_bytes());
            feed_u32(h, s.len() as u32);
            feed_bytes(h, s.as_bytes());
        }
        Value::Timestamp(t) => {
            feed_u64(h, t.get());
        }
        Value::Uint(u) => {
            feed_u64(h, *u);
        }
        Value::Uint128(u) => {
            feed_u128(h, u.get());
        }
        Value::UintBig(v) => {
            let bytes = v.to_leb128();
            feed_u32(h, bytes.len() as u32);
            feed_bytes(h, &bytes);
        }
        Value::Ulid(u) => {
            feed_bytes(h, &u.to_bytes());
        }
        Value::Null | Value::Unit => {
            // NOTE: Non-indexable values intentionally contribute no hash input.
        }
    }

    Ok(())
}

/// Stable hash used for index/storage fingerprints.
pub fn hash_value(value: &Value) -> Result<[u8; 16], InternalError> {
    const VERSION: u8 = 1;

    #[cfg(test)]
    if let Some(override_hash) = test_hash_override() {
        return Ok(override_hash);
    }

    let mut h = Xxh3::with_seed(0);
    feed_u8(&mut h, VERSION); // version

    write_to_hasher(value, &mut h)?;
    Ok(h.digest128().to_be_bytes())
}

/// Index fingerprint semantics:
///
/// - Only indexable values produce fingerprints.
/// - `Value::Null` does not produce fingerprints and
///   therefore do not participate in indexing.
/// - For unique indexes, uniqueness is enforced only over indexable values.
///   Multiple rows with non-indexable values are permitted.
///
/// This behavior matches SQL-style UNIQUE constraints with NULL values.
///
/// Stable 128-bit hash used for index keys; returns `None` for non-indexable values.
pub fn to_index_fingerprint(value: &Value) -> Result<Option<[u8; 16]>, InternalError> {
    if matches!(value, Value::Null) {
        // Intentionally skipped: non-indexable values do not participate in indexes.
        return Ok(None);
    }

    Ok(Some(hash_value(value)?))
}

///
/// TESTS
///
