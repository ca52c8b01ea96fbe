use crate::{types::RecordId, value::Value};
use serde::{Serialize, de::DeserializeOwned};

///
/// Entity
///
/// A stored document type. `PATH` names the collection for signatures and
/// observability; `field_value` projects one named field into the canonical
/// value vocabulary so ordering and bookmark boundaries never touch the
/// concrete type.
///
/// Implementations must expose `"id"` as a field so the engine can apply the
/// final sort-key tie-break.
///

pub trait Entity: Clone + Serialize + DeserializeOwned {
    const PATH: &'static str;

    fn id(&self) -> RecordId;

    fn field_value(&self, field: &str) -> Option<Value>;
}
