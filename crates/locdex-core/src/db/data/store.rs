use crate::{
    db::data::{MAX_ROW_BYTES, RawRow},
    error::InternalError,
    obs,
    serialize::{deserialize, serialize},
    traits::Entity,
    types::RecordId,
};
use std::collections::BTreeMap;

///
/// DataStore
///
/// Embedded document store: rows keyed by record id, payloads opaque CBOR.
/// The store owns persistence shape only; ordering, filtering, and
/// windowing live in the query engine.
///

#[derive(Debug, Default)]
pub struct DataStore {
    rows: BTreeMap<RecordId, RawRow>,
}

impl DataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize and store one entity row under its id.
    pub fn insert<E: Entity>(&mut self, entity: &E) -> Result<(), InternalError> {
        let bytes = serialize(entity).map_err(InternalError::from)?;
        if bytes.len() > MAX_ROW_BYTES as usize {
            return Err(InternalError::store_corruption(format!(
                "row for {} exceeds maximum stored size: {} bytes",
                entity.id(),
                bytes.len(),
            )));
        }

        self.rows.insert(entity.id(), RawRow::new(bytes));

        Ok(())
    }

    /// Fetch and decode one row by id.
    pub fn get<E: Entity>(&self, id: RecordId) -> Result<Option<E>, InternalError> {
        let Some(row) = self.rows.get(&id) else {
            return Ok(None);
        };

        decode_row(id, row).map(Some)
    }

    /// Remove one row by id; returns whether a row was present.
    pub fn remove(&mut self, id: RecordId) -> bool {
        self.rows.remove(&id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.rows.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Clear all stored rows from the data store.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Sum of bytes used by all stored rows.
    #[must_use]
    pub fn memory_bytes(&self) -> u64 {
        self.rows
            .values()
            .map(|row| u64::from(RecordId::STORED_SIZE) + row.len() as u64)
            .sum()
    }

    /// Decode every row in id order.
    ///
    /// Any row that fails to decode aborts the scan; a partial view must
    /// never masquerade as the collection.
    pub(crate) fn scan<E: Entity>(&self) -> Result<Vec<E>, InternalError> {
        let mut entities = Vec::with_capacity(self.rows.len());
        for (id, row) in &self.rows {
            entities.push(decode_row(*id, row)?);
        }
        obs::record_rows_scanned(entities.len() as u64);

        Ok(entities)
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, id: RecordId, row: RawRow) {
        self.rows.insert(id, row);
    }
}

fn decode_row<E: Entity>(id: RecordId, row: &RawRow) -> Result<E, InternalError> {
    deserialize::<E>(row).map_err(|err| {
        InternalError::store_corruption(format!("row {id} failed to decode: {err}"))
    })
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorClass, ErrorOrigin};
    use crate::value::Value;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
    struct Doc {
        id: RecordId,
        label: String,
    }

    impl Entity for Doc {
        const PATH: &'static str = "data::tests::Doc";

        fn id(&self) -> RecordId {
            self.id
        }

        fn field_value(&self, field: &str) -> Option<Value> {
            match field {
                "id" => Some(Value::Ulid(self.id)),
                "label" => Some(Value::from(self.label.clone())),
                _ => None,
            }
        }
    }

    fn doc(ms: u64, label: &str) -> Doc {
        Doc {
            id: RecordId::from_parts(ms, 0),
            label: label.to_string(),
        }
    }

    #[test]
    fn insert_get_round_trip() {
        let mut store = DataStore::new();
        let row = doc(10, "fr");
        store.insert(&row).expect("row should store");

        let loaded: Doc = store
            .get(row.id)
            .expect("get should succeed")
            .expect("row should be present");
        assert_eq!(loaded, row);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let mut store = DataStore::new();
        let row = doc(10, "fr");
        store.insert(&row).expect("row should store");

        assert!(store.remove(row.id));
        assert!(!store.remove(row.id));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_row_surfaces_store_corruption() {
        let mut store = DataStore::new();
        store.insert_raw(RecordId::from_parts(10, 0), RawRow::new(vec![0xff, 0x13]));

        let err = store
            .scan::<Doc>()
            .expect_err("corrupt row must abort the scan");
        assert_eq!(err.class, ErrorClass::Corruption);
        assert_eq!(err.origin, ErrorOrigin::Store);
    }

    #[test]
    fn scan_returns_rows_in_id_order() {
        let mut store = DataStore::new();
        for (ms, label) in [(30, "c"), (10, "a"), (20, "b")] {
            store.insert(&doc(ms, label)).expect("row should store");
        }

        let labels: Vec<String> = store
            .scan::<Doc>()
            .expect("scan should succeed")
            .into_iter()
            .map(|d| d.label)
            .collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }
}
