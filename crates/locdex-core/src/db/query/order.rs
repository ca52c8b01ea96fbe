use crate::{
    db::cursor::{
        BookmarkBoundary, BoundarySlot, apply_order_direction, compare_boundary_slots,
    },
    traits::Entity,
};
use std::cmp::Ordering;

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

///
/// OrderSpec
///
/// Ordered (field, direction) pairs defining the sort key. The engine
/// normalizes every spec to end with the `"id"` tie-break, so comparator
/// equality only occurs for the same record and the order is strict.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OrderSpec {
    pub(crate) fields: Vec<(String, OrderDirection)>,
}

impl OrderSpec {
    const ID_FIELD: &'static str = "id";

    pub(crate) fn push(&mut self, field: &str, direction: OrderDirection) {
        self.fields.push((field.to_string(), direction));
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub(crate) fn arity(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub(crate) fn leading_field(&self) -> Option<&str> {
        self.fields.first().map(|(field, _)| field.as_str())
    }

    /// Append the id tie-break unless the caller ordered on it explicitly.
    /// The tie-break inherits the direction of the last configured field so
    /// `(modified desc)` normalizes to `(modified desc, id desc)`.
    pub(crate) fn ensure_id_tie_break(&mut self) {
        if self.fields.iter().any(|(field, _)| field == Self::ID_FIELD) {
            return;
        }

        let direction = self
            .fields
            .last()
            .map_or(OrderDirection::Asc, |(_, direction)| *direction);
        self.fields.push((Self::ID_FIELD.to_string(), direction));
    }
}

// Convert one entity field into the explicit ordering slot used for
// deterministic comparisons.
fn field_slot<E: Entity>(entity: &E, field: &str) -> BoundarySlot {
    match entity.field_value(field) {
        Some(value) => BoundarySlot::Present(value),
        None => BoundarySlot::Missing,
    }
}

/// Sort rows into canonical display order.
///
/// Canonical order already includes the id tie-break; comparator equality
/// should only occur for the same row. No positional tie-breakers, so
/// bookmark-boundary comparison can share this exact ordering contract.
pub(in crate::db) fn apply_order_spec<E: Entity>(rows: &mut [E], order: &OrderSpec) {
    rows.sort_by(|left, right| compare_entities(left, right, order));
}

// Compare two entities according to the order spec, returning the first
// non-equal field ordering.
pub(in crate::db) fn compare_entities<E: Entity>(
    left: &E,
    right: &E,
    order: &OrderSpec,
) -> Ordering {
    for (field, direction) in &order.fields {
        let ordering = apply_order_direction(
            compare_boundary_slots(&field_slot(left, field), &field_slot(right, field)),
            *direction,
        );

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

// Compare an entity with a continuation boundary using the exact canonical
// ordering semantics.
pub(in crate::db) fn compare_entity_with_boundary<E: Entity>(
    entity: &E,
    order: &OrderSpec,
    boundary: &BookmarkBoundary,
) -> Ordering {
    for ((field, direction), boundary_slot) in order.fields.iter().zip(boundary.slots.iter()) {
        let ordering = apply_order_direction(
            compare_boundary_slots(&field_slot(entity, field), boundary_slot),
            *direction,
        );

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Project one entity's sort-key values into a bookmark boundary.
pub(in crate::db) fn boundary_for<E: Entity>(entity: &E, order: &OrderSpec) -> BookmarkBoundary {
    BookmarkBoundary {
        slots: order
            .fields
            .iter()
            .map(|(field, _)| field_slot(entity, field))
            .collect(),
    }
}

///
/// TESTS
///
