use crate::{
    db::query::OrderDirection,
    value::{Value, canonical_cmp},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// BoundarySlot
/// Slot value used for deterministic bookmark boundaries.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) enum BoundarySlot {
    Missing,
    Present(Value),
}

///
/// BookmarkBoundary
/// Ordered boundary tuple for continuation pagination.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct BookmarkBoundary {
    pub(crate) slots: Vec<BoundarySlot>,
}

/// Compare two boundary slots; Missing sorts before every Present value.
pub(crate) fn compare_boundary_slots(left: &BoundarySlot, right: &BoundarySlot) -> Ordering {
    match (left, right) {
        (BoundarySlot::Missing, BoundarySlot::Missing) => Ordering::Equal,
        (BoundarySlot::Missing, BoundarySlot::Present(_)) => Ordering::Less,
        (BoundarySlot::Present(_), BoundarySlot::Missing) => Ordering::Greater,
        (BoundarySlot::Present(left), BoundarySlot::Present(right)) => canonical_cmp(left, right),
    }
}

/// Orient one raw slot ordering by the configured field direction.
pub(crate) const fn apply_order_direction(
    ordering: Ordering,
    direction: OrderDirection,
) -> Ordering {
    match direction {
        OrderDirection::Asc => ordering,
        OrderDirection::Desc => ordering.reverse(),
    }
}

///
/// TESTS
///
