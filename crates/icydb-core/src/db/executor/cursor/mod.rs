mod anchor;
mod decode;
mod planned;
mod spine;
mod validation;

pub(in crate::db) use anchor::{
    validate_index_range_anchor, validate_index_range_boundary_anchor_consistency,
};
pub(in crate::db) use decode::{decode_pk_cursor_boundary, decode_typed_primary_key_cursor_slot};
pub(in crate::db) use planned::PlannedCursor;
pub(in crate::db) use validation::{plan_cursor, revalidate_planned_cursor};
