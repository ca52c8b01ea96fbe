//! Module: db::executor
//! Responsibility: windowed page execution over the scanned, ordered view.
//! Does not own: query validation, token wire format, or row storage.

use crate::{
    db::{
        cursor::{self, PlannedBookmark},
        data::DataStore,
        direction::Direction,
        query::{
            PlannedQuery, QueryError, apply_order_spec, boundary_for, compare_entity_with_boundary,
        },
        response::Page,
    },
    obs,
    traits::Entity,
};
use std::cmp::Ordering;

/// Execute one paged fetch.
///
/// The scanned view is filtered, sorted into canonical display order, and
/// windowed around the bookmark boundary. Both availability flags come from
/// existence checks against the ordered view, never from bookmark presence,
/// so they stay correct when the collection or filter changed since the
/// bookmark was issued.
pub(in crate::db) fn execute_paged<E: Entity>(
    store: &DataStore,
    plan: &PlannedQuery,
    bookmark: Option<&str>,
) -> Result<Page<E>, QueryError> {
    obs::record_fetch_call();

    let planned_bookmark = cursor::prepare_bookmark(bookmark, plan.signature, plan.order.arity());

    let mut rows: Vec<E> = store.scan()?;
    if let Some(filter) = &plan.filter {
        rows.retain(|row| filter.matches(row));
    }
    apply_order_spec(&mut rows, &plan.order);

    let window = apply_window(rows, plan, planned_bookmark.as_ref());
    obs::record_rows_returned(window.items.len() as u64);

    into_page(window, plan)
}

///
/// PageWindow
/// One windowed slice of the ordered view plus raw availability flags.
///

struct PageWindow<E> {
    items: Vec<E>,
    has_prev: bool,
    has_next: bool,
}

// Slice the ordered view around the boundary. The boundary is exclusive in
// both directions: a row equal to it on every sort field never reappears.
fn apply_window<E: Entity>(
    mut rows: Vec<E>,
    plan: &PlannedQuery,
    bookmark: Option<&PlannedBookmark>,
) -> PageWindow<E> {
    let page_size = plan.page_size as usize;

    let Some(bookmark) = bookmark else {
        let has_next = rows.len() > page_size;
        rows.truncate(page_size);

        return PageWindow {
            items: rows,
            has_prev: false,
            has_next,
        };
    };

    match bookmark.direction {
        Direction::Forward => {
            // First index strictly after the boundary.
            let start = rows.partition_point(|row| {
                compare_entity_with_boundary(row, &plan.order, &bookmark.boundary)
                    != Ordering::Greater
            });
            let has_prev = start > 0;

            let mut items = rows.split_off(start);
            let has_next = items.len() > page_size;
            items.truncate(page_size);

            PageWindow {
                items,
                has_prev,
                has_next,
            }
        }
        Direction::Backward => {
            // First index at or after the boundary.
            let end = rows.partition_point(|row| {
                compare_entity_with_boundary(row, &plan.order, &bookmark.boundary)
                    == Ordering::Less
            });
            let has_next = end < rows.len();

            rows.truncate(end);
            let has_prev = rows.len() > page_size;
            let items = if has_prev {
                rows.split_off(rows.len() - page_size)
            } else {
                rows
            };

            PageWindow {
                items,
                has_prev,
                has_next,
            }
        }
    }
}

// Encode page-edge bookmarks and assemble the response payload.
fn into_page<E: Entity>(window: PageWindow<E>, plan: &PlannedQuery) -> Result<Page<E>, QueryError> {
    let PageWindow {
        items,
        has_prev,
        has_next,
    } = window;

    // An empty page has no edges to anchor navigation on.
    if items.is_empty() {
        return Ok(Page::new(items, false, false, None, None));
    }

    let prev_bookmark = match items.first() {
        Some(first) if has_prev => Some(cursor::encode_planned_bookmark(
            plan.signature,
            boundary_for(first, &plan.order),
            Direction::Backward,
        )?),
        _ => None,
    };

    let next_bookmark = match items.last() {
        Some(last) if has_next => Some(cursor::encode_planned_bookmark(
            plan.signature,
            boundary_for(last, &plan.order),
            Direction::Forward,
        )?),
        _ => None,
    };

    Ok(Page::new(
        items,
        has_prev,
        has_next,
        prev_bookmark,
        next_bookmark,
    ))
}
