mod cursor_validation;
mod page_window;
mod planned_cursor;

pub(in crate::db::query::plan) use cursor_validation::{plan_cursor, revalidate_planned_cursor};
pub(crate) use page_window::compute_page_window;
pub(in crate::db) use planned_cursor::PlannedCursor;
