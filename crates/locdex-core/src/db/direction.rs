use serde::{Deserialize, Serialize};

///
/// Direction
///
/// Canonical fetch direction shared by bookmark tokens and the page
/// executor. Forward walks the sort order first-to-last; Backward walks it
/// last-to-first from the boundary.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}
