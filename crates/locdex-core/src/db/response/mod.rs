//! Module: db::response
//! Responsibility: paged fetch response payload contracts.
//! Does not own: query execution, windowing, or the bookmark token protocol.
//! Boundary: response DTOs returned by the paged query API.

///
/// Page
///
/// One fetched page in forward display order, with availability flags and
/// the opaque bookmarks for the adjacent pages. A bookmark is present
/// exactly when its flag is true.
///

#[derive(Clone, Debug)]
pub struct Page<E> {
    items: Vec<E>,
    has_prev: bool,
    has_next: bool,
    prev_bookmark: Option<String>,
    next_bookmark: Option<String>,
}

impl<E> Page<E> {
    #[must_use]
    pub(crate) const fn new(
        items: Vec<E>,
        has_prev: bool,
        has_next: bool,
        prev_bookmark: Option<String>,
        next_bookmark: Option<String>,
    ) -> Self {
        Self {
            items,
            has_prev,
            has_next,
            prev_bookmark,
            next_bookmark,
        }
    }

    /// Borrow the page rows.
    #[must_use]
    pub fn items(&self) -> &[E] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether records exist before the first returned item.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.has_prev
    }

    /// Whether records exist after the last returned item.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Borrow the opaque bookmark for the previous page.
    #[must_use]
    pub fn prev_bookmark(&self) -> Option<&str> {
        self.prev_bookmark.as_deref()
    }

    /// Borrow the opaque bookmark for the next page.
    #[must_use]
    pub fn next_bookmark(&self) -> Option<&str> {
        self.next_bookmark.as_deref()
    }

    /// Consume this page and return the rows.
    #[must_use]
    pub fn into_items(self) -> Vec<E> {
        self.items
    }

    /// Consume this page and return
    /// `(items, has_prev, has_next, prev_bookmark, next_bookmark)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<E>, bool, bool, Option<String>, Option<String>) {
        (
            self.items,
            self.has_prev,
            self.has_next,
            self.prev_bookmark,
            self.next_bookmark,
        )
    }
}
