//! Module: db::query
//! Responsibility: paged query construction, validation, and plan shape.
//! Does not own: row storage, windowing execution, or the token protocol.

mod order;

pub use order::{OrderDirection, OrderSpec};
pub(in crate::db) use order::{apply_order_spec, boundary_for, compare_entity_with_boundary};

use crate::{
    MAX_SORT_FIELDS,
    db::{cursor::QuerySignature, data::DataStore, executor, response::Page},
    error::InternalError,
    traits::Entity,
};
use std::marker::PhantomData;
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("page size must be positive")]
    ZeroPageSize,

    #[error("paged fetch requires explicit ordering")]
    MissingOrder,

    #[error("prefix filter field must lead the sort key: {field}")]
    FilterNotLeadingOrder { field: String },

    #[error("sort key exceeds maximum of {max} fields")]
    TooManySortFields { max: usize },

    #[error(transparent)]
    Internal(#[from] InternalError),
}

///
/// PrefixFilter
///
/// Range predicate selecting text values with a given prefix: values in
/// `[prefix, prefix + char::MAX)`. The prefix is lowercased on construction
/// to match the lowercased searchable fields it targets.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrefixFilter {
    field: String,
    prefix: String,
}

impl PrefixFilter {
    #[must_use]
    pub fn new(field: &str, prefix: &str) -> Self {
        Self {
            field: field.to_string(),
            prefix: prefix.to_lowercase(),
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether one entity's filtered field falls in the prefix range.
    /// Non-text and missing fields never match.
    pub(in crate::db) fn matches<E: Entity>(&self, entity: &E) -> bool {
        entity
            .field_value(&self.field)
            .as_ref()
            .and_then(|value| value.as_text())
            .is_some_and(|text| self.in_range(text))
    }

    fn in_range(&self, text: &str) -> bool {
        if text < self.prefix.as_str() {
            return false;
        }

        let mut upper = self.prefix.clone();
        upper.push(char::MAX);

        text < upper.as_str()
    }
}

///
/// PagedQuery
///
/// Keyset-paged view over one stored collection: optional prefix filter,
/// explicit sort key, fixed page size. `fetch` is read-only and oriented
/// around an optional caller-round-tripped bookmark.
///

#[derive(Clone, Debug)]
pub struct PagedQuery<E: Entity> {
    page_size: u32,
    filter: Option<PrefixFilter>,
    order: OrderSpec,
    _marker: PhantomData<E>,
}

impl<E: Entity> PagedQuery<E> {
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self {
            page_size,
            filter: None,
            order: OrderSpec {
                fields: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Restrict the view to rows whose `field` carries `prefix`.
    #[must_use]
    pub fn filter_prefix(mut self, field: &str, prefix: &str) -> Self {
        self.filter = Some(PrefixFilter::new(field, prefix));
        self
    }

    /// Append an ascending sort field.
    #[must_use]
    pub fn order_by(mut self, field: &str) -> Self {
        self.order.push(field, OrderDirection::Asc);
        self
    }

    /// Append a descending sort field.
    #[must_use]
    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order.push(field, OrderDirection::Desc);
        self
    }

    /// Fetch one page oriented around `bookmark`.
    ///
    /// An absent bookmark starts at the head of the order; a malformed one
    /// is normalized to absent rather than failing the call.
    pub fn fetch(&self, store: &DataStore, bookmark: Option<&str>) -> Result<Page<E>, QueryError> {
        let plan = self.plan()?;

        executor::execute_paged(store, &plan, bookmark)
    }

    // Validate and normalize this query into an executor-ready plan.
    fn plan(&self) -> Result<PlannedQuery, QueryError> {
        if self.page_size == 0 {
            return Err(QueryError::ZeroPageSize);
        }
        if self.order.is_empty() {
            return Err(QueryError::MissingOrder);
        }

        // Filtered rows are only contiguous in sort order when the filtered
        // field leads the sort key.
        if let Some(filter) = &self.filter
            && self.order.leading_field() != Some(filter.field())
        {
            return Err(QueryError::FilterNotLeadingOrder {
                field: filter.field().to_string(),
            });
        }

        let mut order = self.order.clone();
        order.ensure_id_tie_break();

        if order.arity() > MAX_SORT_FIELDS {
            return Err(QueryError::TooManySortFields {
                max: MAX_SORT_FIELDS,
            });
        }

        let signature = QuerySignature::compute(E::PATH, &order, self.filter.as_ref());

        Ok(PlannedQuery {
            page_size: self.page_size,
            filter: self.filter.clone(),
            order,
            signature,
        })
    }
}

///
/// PlannedQuery
/// Validated query shape handed to the page executor.
///

#[derive(Clone, Debug)]
pub(in crate::db) struct PlannedQuery {
    pub(in crate::db) page_size: u32,
    pub(in crate::db) filter: Option<PrefixFilter>,
    pub(in crate::db) order: OrderSpec,
    pub(in crate::db) signature: QuerySignature,
}

///
/// TESTS
///
