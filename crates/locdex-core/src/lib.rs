//! Core runtime for locdex: entity traits, values, the document store, and
//! the keyset-paged query engine exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod obs;
pub mod serialize;
pub mod traits;
pub mod types;
pub mod value;

///
/// CONSTANTS
///

/// Maximum number of fields allowed in one sort key.
///
/// This limit keeps bookmark boundaries within bounded, transportable sizes
/// and simplifies sizing tests for the token protocol.
pub const MAX_SORT_FIELDS: usize = 4;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, executors, stores, serializers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{query::PagedQuery, response::Page},
        traits::Entity,
        types::{RecordId, Timestamp},
        value::Value,
    };
}
