//! locdex: a localization catalog with keyset-paged browsing.
//!
//! The engine (store, paged queries, bookmark protocol) lives in
//! `locdex-core`; this crate adds the catalog domain: the `Localization`
//! record, the language table, the request context, and the service the
//! HTTP/RSS layer calls into.
#![warn(unreachable_pub)]

pub mod catalog;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
///

pub mod prelude {
    pub use crate::catalog::{
        BrowseQuery, Catalog, CatalogError, Localization, LocalizationDraft, RequestContext,
        UserIdentity,
    };
    pub use locdex_core::prelude::*;
}
