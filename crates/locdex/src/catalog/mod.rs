//! The catalog domain: records, language table, request context, service.

mod context;
pub mod language;
mod localization;
mod service;

pub use context::{RequestContext, UserIdentity};
pub use localization::{DraftError, Localization, LocalizationDraft};
pub use service::{BROWSE_PAGE_SIZE, BrowseQuery, Catalog, CatalogError};
