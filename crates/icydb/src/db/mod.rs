pub mod query;
pub mod response;
mod session;

pub use icydb_core::db::response::Row;
pub use response::{Response, WriteBatchResponse, WriteResponse};
pub use session::{DbSession, SessionDeleteQuery, SessionLoadQuery};
