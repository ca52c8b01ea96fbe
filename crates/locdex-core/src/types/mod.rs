mod record_id;
mod timestamp;

pub use record_id::{RecordId, RecordIdError};
pub use timestamp::Timestamp;
