pub mod field;
pub mod query;

#[cfg(test)]
mod tests;

pub use field::*;
pub use query::{QueryBuilder, QuerySpec};
