pub mod operators;
pub mod result;

pub use result::{QueryError, QueryResult};
