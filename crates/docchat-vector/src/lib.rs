//! Vector index for docchat: exact in-memory search, persisted as LanceDB tables.
//!
//! The index is held in memory for search so results are identical before
//! and after a persist/load round trip; LanceDB is only the storage format.
pub mod index;
pub mod schema;
pub mod store;
mod table;

pub use index::{IndexEntry, VectorIndex};
