//! Output stores the harvest appends to.
//!
//! The core only ever declares a schema once and then appends records; how
//! the store is created or connected is up to the caller.

pub mod memory;
pub mod sqlite;

pub use memory::MemorySink;
pub use sqlite::SqliteSink;

use crate::error::SinkError;
use crate::schema::OutputSchema;
use crate::types::OutputRecord;

/// Append-only, geometry-capable record store.
pub trait FeatureSink {
    /// Create the columns described by `schema`. Called at most once.
    fn declare_schema(&mut self, schema: &OutputSchema) -> Result<(), SinkError>;

    /// Append one record whose values follow the declared schema order.
    fn append_record(&mut self, record: &OutputRecord) -> Result<(), SinkError>;

    /// Flush and release the store. Appends after this fail.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
