//! In-memory sink, mainly for embedding the harvester and for tests.

use crate::error::SinkError;
use crate::schema::OutputSchema;
use crate::sink::FeatureSink;
use crate::types::OutputRecord;

/// Keeps the declared schema and every appended record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    schema: Option<OutputSchema>,
    records: Vec<OutputRecord>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> Option<&OutputSchema> {
        self.schema.as_ref()
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Values of one named column across all records.
    pub fn column(&self, name: &str) -> Vec<&crate::types::FieldValue> {
        let Some(idx) = self
            .schema
            .as_ref()
            .and_then(|s| s.fields().iter().position(|f| f.name == name))
        else {
            return Vec::new();
        };
        self.records.iter().map(|r| &r.values[idx]).collect()
    }
}

impl FeatureSink for MemorySink {
    fn declare_schema(&mut self, schema: &OutputSchema) -> Result<(), SinkError> {
        if self.schema.is_some() {
            return Err(SinkError::SchemaAlreadyDeclared);
        }
        self.schema = Some(schema.clone());
        Ok(())
    }

    fn append_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let schema = self.schema.as_ref().ok_or(SinkError::NoSchema)?;
        if record.values.len() != schema.len() {
            return Err(SinkError::Arity {
                expected: schema.len(),
                got: record.values.len(),
            });
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }
}
