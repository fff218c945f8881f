//! Record assembly and the single writer that owns the output store.

use serde_json::Value;

use crate::error::SinkError;
use crate::geometry::RingPolygon;
use crate::schema::{FieldSource, OutputSchema};
use crate::sink::FeatureSink;
use crate::types::{FeatureResult, FieldType, FieldValue, OutputRecord};

/// Project one feature onto the schema.
///
/// Attributes absent from the feature become [`FieldValue::Null`]; attributes
/// absent from the schema are ignored.
pub fn assemble_record(
    schema: &OutputSchema,
    term: &str,
    feature: &FeatureResult,
    polygon: RingPolygon,
) -> Result<OutputRecord, SinkError> {
    let mut values = Vec::with_capacity(schema.len());
    let mut polygon = Some(polygon);

    for field in schema.fields() {
        let value = match &field.source {
            FieldSource::SearchTerm => FieldValue::Text(term.to_string()),
            FieldSource::Geometry => match polygon.take() {
                Some(p) => FieldValue::Geometry(p),
                None => FieldValue::Null,
            },
            FieldSource::Attribute(key) => match feature.attributes.get(key) {
                None => FieldValue::Null,
                Some(raw) => project_value(&field.name, field.field_type, raw)?,
            },
        };
        values.push(value);
    }

    Ok(OutputRecord { values })
}

fn project_value(field: &str, field_type: FieldType, raw: &Value) -> Result<FieldValue, SinkError> {
    let mismatch = || SinkError::TypeMismatch {
        field: field.to_string(),
        expected: field_type.as_str(),
        got: raw.to_string(),
    };

    let value = match (field_type, raw) {
        (_, Value::Null) => FieldValue::Null,

        (FieldType::Text, Value::String(s)) => FieldValue::Text(s.clone()),
        (FieldType::Text, Value::Number(n)) => FieldValue::Text(n.to_string()),
        (FieldType::Text, Value::Bool(b)) => FieldValue::Text(b.to_string()),

        (FieldType::Double, Value::Number(n)) => FieldValue::Double(n.as_f64().ok_or_else(mismatch)?),
        (FieldType::Double, Value::String(s)) if s.trim().is_empty() => FieldValue::Null,
        (FieldType::Double, Value::String(s)) => {
            FieldValue::Double(s.trim().parse::<f64>().map_err(|_| mismatch())?)
        }

        (FieldType::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    FieldValue::Integer(f as i64)
                }
                _ => return Err(mismatch()),
            },
        },
        (FieldType::Integer, Value::String(s)) if s.trim().is_empty() => FieldValue::Null,
        (FieldType::Integer, Value::String(s)) => {
            FieldValue::Integer(s.trim().parse::<i64>().map_err(|_| mismatch())?)
        }

        _ => return Err(mismatch()),
    };

    Ok(value)
}

/// Sole owner of the output store for a run.
pub struct RecordWriter<S: FeatureSink> {
    sink: S,
    declared: bool,
    written: usize,
}

impl<S: FeatureSink> RecordWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            declared: false,
            written: 0,
        }
    }

    /// Declare the schema on the store until the store accepts it.
    ///
    /// Returns `true` on the call that declared it. A refused declaration is
    /// attempted again on the next call.
    pub fn declare(&mut self, schema: &OutputSchema) -> Result<bool, SinkError> {
        if self.declared {
            return Ok(false);
        }
        self.sink.declare_schema(schema)?;
        self.declared = true;
        tracing::info!("declared output schema: {:?}", schema.field_names());
        Ok(true)
    }

    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// Assemble and append one record.
    pub fn write(
        &mut self,
        schema: &OutputSchema,
        term: &str,
        feature: &FeatureResult,
        polygon: RingPolygon,
    ) -> Result<(), SinkError> {
        if !self.declared {
            return Err(SinkError::NoSchema);
        }
        let record = assemble_record(schema, term, feature, polygon)?;
        self.sink.append_record(&record)?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(&mut self) -> Result<(), SinkError> {
        self.sink.finish()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
