//! Output schema discovery.
//!
//! The schema is derived from the attribute keys of the first feature in a run
//! that has any, and never changes afterwards. Keys that only appear on later
//! features are dropped; keys missing from a later feature become null.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{FeatureResult, FieldType};

/// Knobs controlling how attribute keys become columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Geometry-derived attributes never copied to the output (case-insensitive).
    pub skip_fields: Vec<String>,
    /// Attribute name that collides with the store's own identity field
    /// (case-insensitive).
    pub reserved_field: String,
    /// Prefix applied to `reserved_field` to disambiguate it.
    pub reserved_prefix: String,
    /// Name of the synthetic first column holding the search term.
    pub term_field: String,
    /// Name of the synthetic last column holding the polygon.
    pub geometry_field: String,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            skip_fields: vec![
                "Shape_Length".to_string(),
                "Shape_Area".to_string(),
                "Shape".to_string(),
            ],
            reserved_field: "OBJECTID".to_string(),
            reserved_prefix: "wdpa_".to_string(),
            term_field: "search_term".to_string(),
            geometry_field: "shape".to_string(),
        }
    }
}

impl SchemaOptions {
    fn is_skipped(&self, key: &str) -> bool {
        self.skip_fields.iter().any(|s| s.eq_ignore_ascii_case(key))
    }

    /// Column names compare case-insensitively, as in most geometry stores.
    fn is_taken(&self, name: &str, fields: &[FieldDef]) -> bool {
        name.eq_ignore_ascii_case(&self.reserved_field)
            || name.eq_ignore_ascii_case(&self.geometry_field)
            || fields.iter().any(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// Where a column's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum FieldSource {
    SearchTerm,
    Attribute(String),
    Geometry,
}

/// One typed output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub source: FieldSource,
}

/// Immutable, ordered column list for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSchema {
    fields: Vec<FieldDef>,
}

impl OutputSchema {
    /// Derive the schema from one feature's attribute mapping.
    pub fn derive(attributes: &Map<String, Value>, options: &SchemaOptions) -> Self {
        let mut fields = Vec::with_capacity(attributes.len() + 2);
        fields.push(FieldDef {
            name: options.term_field.clone(),
            field_type: FieldType::Text,
            source: FieldSource::SearchTerm,
        });

        for (key, value) in attributes {
            if options.is_skipped(key) {
                continue;
            }

            let base = if key.eq_ignore_ascii_case(&options.reserved_field) {
                format!("{}{}", options.reserved_prefix, key)
            } else {
                key.clone()
            };

            let mut name = base.clone();
            let mut n = 1;
            while options.is_taken(&name, &fields) {
                name = format!("{base}_{n}");
                n += 1;
            }
            if name != base {
                tracing::warn!("attribute '{key}' collides with an existing column, renamed to '{name}'");
            }

            fields.push(FieldDef {
                name,
                field_type: infer_field_type(key, value),
                source: FieldSource::Attribute(key.clone()),
            });
        }

        fields.push(FieldDef {
            name: options.geometry_field.clone(),
            field_type: FieldType::Geometry,
            source: FieldSource::Geometry,
        });

        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Attribute-backed columns only.
    pub fn attribute_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(|f| matches!(f.source, FieldSource::Attribute(_)))
    }
}

/// Type a column from its key name and the first value seen for it.
///
/// Keys mentioning "area" become `Double` when the value looks numeric,
/// all-digit key names become `Integer`, everything else is `Text`.
pub fn infer_field_type(key: &str, sample: &Value) -> FieldType {
    if key.to_ascii_lowercase().contains("area") && looks_numeric(sample) {
        FieldType::Double
    } else if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        FieldType::Integer
    } else {
        FieldType::Text
    }
}

fn looks_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) | Value::Null => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

/// Holds the run's schema once the first feature has been seen.
#[derive(Debug, Default)]
pub struct SchemaUnifier {
    options: SchemaOptions,
    schema: Option<OutputSchema>,
}

impl SchemaUnifier {
    pub fn new(options: SchemaOptions) -> Self {
        Self {
            options,
            schema: None,
        }
    }

    /// Return the run's schema, deriving it from `feature` if none exists.
    ///
    /// A feature with no attributes cannot found the schema; until one with
    /// attributes arrives this returns `None`.
    pub fn observe(&mut self, feature: &FeatureResult) -> Option<&OutputSchema> {
        if self.schema.is_none() && feature.attributes.is_empty() {
            return None;
        }
        let options = &self.options;
        Some(
            self.schema
                .get_or_insert_with(|| OutputSchema::derive(&feature.attributes, options)),
        )
    }

    pub fn schema(&self) -> Option<&OutputSchema> {
        self.schema.as_ref()
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }
}
