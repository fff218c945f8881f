//! Core data types flowing through a harvest run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{FeatureError, TransportFailure};
use crate::geometry::RingPolygon;

/// One input query string.
pub type SearchTerm = String;

/// A fully built request URL paired with the term it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub term: SearchTerm,
    pub url: Url,
}

/// Raw HTTP response returned by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// A completed request, tagged with its originating query.
#[derive(Debug)]
pub struct ServiceResponse {
    pub query: Query,
    pub outcome: Result<HttpResponse, TransportFailure>,
}

/// One entry of a response's `results` array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureResult {
    /// Attribute key → raw scalar value, in service order.
    pub attributes: Map<String, Value>,
    /// Raw geometry payload; expected to carry a `rings` array.
    pub geometry: Option<Value>,
}

impl FeatureResult {
    /// Interpret one raw result entry.
    ///
    /// A missing `attributes` key is an empty mapping. A missing or null
    /// `geometry` is kept as `None` and rejected later by the geometry builder.
    pub fn from_value(value: Value) -> Result<Self, FeatureError> {
        let Value::Object(mut obj) = value else {
            return Err(FeatureError::NotAnObject);
        };

        let attributes = match obj.remove("attributes") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(FeatureError::BadAttributes),
        };

        let geometry = match obj.remove("geometry") {
            None | Some(Value::Null) => None,
            Some(g) => Some(g),
        };

        Ok(Self {
            attributes,
            geometry,
        })
    }
}

/// Column type in the output store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Double,
    Integer,
    Geometry,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Double => "double",
            FieldType::Integer => "integer",
            FieldType::Geometry => "geometry",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed value of an output record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Double(f64),
    Integer(i64),
    Geometry(RingPolygon),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&RingPolygon> {
        match self {
            FieldValue::Geometry(g) => Some(g),
            _ => None,
        }
    }
}

/// One output row, values ordered per the declared schema.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub values: Vec<FieldValue>,
}

/// One line of the summary log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub term: SearchTerm,
    pub count: usize,
}
