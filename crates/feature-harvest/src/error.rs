//! Error taxonomy for a harvest run.
//!
//! Only [`HarvestError::InputRead`] and [`HarvestError::Config`] abort a run.
//! Every other variant is scoped to one request, one response, one feature or
//! one record, and is logged and counted by the session instead of propagated.

/// Why a single request never produced a usable response.
#[derive(thiserror::Error, Debug)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportFailure::Timeout
        } else if e.is_connect() {
            TransportFailure::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            TransportFailure::Status {
                status: status.as_u16(),
            }
        } else {
            TransportFailure::Request(e.to_string())
        }
    }
}

/// Error indicator carried inside an HTTP 200 body.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("service error {code}: {message}")]
pub struct ServiceError {
    pub code: i64,
    pub message: String,
    pub details: Vec<String>,
}

/// A single feature that could not be turned into a record.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("feature is not a JSON object")]
    NotAnObject,

    #[error("feature attributes are not a JSON object")]
    BadAttributes,

    #[error("feature has no attributes to derive the output schema from")]
    NoAttributes,

    #[error("feature has no rings")]
    MissingGeometry,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Output store refused a schema or a record.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("no schema declared")]
    NoSchema,

    #[error("schema already declared")]
    SchemaAlreadyDeclared,

    #[error("record has {got} values, schema has {expected} fields")]
    Arity { expected: usize, got: usize },

    #[error("field '{field}' expects {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: String,
    },

    #[error("column '{0}' duplicates another column (names are case-insensitive)")]
    DuplicateColumn(String),

    #[error("store is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// All errors surfaced by the harvesting library.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("cannot read input {path}: {source}")]
    InputRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportFailure,
    },

    #[error("service error for {url}: {source}")]
    Service {
        url: String,
        #[source]
        source: ServiceError,
    },

    #[error("parse failure for {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("feature error for '{term}': {source}")]
    Feature {
        term: String,
        #[source]
        source: FeatureError,
    },

    #[error("write failure for '{term}': {source}")]
    Write {
        term: String,
        #[source]
        source: SinkError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl HarvestError {
    /// Whether this error ends the whole run rather than one unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarvestError::InputRead { .. } | HarvestError::Config(_)
        )
    }

    /// Short label used in logs and progress events.
    pub fn kind(&self) -> &'static str {
        match self {
            HarvestError::InputRead { .. } => "input_read",
            HarvestError::Transport { .. } => "transport",
            HarvestError::Service { .. } => "service",
            HarvestError::Parse { .. } => "parse",
            HarvestError::Feature { .. } => "feature",
            HarvestError::Write { .. } => "write",
            HarvestError::Config(_) => "config",
            HarvestError::Io(_) => "io",
            HarvestError::Csv(_) => "csv",
        }
    }
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_input_and_config_are_fatal() {
        let input = HarvestError::InputRead {
            path: "terms.csv".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(input.is_fatal());
        assert!(HarvestError::Config("bad url".into()).is_fatal());

        let transport = HarvestError::Transport {
            url: "http://x".into(),
            source: TransportFailure::Timeout,
        };
        assert!(!transport.is_fatal());
        assert_eq!(transport.kind(), "transport");

        let parse = HarvestError::Parse {
            url: "http://x".into(),
            reason: "empty body".into(),
        };
        assert!(!parse.is_fatal());
    }

    #[test]
    fn test_display_includes_context() {
        let err = HarvestError::Service {
            url: "http://svc/find?searchText=Banff".into(),
            source: ServiceError {
                code: 400,
                message: "Unable to complete operation.".into(),
                details: vec![],
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("searchText=Banff"));
        assert!(msg.contains("400"));
    }
}
