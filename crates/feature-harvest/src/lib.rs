//! Feature Harvest: pull polygon features for a list of search terms from a
//! remote find service into a geometry store, with a per-term summary log.
//!
//! Pipeline: [`terms`] → [`query`] → [`dispatcher`] → [`session`]
//! ([`response`], [`schema`], [`geometry`], [`writer`]) → [`sink`] + [`summary`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod geometry;
pub mod harvest;
pub mod progress;
pub mod query;
pub mod report;
pub mod response;
pub mod schema;
pub mod session;
pub mod sink;
pub mod summary;
pub mod terms;
pub mod transport;
pub mod types;
pub mod writer;

pub use config::{default_layer_name, default_summary_path, resolve_base_url, HarvestConfig};
pub use dispatcher::Dispatcher;
pub use error::{
    FeatureError, HarvestError, HarvestResult, ServiceError, SinkError, TransportFailure,
};
pub use geometry::{build_polygon, RingPolygon};
pub use harvest::Harvester;
pub use query::QueryBuilder;
pub use report::HarvestReport;
pub use schema::{FieldDef, FieldSource, OutputSchema, SchemaOptions, SchemaUnifier};
pub use session::HarvestSession;
pub use sink::{FeatureSink, MemorySink, SqliteSink};
pub use summary::SummaryLog;
pub use terms::{read_terms, read_terms_from_path};
pub use transport::{HttpTransport, Transport};
pub use types::*;
