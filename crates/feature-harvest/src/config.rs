//! Run configuration and output naming.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HarvestError, HarvestResult};
use crate::schema::SchemaOptions;

/// Environment variable consulted when no base URL is given explicitly.
pub const BASE_URL_ENV: &str = "FEATURE_HARVEST_URL";

/// Historical WDPA find endpoint.
pub const DEFAULT_BASE_URL: &str = "http://ec2-54-204-216-109.compute-1.amazonaws.com:6080/arcgis/rest/services/wdpa/wdpa/MapServer/find?layers=1&returnGeometry=true&f=pjson";

pub const DEFAULT_CONCURRENCY: usize = 2;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SRID: u32 = 3857;

/// Everything the core needs to run one harvest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Find/search endpoint, optionally with fixed query parameters.
    pub base_url: String,
    /// Maximum number of outstanding requests.
    pub concurrency: usize,
    /// `contains` match mode; `None` leaves the parameter off.
    pub contains: Option<bool>,
    /// Per-request timeout enforced by the transport.
    pub timeout_ms: u64,
    /// `layers` selector, if not already on the base URL.
    pub layers: Option<String>,
    /// `searchFields` selector, if not already on the base URL.
    pub search_fields: Option<String>,
    /// Response format (`f` parameter).
    pub format: String,
    /// Spatial reference requested from the service (`sr` parameter).
    pub out_sr: Option<u32>,
    /// Spatial reference recorded on the output layer.
    pub srid: u32,
    pub user_agent: String,
    pub schema: SchemaOptions,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            contains: Some(true),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            layers: None,
            search_fields: None,
            format: "json".to_string(),
            out_sr: None,
            srid: DEFAULT_SRID,
            user_agent: concat!("feature-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
            schema: SchemaOptions::default(),
        }
    }
}

impl HarvestConfig {
    /// Reject settings the run cannot start with.
    pub fn validate(&self) -> HarvestResult<()> {
        if self.concurrency == 0 {
            return Err(HarvestError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(HarvestError::Config("timeout must be positive".to_string()));
        }
        url::Url::parse(self.base_url.trim()).map_err(|e| {
            HarvestError::Config(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        Ok(())
    }
}

/// Resolve the base URL: explicit value, then `FEATURE_HARVEST_URL`, then the default.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.trim().trim_end_matches(['/', '\\']).to_string();
    }

    if let Ok(env_url) = std::env::var(BASE_URL_ENV) {
        if !env_url.trim().is_empty() {
            return env_url.trim().to_string();
        }
    }

    DEFAULT_BASE_URL.to_string()
}

/// `<input stem>_<YYYYmmdd_HHMMSS>`, the default output layer name.
pub fn default_layer_name(input: &Path, started: DateTime<Local>) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("harvest");
    let safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{safe}_{}", started.format("%Y%m%d_%H%M%S"))
}

/// `<layer>.csv` next to the input file.
pub fn default_summary_path(input: &Path, layer: &str) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{layer}.csv"))
}
