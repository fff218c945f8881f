//! Polygon reconstruction from `rings` coordinate arrays.
//!
//! Each ring becomes one part, points kept in the order the service sent
//! them. Rings are not closed, reordered or validated.

use geo_types::{Coord, LineString};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FeatureError;

/// A polygon made of one part per input ring.
#[derive(Debug, Clone, PartialEq)]
pub struct RingPolygon {
    parts: Vec<LineString<f64>>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(default)]
    rings: Option<Vec<Vec<Vec<f64>>>>,
}

impl RingPolygon {
    pub fn parts(&self) -> &[LineString<f64>] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn point_count(&self) -> usize {
        self.parts.iter().map(|p| p.0.len()).sum()
    }

    /// Encode as a GeoJSON `Polygon`, one ring per part in input order.
    pub fn to_geojson(&self) -> geojson::Geometry {
        let rings: geojson::PolygonType = self
            .parts
            .iter()
            .map(|part| part.coords().map(|c| vec![c.x, c.y]).collect())
            .collect();
        geojson::Geometry::new(geojson::Value::Polygon(rings))
    }
}

/// Build a polygon from a raw geometry payload.
///
/// Absent geometry, absent `rings` and an empty `rings` array are all
/// [`FeatureError::MissingGeometry`]; such features are not written. A ring
/// without points is [`FeatureError::InvalidGeometry`].
pub fn build_polygon(geometry: Option<&Value>) -> Result<RingPolygon, FeatureError> {
    let Some(value) = geometry else {
        return Err(FeatureError::MissingGeometry);
    };

    let raw: RawGeometry = serde_json::from_value(value.clone())
        .map_err(|e| FeatureError::InvalidGeometry(e.to_string()))?;

    let rings = match raw.rings {
        Some(r) if !r.is_empty() => r,
        _ => return Err(FeatureError::MissingGeometry),
    };

    let mut parts = Vec::with_capacity(rings.len());
    for (ring_idx, ring) in rings.into_iter().enumerate() {
        if ring.is_empty() {
            return Err(FeatureError::InvalidGeometry(format!(
                "ring {ring_idx} has no points"
            )));
        }
        let mut coords = Vec::with_capacity(ring.len());
        for (point_idx, pair) in ring.into_iter().enumerate() {
            // z/m values after x, y are ignored
            if pair.len() < 2 {
                return Err(FeatureError::InvalidGeometry(format!(
                    "ring {ring_idx} point {point_idx} has {} ordinates",
                    pair.len()
                )));
            }
            coords.push(Coord {
                x: pair[0],
                y: pair[1],
            });
        }
        parts.push(LineString::new(coords));
    }

    Ok(RingPolygon { parts })
}
