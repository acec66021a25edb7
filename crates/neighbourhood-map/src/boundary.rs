use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{error, info};

/// Feature property holding the neighbourhood name; must match
/// [`crate::summary::NeighbourhoodSummary::neighbourhood`] exactly.
pub const NAME_PROPERTY: &str = "neighbourhood";

/// Exterior ring followed by any holes, as `(longitude, latitude)` pairs.
pub type Polygon = Vec<Vec<(f64, f64)>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        let polygons: &[Polygon] = match self {
            Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
            Geometry::MultiPolygon(polygons) => polygons,
        };
        polygons.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.polygons().flatten().flatten().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub name: String,
    pub geometry: Geometry,
}

/// A validated polygon feature collection. The document is kept as loaded
/// and serializes back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCollection {
    raw: Value,
    features: Vec<BoundaryFeature>,
}

impl BoundaryCollection {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BoundaryError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BoundaryError> {
        let raw: Value = serde_json::from_reader(reader)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, BoundaryError> {
        match raw.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {}
            other => {
                return Err(BoundaryError::Malformed(format!(
                    "expected type FeatureCollection, found {}",
                    other.unwrap_or("nothing")
                )))
            }
        }

        let entries = raw
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| BoundaryError::Malformed("missing features array".to_string()))?;

        let features = entries
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                parse_feature(feature)
                    .map_err(|reason| BoundaryError::Malformed(format!("feature {index}: {reason}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { raw, features })
    }

    pub fn features(&self) -> &[BoundaryFeature] {
        &self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|feature| feature.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|candidate| candidate == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl Serialize for BoundaryCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

fn parse_feature(feature: &Value) -> Result<BoundaryFeature, String> {
    let name = feature
        .get("properties")
        .and_then(|properties| properties.get(NAME_PROPERTY))
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing string property '{NAME_PROPERTY}'"))?;

    let geometry = feature
        .get("geometry")
        .filter(|geometry| !geometry.is_null())
        .ok_or_else(|| format!("'{name}' has no geometry"))?;

    let coordinates = geometry
        .get("coordinates")
        .cloned()
        .ok_or_else(|| format!("'{name}' geometry has no coordinates"))?;

    let geometry = match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => {
            let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(coordinates)
                .map_err(|err| format!("'{name}' polygon coordinates: {err}"))?;
            Geometry::Polygon(to_polygon(rings).map_err(|err| format!("'{name}': {err}"))?)
        }
        Some("MultiPolygon") => {
            let polygons: Vec<Vec<Vec<Vec<f64>>>> = serde_json::from_value(coordinates)
                .map_err(|err| format!("'{name}' multipolygon coordinates: {err}"))?;
            let polygons = polygons
                .into_iter()
                .map(to_polygon)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| format!("'{name}': {err}"))?;
            Geometry::MultiPolygon(polygons)
        }
        other => {
            return Err(format!(
                "'{name}' has unsupported geometry type {}",
                other.unwrap_or("(none)")
            ))
        }
    };

    Ok(BoundaryFeature {
        name: name.to_string(),
        geometry,
    })
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon, String> {
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|position| match position.as_slice() {
                    [lon, lat, ..] => Ok((*lon, *lat)),
                    _ => Err("position with fewer than two coordinates".to_string()),
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    #[error("failed to read boundary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("boundary file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed feature collection: {0}")]
    Malformed(String),
}

/// Process-lifetime availability of the boundary collection.
///
/// A state leaves `Uninitialized` at most once. A failed load is terminal:
/// the process stays `Unavailable` until restart.
#[derive(Debug, Clone, Default)]
pub enum BoundaryState {
    #[default]
    Uninitialized,
    Ready(Arc<BoundaryCollection>),
    Unavailable { reason: String },
}

impl BoundaryState {
    pub fn ready(collection: BoundaryCollection) -> Self {
        Self::Ready(Arc::new(collection))
    }

    /// Loads the collection from disk. Only an `Uninitialized` state is
    /// affected; any other state is returned unchanged.
    pub fn load<P: AsRef<Path>>(self, path: P) -> Self {
        if !matches!(self, Self::Uninitialized) {
            return self;
        }

        let path = path.as_ref();
        match BoundaryCollection::from_path(path) {
            Ok(collection) => {
                info!(path = %path.display(), features = collection.len(), "boundary collection loaded");
                Self::ready(collection)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "boundary collection unavailable");
                Self::Unavailable {
                    reason: format!("{}: {err}", path.display()),
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The loaded collection, or the reason it cannot be served.
    pub fn collection(&self) -> Result<Arc<BoundaryCollection>, String> {
        match self {
            Self::Ready(collection) => Ok(Arc::clone(collection)),
            Self::Uninitialized => Err("boundary collection was never loaded".to_string()),
            Self::Unavailable { reason } => Err(reason.clone()),
        }
    }
}
