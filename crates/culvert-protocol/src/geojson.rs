//! GeoJSON output.
//!
//! A series is returned as a single Feature whose geometry is the request
//! geometry (or a station location) and whose properties carry the hourly
//! timestamps and values side by side.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::QueryGeometry;
use crate::series::PrecipitationSeries;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features,
        }
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub geometry: Geometry,

    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach `timestamps` and `precipitation` arrays.
    pub fn with_series(self, series: &PrecipitationSeries) -> Self {
        self.with_property("timestamps", series.timestamps().to_vec())
            .with_property("precipitation", series.values().to_vec())
    }
}

/// Geometry types produced by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        /// [longitude, latitude]
        coordinates: [f64; 2],
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }
}

fn ring_coords(ring: &[(f64, f64)]) -> Vec<[f64; 2]> {
    ring.iter().map(|&(lon, lat)| [lon, lat]).collect()
}

impl From<&QueryGeometry> for Geometry {
    fn from(geometry: &QueryGeometry) -> Self {
        match geometry {
            QueryGeometry::Point { lon, lat } => Geometry::point(*lon, *lat),
            QueryGeometry::Area { polygons } if polygons.len() == 1 => Geometry::Polygon {
                coordinates: vec![ring_coords(&polygons[0])],
            },
            QueryGeometry::Area { polygons } => Geometry::MultiPolygon {
                coordinates: polygons.iter().map(|r| vec![ring_coords(r)]).collect(),
            },
        }
    }
}

/// A FeatureCollection holding one feature for `series` over `geometry`.
pub fn series_collection(
    geometry: &QueryGeometry,
    series: &PrecipitationSeries,
    source: &str,
) -> FeatureCollection {
    let feature = Feature::new(Geometry::from(geometry))
        .with_property("source", source)
        .with_series(series);
    FeatureCollection::new(vec![feature])
}
