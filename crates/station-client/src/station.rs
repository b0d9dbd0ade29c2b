//! Weather station records shared by discovery and observation calls.

use culvert_protocol::PrecipitationSeries;
use serde::Serialize;

/// A point sensor, optionally carrying its hourly series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// WGS84 longitude.
    pub lon: f64,
    /// WGS84 latitude.
    pub lat: f64,
    /// Distance from the query point in kilometres, when the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Set on the station chosen for a point query.
    pub nearest: bool,
    /// `(epoch ms, value)` pairs in time order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<(i64, f64)>,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lon,
            lat,
            distance_km: None,
            nearest: false,
            observations: Vec::new(),
        }
    }

    pub fn with_distance(mut self, distance_km: Option<f64>) -> Self {
        self.distance_km = distance_km;
        self
    }

    /// The attached observations as a series.
    pub fn series(&self) -> PrecipitationSeries {
        PrecipitationSeries::from_pairs(self.observations.iter().copied())
    }
}
