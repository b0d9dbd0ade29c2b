//! MET Norway Frost: weather station discovery and hourly precipitation.
//!
//! Station discovery queries the `sources` endpoint either for the `k`
//! nearest stations to a point or for all stations inside a polygon. The
//! candidates' observations are then fetched in one request and passed
//! through [`retain_complete`], so only stations that reported every hour of
//! the range survive.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use culvert_protocol::DateRange;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::completeness::retain_complete;
use crate::error::{Result, StationError};
use crate::http::trim_base;
use crate::station::Station;

pub const DEFAULT_BASE_URL: &str = "https://frost.met.no";

/// The hourly precipitation element every query is restricted to.
pub const PRECIPITATION_ELEMENT: &str = "sum(precipitation_amount PT1H)";

/// Number of nearest stations considered for a point query.
pub const DEFAULT_NEAREST_CANDIDATES: usize = 50;

const SOURCES_PATH: &str = "/sources/v0.jsonld";
const OBSERVATIONS_PATH: &str = "/observations/v0.jsonld";
const PROVIDER: &str = "Frost";

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    #[serde(default)]
    data: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    geometry: Option<SourceGeometry>,
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SourceGeometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    data: Vec<ObservationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationEntry {
    source_id: String,
    reference_time: DateTime<Utc>,
    #[serde(default)]
    observations: Vec<ObservationValue>,
}

#[derive(Debug, Deserialize)]
struct ObservationValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Station id of a Frost source id such as `SN18700:0`.
pub fn station_id(source_id: &str) -> &str {
    source_id.split(':').next().unwrap_or(source_id)
}

/// Client for the Frost API, authenticated with a client id.
#[derive(Debug, Clone)]
pub struct FrostClient {
    http: Client,
    base_url: String,
    client_id: String,
}

impl FrostClient {
    pub fn new(http: Client, base_url: &str, client_id: impl Into<String>) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            client_id: client_id.into(),
        }
    }

    /// The `k` stations nearest to (`lon`, `lat`) with hourly precipitation
    /// during `range`, ordered by distance.
    #[instrument(skip(self), fields(range = %range))]
    pub async fn nearest_stations(&self, lon: f64, lat: f64, range: &DateRange, k: usize) -> Result<Vec<Station>> {
        let geometry = format!("nearest(POINT({} {}))", lon, lat);
        let k = k.to_string();
        self.sources(&[("geometry", geometry.as_str()), ("nearestmaxcount", k.as_str())], range)
            .await
    }

    /// All stations inside `polygon_wkt` with hourly precipitation during `range`.
    #[instrument(skip(self, polygon_wkt), fields(range = %range))]
    pub async fn stations_within(&self, polygon_wkt: &str, range: &DateRange) -> Result<Vec<Station>> {
        self.sources(&[("geometry", polygon_wkt)], range).await
    }

    async fn sources(&self, geometry: &[(&str, &str)], range: &DateRange) -> Result<Vec<Station>> {
        let validtime = range.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("types", "SensorSystem"),
            ("elements", PRECIPITATION_ELEMENT),
            ("fields", "geometry,distance,id,name"),
            ("validtime", validtime.as_str()),
        ];
        query.extend_from_slice(geometry);

        let response = self
            .http
            .get(format!("{}{}", self.base_url, SOURCES_PATH))
            .basic_auth(&self.client_id, Some(""))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // Frost answers 404 when no source matches the filter.
            debug!("Frost found no stations");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(upstream_error(response, "Stations").await);
        }

        let body: SourcesResponse = response
            .json()
            .await
            .map_err(|e| StationError::decode(PROVIDER, e.to_string()))?;

        let stations: Vec<Station> = body
            .data
            .into_iter()
            .filter_map(|entry| {
                let coords = entry.geometry.as_ref().map(|g| g.coordinates.as_slice());
                let Some([lon, lat, ..]) = coords else {
                    warn!(station = %entry.id, "Skipping station without coordinates");
                    return None;
                };
                let name = entry.name.clone().unwrap_or_default();
                Some(Station::new(entry.id, name, *lon, *lat).with_distance(entry.distance))
            })
            .collect();

        debug!(count = stations.len(), "Frost stations found");
        Ok(stations)
    }

    /// Hourly precipitation of `ids` over `range`, keyed by station id, each
    /// series in time order.
    #[instrument(skip(self, ids), fields(stations = ids.len(), range = %range))]
    pub async fn observations(&self, ids: &[String], range: &DateRange) -> Result<HashMap<String, Vec<(i64, f64)>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sources = ids.join(",");
        let referencetime = range.to_string();

        let response = self
            .http
            .get(format!("{}{}", self.base_url, OBSERVATIONS_PATH))
            .basic_auth(&self.client_id, Some(""))
            .query(&[
                ("sources", sources.as_str()),
                ("elements", PRECIPITATION_ELEMENT),
                ("referencetime", referencetime.as_str()),
                ("fields", "value,referenceTime,sourceId"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response, "Observations").await);
        }

        let body: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| StationError::decode(PROVIDER, e.to_string()))?;

        let mut grouped: HashMap<String, Vec<(i64, f64)>> = HashMap::new();
        for entry in body.data {
            let id = station_id(&entry.source_id).to_string();
            let timestamp = entry.reference_time.timestamp_millis();
            let series = grouped.entry(id).or_default();
            series.extend(entry.observations.iter().map(|o| (timestamp, o.value)));
        }
        for series in grouped.values_mut() {
            series.sort_by_key(|(t, _)| *t);
        }
        Ok(grouped)
    }

    /// The nearest station among `candidates` nearest ones that reported
    /// every hour of `range`.
    pub async fn point_precipitation(
        &self,
        lon: f64,
        lat: f64,
        range: &DateRange,
        candidates: usize,
    ) -> Result<Station> {
        let nearby = self.nearest_stations(lon, lat, range, candidates).await?;
        let complete = self.complete_stations(nearby, range).await?;

        let mut station = complete.into_iter().next().ok_or_else(|| {
            StationError::NoStation(format!(
                "No station near POINT({} {}) has a complete record for {}",
                lon, lat, range
            ))
        })?;
        station.nearest = true;
        info!(station = %station.id, distance_km = ?station.distance_km, "Selected nearest complete station");
        Ok(station)
    }

    /// Every station inside `polygon_wkt` that reported every hour of `range`.
    pub async fn polygon_precipitation(&self, polygon_wkt: &str, range: &DateRange) -> Result<Vec<Station>> {
        let inside = self.stations_within(polygon_wkt, range).await?;
        self.complete_stations(inside, range).await
    }

    async fn complete_stations(&self, candidates: Vec<Station>, range: &DateRange) -> Result<Vec<Station>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let ids: Vec<String> = candidates.iter().map(|s| s.id.clone()).collect();
        let observations = self.observations(&ids, range).await?;
        let complete = retain_complete(candidates, &observations, range.hours());
        debug!(candidates = ids.len(), complete = complete.len(), "Completeness filter applied");
        Ok(complete)
    }
}

/// Turn a Frost error payload into readable upstream text.
async fn upstream_error(response: reqwest::Response, endpoint: &str) -> StationError {
    let status = response.status().as_u16();
    match response.json::<ErrorResponse>().await {
        Ok(body) => {
            let reason = body
                .error
                .reason
                .or(body.error.message)
                .unwrap_or_else(|| format!("HTTP {}", status));
            StationError::Upstream(format!("FROST API ({}): {}", endpoint, reason))
        }
        Err(_) => StationError::Status {
            provider: PROVIDER,
            status,
        },
    }
}
