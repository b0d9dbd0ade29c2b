//! NVE HydAPI: river gauges reporting water level or discharge.
//!
//! The gauge nearest to a point is chosen among active stations that offer
//! parameter 1000 (water level) or 1001 (discharge) at hourly resolution
//! over the requested range.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use culvert_protocol::{haversine_km, DateRange};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{Result, StationError};
use crate::http::trim_base;

pub const DEFAULT_BASE_URL: &str = "https://hydapi.nve.no/api/v1";

pub const WATER_LEVEL: u32 = 1000;
pub const DISCHARGE: u32 = 1001;

/// Resolution, in minutes, of the series we read.
const HOURLY_RESOLUTION: u32 = 60;

const PROVIDER: &str = "NVE";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationEntry {
    station_id: String,
    station_name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    series_list: Vec<SeriesEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesEntry {
    parameter: u32,
    #[serde(default)]
    resolution_list: Vec<ResolutionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionEntry {
    res_time: u32,
    #[serde(default)]
    data_from_time: Option<String>,
    #[serde(default)]
    data_to_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationSeriesEntry {
    station_id: String,
    station_name: String,
    parameter: u32,
    #[serde(default)]
    parameter_name_eng: Option<String>,
    #[serde(default)]
    observations: Vec<ObservationEntry>,
}

#[derive(Debug, Deserialize)]
struct ObservationEntry {
    time: String,
    #[serde(default)]
    value: Option<f64>,
}

/// A gauge able to serve hourly water level or discharge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NveStation {
    pub id: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Which of water level / discharge the gauge offers over the range.
    pub parameters: Vec<u32>,
}

/// One parameter's hourly observations at a gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSeries {
    pub station_id: String,
    pub station_name: String,
    pub parameter: u32,
    pub parameter_name: String,
    /// `(epoch ms, value)` pairs; null values are left out.
    pub observations: Vec<(i64, f64)>,
}

/// The date part of an NVE timestamp such as `1912-09-01T00:00:00`.
fn date_of(timestamp: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(timestamp.get(..10)?, "%Y-%m-%d").ok()
}

/// Epoch milliseconds of an NVE observation time, with or without offset.
fn parse_time(timestamp: &str) -> Option<i64> {
    if let Ok(t) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(t.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn covers(resolution: &ResolutionEntry, range: &DateRange) -> bool {
    if resolution.res_time != HOURLY_RESOLUTION {
        return false;
    }
    let Some(from) = resolution.data_from_time.as_deref().and_then(date_of) else {
        return false;
    };
    let first_day = range.start().date_naive();
    let last_day = range.last_slot().unwrap_or(range.start()).date_naive();
    let until_ok = match resolution.data_to_time.as_deref() {
        // An open-ended series is still being recorded.
        None => true,
        Some(to) => date_of(to).is_some_and(|to| to >= last_day),
    };
    from <= first_day && until_ok
}

/// Reduce the station listing to gauges with hourly water level or
/// discharge over `range`.
fn usable_flow_stations(entries: Vec<StationEntry>, range: &DateRange) -> Vec<NveStation> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let parameters: Vec<u32> = entry
                .series_list
                .iter()
                .filter(|s| s.parameter == WATER_LEVEL || s.parameter == DISCHARGE)
                .filter(|s| s.resolution_list.iter().any(|r| covers(r, range)))
                .map(|s| s.parameter)
                .collect();
            (!parameters.is_empty()).then(|| NveStation {
                id: entry.station_id,
                name: entry.station_name,
                lon: entry.longitude,
                lat: entry.latitude,
                distance_km: None,
                parameters,
            })
        })
        .collect()
}

/// The station closest to (`lon`, `lat`), with its distance filled in.
pub fn nearest(stations: Vec<NveStation>, lon: f64, lat: f64) -> Option<NveStation> {
    stations
        .into_iter()
        .map(|mut s| {
            s.distance_km = Some(haversine_km(lon, lat, s.lon, s.lat));
            s
        })
        .min_by(|a, b| a.distance_km.partial_cmp(&b.distance_km).unwrap_or(std::cmp::Ordering::Equal))
}

/// Client for HydAPI, authenticated with an API key header.
#[derive(Debug, Clone)]
pub struct NveClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl NveClient {
    pub fn new(http: Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            api_key: api_key.into(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-API-Key", &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StationError::Upstream(format!(
                "NVE API ({}): HTTP {} {}",
                path.trim_start_matches('/'),
                status.as_u16(),
                text.trim()
            )));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| StationError::decode(PROVIDER, e.to_string()))?;
        Ok(envelope.data)
    }

    /// Active gauges offering hourly water level or discharge over `range`.
    #[instrument(skip(self), fields(range = %range))]
    pub async fn flow_stations(&self, range: &DateRange) -> Result<Vec<NveStation>> {
        let entries: Vec<StationEntry> = self.get("/Stations", &[("Active", "1")]).await?;
        let total = entries.len();
        let stations = usable_flow_stations(entries, range);
        debug!(total, usable = stations.len(), "NVE stations filtered");
        Ok(stations)
    }

    /// Hourly water level and discharge of `station_id` over `range`.
    #[instrument(skip(self), fields(range = %range))]
    pub async fn observations(&self, station_id: &str, range: &DateRange) -> Result<Vec<FlowSeries>> {
        let parameters = format!("{},{}", WATER_LEVEL, DISCHARGE);
        let resolution = HOURLY_RESOLUTION.to_string();
        let reference_time = range.to_string();
        let entries: Vec<ObservationSeriesEntry> = self
            .get(
                "/Observations",
                &[
                    ("StationId", station_id),
                    ("Parameter", parameters.as_str()),
                    ("ResolutionTime", resolution.as_str()),
                    ("ReferenceTime", reference_time.as_str()),
                ],
            )
            .await?;

        Ok(entries
            .into_iter()
            .map(|entry| FlowSeries {
                station_id: entry.station_id,
                station_name: entry.station_name,
                parameter: entry.parameter,
                parameter_name: entry.parameter_name_eng.unwrap_or_default(),
                observations: entry
                    .observations
                    .iter()
                    .filter_map(|o| Some((parse_time(&o.time)?, o.value?)))
                    .collect(),
            })
            .collect())
    }

    /// Observations of the gauge nearest to (`lon`, `lat`).
    pub async fn nearest_flow(&self, lon: f64, lat: f64, range: &DateRange) -> Result<(NveStation, Vec<FlowSeries>)> {
        let stations = self.flow_stations(range).await?;
        let station = nearest(stations, lon, lat).ok_or_else(|| {
            StationError::NoStation(format!("No NVE gauge has hourly water level or discharge for {}", range))
        })?;
        info!(station = %station.id, distance_km = ?station.distance_km, "Selected nearest NVE gauge");

        let series = self.observations(&station.id, range).await?;
        Ok((station, series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(res_time: u32, from: &str, to: Option<&str>) -> ResolutionEntry {
        ResolutionEntry {
            res_time,
            data_from_time: Some(from.to_string()),
            data_to_time: to.map(str::to_string),
        }
    }

    #[test]
    fn test_covers_requires_hourly_and_span() {
        let range = DateRange::parse("2020-02-01/2020-02-03").unwrap();
        assert!(covers(&resolution(60, "2010-01-01T00:00:00", None), &range));
        assert!(covers(&resolution(60, "2010-01-01T00:00:00", Some("2020-02-02T23:00:00")), &range));
        assert!(!covers(&resolution(1440, "2010-01-01T00:00:00", None), &range));
        assert!(!covers(&resolution(60, "2020-02-02T00:00:00", None), &range));
        assert!(!covers(&resolution(60, "2010-01-01T00:00:00", Some("2020-02-01T12:00:00")), &range));
    }

    #[test]
    fn test_parse_time_accepts_both_forms() {
        assert_eq!(parse_time("2020-02-01T00:00:00Z"), Some(1_580_515_200_000));
        assert_eq!(parse_time("2020-02-01T00:00:00"), Some(1_580_515_200_000));
        assert_eq!(parse_time("yesterday"), None);
    }

    #[test]
    fn test_nearest_fills_distance() {
        let station = |id: &str, lon: f64, lat: f64| NveStation {
            id: id.to_string(),
            name: id.to_string(),
            lon,
            lat,
            distance_km: None,
            parameters: vec![WATER_LEVEL],
        };
        let picked = nearest(vec![station("far", 12.0, 62.0), station("near", 10.1, 60.1)], 10.0, 60.0).unwrap();
        assert_eq!(picked.id, "near");
        assert!(picked.distance_km.unwrap() < 15.0);
    }
}
