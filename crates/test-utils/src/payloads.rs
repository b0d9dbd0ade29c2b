//! Canned provider responses, shaped like the live APIs return them.
//!
//! Only the fields the clients read are guaranteed; a few extra fields are
//! included so that deserialisers are exercised against unknown keys.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

fn hourly_times(start: &str, count: usize) -> Vec<DateTime<Utc>> {
    let start = DateTime::parse_from_rfc3339(start)
        .expect("fixture start must be RFC 3339")
        .with_timezone(&Utc);
    (0..count as i64).map(|h| start + Duration::hours(h)).collect()
}

// ---------------------------------------------------------------------------
// Frost
// ---------------------------------------------------------------------------

/// One entry of a Frost `sources` response.
pub fn frost_source(id: &str, name: &str, lon: f64, lat: f64, distance: Option<f64>) -> Value {
    let mut source = json!({
        "@type": "SensorSystem",
        "id": id,
        "name": name,
        "shortName": name,
        "country": "Norge",
        "geometry": {
            "@type": "Point",
            "coordinates": [lon, lat],
            "nearest": false
        },
        "validFrom": "1937-01-01T00:00:00.000Z"
    });
    if let Some(distance) = distance {
        source["distance"] = json!(distance);
    }
    source
}

/// A Frost `sources` response body.
pub fn frost_sources(sources: Vec<Value>) -> Value {
    json!({
        "@context": "https://frost.met.no/schema",
        "@type": "SourceResponse",
        "apiVersion": "v0",
        "totalItemCount": sources.len(),
        "data": sources
    })
}

/// Hourly observation entries for one station, starting at `start` (RFC 3339).
pub fn frost_station_observations(station_id: &str, start: &str, values: &[f64]) -> Vec<Value> {
    hourly_times(start, values.len())
        .into_iter()
        .zip(values)
        .map(|(time, value)| {
            json!({
                "sourceId": format!("{}:0", station_id),
                "referenceTime": time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
                "observations": [{
                    "elementId": "sum(precipitation_amount PT1H)",
                    "value": value,
                    "unit": "mm",
                    "timeOffset": "PT0H",
                    "timeResolution": "PT1H",
                    "qualityCode": 0
                }]
            })
        })
        .collect()
}

/// A Frost `observations` response body.
pub fn frost_observations(entries: Vec<Value>) -> Value {
    json!({
        "@context": "https://frost.met.no/schema",
        "@type": "ObservationResponse",
        "apiVersion": "v0",
        "totalItemCount": entries.len(),
        "data": entries
    })
}

/// A Frost error body, as sent with 400, 404 and 412 responses.
pub fn frost_error(code: u16, message: &str, reason: &str) -> Value {
    json!({
        "@context": "https://frost.met.no/schema",
        "@type": "ErrorResponse",
        "apiVersion": "v0",
        "error": {
            "code": code,
            "message": message,
            "reason": reason
        }
    })
}

// ---------------------------------------------------------------------------
// Locationforecast
// ---------------------------------------------------------------------------

/// A Locationforecast 2.0 `compact` body with hourly steps from `start`.
///
/// `None` entries omit `next_1_hours`, as the API does for the long-range
/// six-hourly tail.
pub fn locationforecast(lon: f64, lat: f64, start: &str, precipitation: &[Option<f64>]) -> Value {
    let timeseries: Vec<Value> = hourly_times(start, precipitation.len())
        .into_iter()
        .zip(precipitation)
        .map(|(time, amount)| {
            let mut data = json!({
                "instant": { "details": { "air_temperature": 1.5 } }
            });
            if let Some(amount) = amount {
                data["next_1_hours"] = json!({
                    "summary": { "symbol_code": "rain" },
                    "details": { "precipitation_amount": amount }
                });
            }
            json!({
                "time": time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                "data": data
            })
        })
        .collect();

    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [lon, lat, 10] },
        "properties": {
            "meta": {
                "updated_at": start,
                "units": { "precipitation_amount": "mm" }
            },
            "timeseries": timeseries
        }
    })
}

// ---------------------------------------------------------------------------
// NVE HydAPI
// ---------------------------------------------------------------------------

/// One entry of the NVE `Stations` response.
///
/// `parameters` are `(parameter, english name)` pairs, each offered at
/// 60-minute resolution over `[from, to]`.
pub fn nve_station(
    id: &str,
    name: &str,
    lon: f64,
    lat: f64,
    parameters: &[(u32, &str)],
    from: &str,
    to: Option<&str>,
) -> Value {
    let series: Vec<Value> = parameters
        .iter()
        .map(|(parameter, name_eng)| {
            json!({
                "parameter": parameter,
                "parameterName": name_eng,
                "parameterNameEng": name_eng,
                "unit": "m",
                "resolutionList": [
                    { "resTime": 1440, "method": "Mean", "dataFromTime": from, "dataToTime": to },
                    { "resTime": 60, "method": "Instantaneous", "dataFromTime": from, "dataToTime": to }
                ]
            })
        })
        .collect();

    json!({
        "stationId": id,
        "stationName": name,
        "latitude": lat,
        "longitude": lon,
        "utmEast_Z33": 0,
        "utmNorth_Z33": 0,
        "stationStatusName": "Aktiv",
        "seriesList": series
    })
}

/// The NVE `Stations` response body.
pub fn nve_stations(stations: Vec<Value>) -> Value {
    json!({
        "currentLink": "https://hydapi.nve.no/api/v1/Stations?Active=1",
        "apiVersion": "1.0",
        "itemCount": stations.len(),
        "data": stations
    })
}

/// One parameter's series in an NVE `Observations` response.
pub fn nve_parameter_observations(
    station_id: &str,
    station_name: &str,
    parameter: u32,
    parameter_name: &str,
    start: &str,
    values: &[f64],
) -> Value {
    let observations: Vec<Value> = hourly_times(start, values.len())
        .into_iter()
        .zip(values)
        .map(|(time, value)| {
            json!({
                "time": time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                "value": value,
                "correction": 0,
                "quality": 2
            })
        })
        .collect();

    json!({
        "stationId": station_id,
        "stationName": station_name,
        "parameter": parameter,
        "parameterName": parameter_name,
        "parameterNameEng": parameter_name,
        "method": "Instantaneous",
        "unit": "m",
        "observationCount": values.len(),
        "observations": observations
    })
}

/// The NVE `Observations` response body.
pub fn nve_observations(series: Vec<Value>) -> Value {
    json!({
        "currentLink": "https://hydapi.nve.no/api/v1/Observations",
        "apiVersion": "1.0",
        "itemCount": series.len(),
        "data": series
    })
}

// ---------------------------------------------------------------------------
// PipeLife
// ---------------------------------------------------------------------------

/// A successful password-grant token response.
pub fn pipelife_token(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "expires_in": 3600,
        "token_type": "Bearer",
        "scope": null,
        "refresh_token": "refresh"
    })
}

/// The token endpoint's reply to bad credentials.
pub fn pipelife_token_error() -> Value {
    json!({
        "error": "invalid_grant",
        "error_description": "Invalid username and password combination"
    })
}

/// The location listing; `x`/`y` are sent as strings by the vendor.
pub fn pipelife_locations(locations: &[(&str, f64, f64)]) -> Value {
    let locations: Vec<Value> = locations
        .iter()
        .map(|(id, x, y)| {
            json!({
                "location": {
                    "id": id,
                    "name": format!("Culvert {}", id),
                    "x": x.to_string(),
                    "y": y.to_string()
                }
            })
        })
        .collect();
    json!({ "locations": locations })
}

/// The tag listing of one location, as `(tag id, description)` pairs.
pub fn pipelife_tags(tags: &[(&str, &str)]) -> Value {
    let tags: Vec<Value> = tags
        .iter()
        .map(|(id, description)| json!({ "tag": { "id": id, "description": description } }))
        .collect();
    json!({ "tags": tags })
}

/// Hourly trend values starting at `start_unix` seconds.
pub fn pipelife_trend(start_unix: i64, values: &[f64]) -> Value {
    let points: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            json!({
                "logtime@uts": start_unix + i as i64 * 3600,
                "logvalue": value,
                "flag": 0
            })
        })
        .collect();
    Value::Array(points)
}
