//! MET Norway endpoints: Frost stations and Locationforecast.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::Uri,
    response::Response,
};
use culvert_protocol::{PipelineError, QueryGeometry};
use serde::Deserialize;
use serde_json::json;
use station_client::Station;
use tracing::{info, warn};

use super::{parse_crs, parse_point, parse_polygon, parse_range, required};
use crate::output::{error_response, json_ok, series_response, OutputFormat};
use crate::sources::{FrostSource, PrecipitationSource};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub point_wkt: Option<String>,
    pub date_range: Option<String>,
    pub crs: Option<String>,
    /// Number of nearest stations to list.
    pub count: Option<usize>,
    pub output: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolygonQuery {
    pub polygon_wkt: Option<String>,
    pub date_range: Option<String>,
    pub crs: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub point_wkt: Option<String>,
    pub crs: Option<String>,
}

fn respond(result: Result<Response, PipelineError>, uri: &Uri) -> Response {
    result.unwrap_or_else(|e| {
        warn!(path = %uri.path(), status = e.status_code(), error = %e, "Request failed");
        error_response(&e, uri.path())
    })
}

fn stations_body(stations: &[Station]) -> Result<Response, PipelineError> {
    json_ok(json!({ "source": "met", "stations": stations }))
}

/// GET /met/point/nearest
pub async fn nearest_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<PointQuery>,
) -> Response {
    respond(nearest(&state, &params).await, &uri)
}

async fn nearest(state: &AppState, params: &PointQuery) -> Result<Response, PipelineError> {
    let frost = state.frost()?;
    let range = parse_range(&params.date_range)?;
    let QueryGeometry::Point { lon, lat } = parse_point(&params.point_wkt, &params.crs)? else {
        return Err(PipelineError::format("point_wkt must be a POINT"));
    };
    let count = params.count.unwrap_or(1).max(1);

    let stations = frost.nearest_stations(lon, lat, &range, count).await?;
    if stations.is_empty() {
        return Err(PipelineError::no_data(format!("No station reports precipitation for {}", range)));
    }
    stations_body(&stations)
}

/// GET /met/point/precipitation
pub async fn point_precipitation_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<PointQuery>,
) -> Response {
    respond(point_precipitation(&state, &params).await, &uri)
}

async fn point_precipitation(state: &AppState, params: &PointQuery) -> Result<Response, PipelineError> {
    let frost = state.frost()?;
    let format = OutputFormat::from_query_param(params.output.as_deref())?;
    let range = parse_range(&params.date_range)?;
    let geometry = parse_point(&params.point_wkt, &params.crs)?;

    let source = FrostSource::new(frost, state.config.frost.nearest_candidates);
    let result = source.fetch_series(&geometry, &range).await?;
    if let Some(station) = result.stations.first() {
        info!(station = %station.id, range = %range, "Served point precipitation");
    }
    series_response(format, source.name(), &geometry, &range, &result)
}

/// GET /met/polygon/all
pub async fn polygon_stations_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<PolygonQuery>,
) -> Response {
    respond(polygon_stations(&state, &params).await, &uri)
}

async fn polygon_stations(state: &AppState, params: &PolygonQuery) -> Result<Response, PipelineError> {
    let frost = state.frost()?;
    let range = parse_range(&params.date_range)?;
    let geometry = parse_polygon(&params.polygon_wkt, &params.crs)?;

    let mut seen = HashSet::new();
    let mut stations = Vec::new();
    for wkt in geometry.to_wkt_parts() {
        for station in frost.stations_within(&wkt, &range).await? {
            if seen.insert(station.id.clone()) {
                stations.push(station);
            }
        }
    }
    if stations.is_empty() {
        return Err(PipelineError::no_data("No station inside the polygon reports precipitation"));
    }
    stations_body(&stations)
}

/// GET /met/polygon/precipitation
pub async fn polygon_precipitation_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<PolygonQuery>,
) -> Response {
    respond(polygon_precipitation(&state, &params).await, &uri)
}

async fn polygon_precipitation(state: &AppState, params: &PolygonQuery) -> Result<Response, PipelineError> {
    let frost = state.frost()?;
    let format = OutputFormat::from_query_param(params.output.as_deref())?;
    let range = parse_range(&params.date_range)?;
    let geometry = parse_polygon(&params.polygon_wkt, &params.crs)?;

    let source = FrostSource::new(frost, state.config.frost.nearest_candidates);
    let result = source.fetch_series(&geometry, &range).await?;
    info!(stations = result.stations.len(), range = %range, "Served polygon precipitation");
    series_response(format, source.name(), &geometry, &range, &result)
}

/// GET /met/point/forecast
///
/// Accepts a point or a polygon; a polygon is forecast at its centroid.
pub async fn forecast_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<ForecastQuery>,
) -> Response {
    respond(forecast(&state, &params).await, &uri)
}

async fn forecast(state: &AppState, params: &ForecastQuery) -> Result<Response, PipelineError> {
    let crs = parse_crs(&params.crs)?;
    let geometry = QueryGeometry::parse(required(&params.point_wkt, "point_wkt")?, &crs)?;
    let (lon, lat) = geometry.centroid();

    let forecast = state.forecast.forecast(lon, lat).await?;
    if forecast.is_empty() {
        return Err(PipelineError::no_data("Forecast has no hourly precipitation"));
    }
    json_ok(json!({
        "source": "met-forecast",
        "lon": lon,
        "lat": lat,
        "forecast": forecast,
    }))
}
