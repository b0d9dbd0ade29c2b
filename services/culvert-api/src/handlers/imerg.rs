//! IMERG archive endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::Uri,
    response::Response,
};
use culvert_protocol::{PipelineError, QueryGeometry};
use serde::Deserialize;
use tracing::{info, warn};

use super::{parse_point, parse_polygon, parse_range};
use crate::output::{error_response, series_response, OutputFormat};
use crate::sources::{ImergSource, PrecipitationSource};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImergQuery {
    pub point_wkt: Option<String>,
    pub polygon_wkt: Option<String>,
    pub date_range: Option<String>,
    pub crs: Option<String>,
    pub output: Option<String>,
}

/// GET /imerg/point/precipitation
pub async fn point_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<ImergQuery>,
) -> Response {
    let result = match parse_point(&params.point_wkt, &params.crs) {
        Ok(geometry) => precipitation(&state, &params, geometry).await,
        Err(e) => Err(e),
    };
    respond(result, &uri)
}

/// GET /imerg/polygon/precipitation
pub async fn polygon_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<ImergQuery>,
) -> Response {
    let result = match parse_polygon(&params.polygon_wkt, &params.crs) {
        Ok(geometry) => precipitation(&state, &params, geometry).await,
        Err(e) => Err(e),
    };
    respond(result, &uri)
}

fn respond(result: Result<Response, PipelineError>, uri: &Uri) -> Response {
    result.unwrap_or_else(|e| {
        warn!(path = %uri.path(), status = e.status_code(), error = %e, "Request failed");
        error_response(&e, uri.path())
    })
}

async fn precipitation(
    state: &AppState,
    params: &ImergQuery,
    geometry: QueryGeometry,
) -> Result<Response, PipelineError> {
    let archive = state.imerg()?;
    let format = OutputFormat::from_query_param(params.output.as_deref())?;
    let range = parse_range(&params.date_range)?;

    let source = ImergSource::new(Arc::clone(archive));
    let result = source.fetch_series(&geometry, &range).await?;
    info!(cells = result.weights.len(), range = %range, "Served IMERG precipitation");
    series_response(format, source.name(), &geometry, &range, &result)
}
