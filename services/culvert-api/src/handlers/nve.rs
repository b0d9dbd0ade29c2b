//! NVE river flow endpoint.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::Uri,
    response::Response,
};
use culvert_protocol::{PipelineError, QueryGeometry};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{parse_point, parse_range};
use crate::output::{error_response, json_ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FlowQuery {
    pub point_wkt: Option<String>,
    pub date_range: Option<String>,
    pub crs: Option<String>,
}

/// GET /nve/point/flow
pub async fn flow_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<FlowQuery>,
) -> Response {
    flow(&state, &params).await.unwrap_or_else(|e| {
        warn!(path = %uri.path(), status = e.status_code(), error = %e, "Request failed");
        error_response(&e, uri.path())
    })
}

async fn flow(state: &AppState, params: &FlowQuery) -> Result<Response, PipelineError> {
    let nve = state.nve()?;
    let range = parse_range(&params.date_range)?;
    let QueryGeometry::Point { lon, lat } = parse_point(&params.point_wkt, &params.crs)? else {
        return Err(PipelineError::format("point_wkt must be a POINT"));
    };

    let (station, series) = nve.nearest_flow(lon, lat, &range).await?;
    info!(station = %station.id, series = series.len(), "Served NVE flow");
    json_ok(json!({
        "source": "nve",
        "station": station,
        "series": series,
    }))
}
