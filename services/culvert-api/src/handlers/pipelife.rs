//! PipeLife culvert water level endpoint.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::Uri,
    response::Response,
};
use culvert_protocol::PipelineError;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{parse_range, required};
use crate::output::{error_response, json_ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WaterLevelQuery {
    /// Comma-separated culvert ids.
    pub pipelife_ids: Option<String>,
    pub date_range: Option<String>,
}

/// Split `2118, 3030,,` into `["2118", "3030"]`.
fn parse_ids(ids: &str) -> Vec<String> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /pipelife/id/waterlevel
pub async fn water_level_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    Query(params): Query<WaterLevelQuery>,
) -> Response {
    water_level(&state, &params).await.unwrap_or_else(|e| {
        warn!(path = %uri.path(), status = e.status_code(), error = %e, "Request failed");
        error_response(&e, uri.path())
    })
}

async fn water_level(state: &AppState, params: &WaterLevelQuery) -> Result<Response, PipelineError> {
    let users = &state.config.pipelife.users;
    if users.is_empty() {
        return Err(PipelineError::Unavailable("No PipeLife users are configured".to_string()));
    }
    let ids = parse_ids(required(&params.pipelife_ids, "pipelife_ids")?);
    if ids.is_empty() {
        return Err(PipelineError::format("pipelife_ids lists no culvert id"));
    }
    let range = parse_range(&params.date_range)?;

    let results = state.pipelife.water_levels(users, &ids, &range).await?;
    if results.is_empty() {
        return Err(PipelineError::no_data(format!("No water level found for {}", ids.join(","))));
    }
    info!(culverts = results.len(), "Served PipeLife water levels");
    json_ok(json!({ "source": "pipelife", "culverts": results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids("2118, 3030,,"), vec!["2118", "3030"]);
        assert!(parse_ids(" , ").is_empty());
    }
}
