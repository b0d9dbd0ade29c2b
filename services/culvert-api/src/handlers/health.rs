//! Health handler.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub providers: ProviderStatus,
}

/// Which optional providers this deployment can serve.
#[derive(Serialize)]
pub struct ProviderStatus {
    pub frost: bool,
    pub nve: bool,
    pub pipelife: bool,
    pub imerg: bool,
}

/// GET /health
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        providers: ProviderStatus {
            frost: state.frost.is_some(),
            nve: state.nve.is_some(),
            pipelife: !state.config.pipelife.users.is_empty(),
            imerg: state.imerg.is_some(),
        },
    })
}
