//! Culvert precipitation API library
//!
//! This module exposes the API components for testing.

pub mod config;
pub mod handlers;
pub mod output;
pub mod sources;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the full router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::landing::landing_handler))
        .route("/health", get(handlers::health::health_handler))
        // MET Norway stations and forecast
        .route("/met/point/nearest", get(handlers::met::nearest_handler))
        .route(
            "/met/point/precipitation",
            get(handlers::met::point_precipitation_handler),
        )
        .route("/met/point/forecast", get(handlers::met::forecast_handler))
        .route("/met/polygon/all", get(handlers::met::polygon_stations_handler))
        .route(
            "/met/polygon/precipitation",
            get(handlers::met::polygon_precipitation_handler),
        )
        // IMERG archive
        .route("/imerg/point/precipitation", get(handlers::imerg::point_handler))
        .route("/imerg/polygon/precipitation", get(handlers::imerg::polygon_handler))
        // Flow and culvert sensors
        .route("/nve/point/flow", get(handlers::nve::flow_handler))
        .route(
            "/pipelife/id/waterlevel",
            get(handlers::pipelife::water_level_handler),
        )
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
