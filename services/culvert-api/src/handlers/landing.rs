//! Landing handler.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use culvert_protocol::media_types;

pub const WELCOME: &str = "Culvert precipitation API. Hourly precipitation from MET Norway stations and the IMERG archive, \
river flow from NVE and culvert water levels from PipeLife.";

/// GET /
pub async fn landing_handler() -> Response {
    ([(header::CONTENT_TYPE, media_types::TEXT)], WELCOME).into_response()
}
