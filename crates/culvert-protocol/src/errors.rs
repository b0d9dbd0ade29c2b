//! Pipeline error taxonomy.
//!
//! Every failure a request can hit is normalised into [`PipelineError`],
//! which knows its HTTP status and how to render itself as an
//! [`ExceptionResponse`]. Library crates keep their own error enums and
//! convert into this one at the boundary.

use projection::ProjectionError;
use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::date_range::DateRangeError;
use crate::geometry::GeometryError;
use crate::responses::ExceptionResponse;
use crate::series::SeriesError;

/// Errors surfaced to API clients.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed request parameter (date range, WKT, CRS, output mode).
    #[error("{0}")]
    Format(String),

    /// Request falls outside the archive's temporal bounds.
    #[error("{0}")]
    Range(String),

    /// Query was valid but nothing satisfies it.
    #[error("{0}")]
    NoData(String),

    /// A provider returned an error payload; the text is passed through.
    #[error("{0}")]
    Upstream(String),

    /// A provider or the archive is not configured on this deployment.
    #[error("{0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Format(_) => 400,
            PipelineError::Range(_) => 400,
            PipelineError::NoData(_) => 204,
            PipelineError::Upstream(_) => 502,
            PipelineError::Unavailable(_) => 503,
            PipelineError::Internal(_) => 500,
        }
    }

    /// Convert to an ExceptionResponse.
    pub fn to_exception(&self) -> ExceptionResponse {
        match self {
            PipelineError::Format(msg) => ExceptionResponse::bad_request(msg),
            PipelineError::Range(msg) => ExceptionResponse::out_of_range(msg),
            PipelineError::NoData(msg) => ExceptionResponse::no_data(msg),
            PipelineError::Upstream(msg) => ExceptionResponse::bad_gateway(msg),
            PipelineError::Unavailable(msg) => ExceptionResponse::service_unavailable(msg),
            PipelineError::Internal(msg) => ExceptionResponse::internal_error(msg),
        }
    }
}

impl From<DateRangeError> for PipelineError {
    fn from(err: DateRangeError) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<GeometryError> for PipelineError {
    fn from(err: GeometryError) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<ProjectionError> for PipelineError {
    fn from(err: ProjectionError) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<AggregateError> for PipelineError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::Empty => Self::NoData("No data sources cover the requested geometry".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<SeriesError> for PipelineError {
    fn from(err: SeriesError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(PipelineError::format("x").status_code(), 400);
        assert_eq!(PipelineError::Range("x".to_string()).status_code(), 400);
        assert_eq!(PipelineError::no_data("x").status_code(), 204);
        assert_eq!(PipelineError::upstream("x").status_code(), 502);
        assert_eq!(PipelineError::Unavailable("x".to_string()).status_code(), 503);
        assert_eq!(PipelineError::internal("x").status_code(), 500);
    }

    #[test]
    fn test_date_range_error_is_format() {
        let err: PipelineError = DateRangeError::InvalidFormat("2020".to_string()).into();
        assert!(matches!(err, PipelineError::Format(_)));
        assert!(err.to_string().contains("YYYY-MM-DD/YYYY-MM-DD"));
    }

    #[test]
    fn test_upstream_message_passes_through() {
        let err = PipelineError::upstream("FROST API (Observations): Invalid geometry");
        let exc = err.to_exception();

        assert_eq!(exc.status, Some(502));
        assert_eq!(
            exc.detail.as_deref(),
            Some("FROST API (Observations): Invalid geometry")
        );
    }

    #[test]
    fn test_empty_aggregate_is_no_data() {
        let err: PipelineError = AggregateError::Empty.into();
        assert_eq!(err.status_code(), 204);
    }

    #[test]
    fn test_projection_error_is_format() {
        let err: PipelineError = ProjectionError::Unsupported(2056).into();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("2056"));
    }
}
