//! Culvert precipitation protocol
//!
//! Shared vocabulary for the precipitation pipeline and its HTTP surface:
//!
//! - [`DateRange`] parses `YYYY-MM-DD/YYYY-MM-DD` and enumerates the hourly
//!   and half-hourly instants a request covers.
//! - [`QueryGeometry`] parses WKT points and (multi)polygons, reprojecting
//!   them to WGS84.
//! - [`PrecipitationSeries`] and [`aggregate`] produce the timestamp/value
//!   pairs returned to clients, with CSV and GeoJSON encoders.
//! - [`PipelineError`] is the tagged error every provider failure is
//!   normalised into, carrying its HTTP status.
//!
//! # Example
//!
//! ```rust
//! use culvert_protocol::DateRange;
//!
//! let range = DateRange::parse("2020-02-01/2020-02-02").unwrap();
//! assert_eq!(range.hourly_timestamps().len(), 24);
//! ```

pub mod aggregate;
pub mod date_range;
pub mod errors;
pub mod geojson;
pub mod geometry;
pub mod responses;
pub mod series;

pub use aggregate::{aggregate, aggregate_series, AggregateError, Contribution};
pub use date_range::{ArchiveBounds, DateRange, DateRangeError};
pub use errors::PipelineError;
pub use geometry::{haversine_km, BoundingBox, GeometryError, QueryGeometry};
pub use responses::ExceptionResponse;
pub use series::{PrecipitationSeries, SeriesError};

/// Media types used in responses
pub mod media_types {
    /// JSON media type
    pub const JSON: &str = "application/json";
    /// GeoJSON media type
    pub const GEO_JSON: &str = "application/geo+json";
    /// CSV media type
    pub const CSV: &str = "text/csv";
    /// Plain text media type
    pub const TEXT: &str = "text/plain; charset=utf-8";
}
