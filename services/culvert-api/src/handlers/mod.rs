//! HTTP request handlers.

pub mod health;
pub mod imerg;
pub mod landing;
pub mod met;
pub mod nve;
pub mod pipelife;

use culvert_protocol::{DateRange, PipelineError, QueryGeometry};
use projection::Crs;

/// A query parameter that must be present and non-blank.
pub(crate) fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, PipelineError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PipelineError::format(format!("Missing required parameter: {}", name)))
}

/// The request CRS; WGS84 when absent.
pub(crate) fn parse_crs(crs: &Option<String>) -> Result<Crs, PipelineError> {
    match crs.as_deref().map(str::trim) {
        None | Some("") => Ok(Crs::Wgs84),
        Some(identifier) => Ok(Crs::parse(identifier)?),
    }
}

pub(crate) fn parse_range(date_range: &Option<String>) -> Result<DateRange, PipelineError> {
    Ok(DateRange::parse(required(date_range, "date_range")?)?)
}

pub(crate) fn parse_point(point_wkt: &Option<String>, crs: &Option<String>) -> Result<QueryGeometry, PipelineError> {
    let crs = parse_crs(crs)?;
    Ok(QueryGeometry::parse_point(required(point_wkt, "point_wkt")?, &crs)?)
}

pub(crate) fn parse_polygon(polygon_wkt: &Option<String>, crs: &Option<String>) -> Result<QueryGeometry, PipelineError> {
    let crs = parse_crs(crs)?;
    Ok(QueryGeometry::parse_area(required(polygon_wkt, "polygon_wkt")?, &crs)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        let err = required(&Some("  ".to_string()), "point_wkt").unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: point_wkt");
        assert!(required(&None, "date_range").is_err());
        assert_eq!(required(&Some(" x ".to_string()), "x").unwrap(), "x");
    }

    #[test]
    fn test_projected_point() {
        // EPSG:3857 origin is (0, 0) in WGS84.
        let geometry = parse_point(&Some("POINT(0 0)".to_string()), &Some("EPSG:3857".to_string())).unwrap();
        let QueryGeometry::Point { lon, lat } = geometry else {
            panic!("expected a point");
        };
        assert!(lon.abs() < 1e-9 && lat.abs() < 1e-9);
    }

    #[test]
    fn test_unknown_crs_is_format_error() {
        let err = parse_crs(&Some("EPSG:2056".to_string())).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
