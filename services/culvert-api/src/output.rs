//! Output format negotiation and response encoding.

use axum::http::{header, StatusCode};
use axum::response::Response;
use culvert_protocol::geojson::{series_collection, Feature, Geometry};
use culvert_protocol::{media_types, DateRange, PipelineError, QueryGeometry};
use serde::Serialize;
use serde_json::Value;
use station_client::Station;

use crate::sources::SourceSeries;

/// Supported `output` values for series endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    GeoJson,
    Csv,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Json => media_types::JSON,
            OutputFormat::GeoJson => media_types::GEO_JSON,
            OutputFormat::Csv => media_types::CSV,
        }
    }

    /// Parse the `output` query parameter. Absent means JSON.
    pub fn from_query_param(param: Option<&str>) -> Result<Self, PipelineError> {
        match param.map(|p| p.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(OutputFormat::Json),
            Some("geojson") => Ok(OutputFormat::GeoJson),
            Some("csv") => Ok(OutputFormat::Csv),
            Some(other) => Err(PipelineError::format(format!(
                "Unsupported output '{}': expected json, geojson or csv",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
struct Contributor<'a> {
    label: &'a str,
    weight: f64,
}

#[derive(Serialize)]
struct SeriesBody<'a> {
    source: &'a str,
    date_range: String,
    geometry: Geometry,
    timestamps: &'a [i64],
    precipitation: &'a [f64],
    contributors: Vec<Contributor<'a>>,
    #[serde(skip_serializing_if = "no_stations")]
    stations: &'a [Station],
}

fn no_stations(stations: &&[Station]) -> bool {
    stations.is_empty()
}

/// Encode `result` in `format`.
pub fn series_response(
    format: OutputFormat,
    source: &str,
    geometry: &QueryGeometry,
    range: &DateRange,
    result: &SourceSeries,
) -> Result<Response, PipelineError> {
    match format {
        OutputFormat::Json => {
            let body = SeriesBody {
                source,
                date_range: range.to_string(),
                geometry: Geometry::from(geometry),
                timestamps: result.series.timestamps(),
                precipitation: result.series.values(),
                contributors: result
                    .weights
                    .iter()
                    .map(|(label, weight)| Contributor { label, weight: *weight })
                    .collect(),
                stations: &result.stations,
            };
            json_response(StatusCode::OK, format.content_type(), &body)
        }
        OutputFormat::GeoJson => {
            let mut collection = series_collection(geometry, &result.series, source);
            collection.features.extend(result.stations.iter().map(|s| {
                Feature::new(Geometry::point(s.lon, s.lat))
                    .with_id(s.id.clone())
                    .with_property("name", s.name.clone())
                    .with_property("nearest", s.nearest)
            }));
            json_response(StatusCode::OK, format.content_type(), &collection)
        }
        OutputFormat::Csv => {
            let csv = result.series.to_csv()?;
            let filename = format!("{}_{}.csv", source, range.to_string().replace('/', "_"));
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, format.content_type())
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                )
                .body(csv.into())
                .unwrap())
        }
    }
}

/// Serialize `body` as JSON with the given status and content type.
pub fn json_response<T: Serialize>(
    status: StatusCode,
    content_type: &str,
    body: &T,
) -> Result<Response, PipelineError> {
    let json = serde_json::to_string(body).map_err(|e| PipelineError::internal(e.to_string()))?;
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(json.into())
        .unwrap())
}

/// Shorthand for an `application/json` 200 built from a `serde_json::Value`.
pub fn json_ok(body: Value) -> Result<Response, PipelineError> {
    json_response(StatusCode::OK, media_types::JSON, &body)
}

/// Render a pipeline failure. No-data answers 204 with an empty body.
pub fn error_response(err: &PipelineError, instance: &str) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status == StatusCode::NO_CONTENT {
        return Response::builder().status(status).body(axum::body::Body::empty()).unwrap();
    }

    let exc = err.to_exception().with_instance(instance);
    let json = serde_json::to_string(&exc).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, media_types::JSON)
        .body(json.into())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use culvert_protocol::PrecipitationSeries;

    fn sample() -> (QueryGeometry, DateRange, SourceSeries) {
        let geometry = QueryGeometry::Point { lon: 10.0, lat: 60.0 };
        let range = DateRange::parse("2020-02-01/2020-02-02").unwrap();
        let series = PrecipitationSeries::from_pairs(vec![(1_580_515_200_000, 0.5), (1_580_518_800_000, 1.0)]);
        let result = SourceSeries {
            series,
            weights: vec![("10,20".to_string(), 1.0)],
            stations: Vec::new(),
        };
        (geometry, range, result)
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_query_param(None).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_query_param(Some("GeoJSON")).unwrap(), OutputFormat::GeoJson);
        assert_eq!(OutputFormat::from_query_param(Some("csv")).unwrap(), OutputFormat::Csv);

        let err = OutputFormat::from_query_param(Some("xml")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_csv_response_is_attachment() {
        let (geometry, range, result) = sample();
        let response = series_response(OutputFormat::Csv, "imerg", &geometry, &range, &result).unwrap();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert_eq!(disposition, "attachment; filename=\"imerg_2020-02-01_2020-02-02.csv\"");
    }

    #[test]
    fn test_no_data_has_empty_body() {
        let response = error_response(&PipelineError::no_data("nothing"), "/imerg/point/precipitation");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_upstream_error_status() {
        let response = error_response(&PipelineError::upstream("FROST API (Stations): bad"), "/met/point/nearest");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
