//! Precipitation sources behind a common capability.
//!
//! A source turns a query geometry and a date range into one aggregated
//! hourly series, keeping the per-contributor weights and any stations used
//! so handlers can report them.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use culvert_protocol::{aggregate_series, Contribution, DateRange, PipelineError, PrecipitationSeries, QueryGeometry};
use grid_processor::ImergArchive;
use station_client::{FrostClient, Station};
use tracing::{debug, instrument};

/// An aggregated series and what went into it.
#[derive(Debug, Clone)]
pub struct SourceSeries {
    pub series: PrecipitationSeries,
    /// `(label, weight)` of every contributor, in aggregation order.
    pub weights: Vec<(String, f64)>,
    /// Stations the series was built from; empty for gridded sources.
    pub stations: Vec<Station>,
}

impl SourceSeries {
    fn from_contributions(
        contributions: &[Contribution],
        range: &DateRange,
        stations: Vec<Station>,
    ) -> Result<Self, PipelineError> {
        let series = aggregate_series(contributions, range.hourly_timestamps())?;
        Ok(Self {
            series,
            weights: contributions.iter().map(|c| (c.label.clone(), c.weight)).collect(),
            stations,
        })
    }
}

/// Anything that can produce hourly precipitation for a geometry.
#[async_trait]
pub trait PrecipitationSource: Send + Sync {
    /// Short name used in responses and file names.
    fn name(&self) -> &'static str;

    async fn fetch_series(&self, geometry: &QueryGeometry, range: &DateRange) -> Result<SourceSeries, PipelineError>;
}

/// Area-weighted cells of the IMERG archive.
pub struct ImergSource {
    archive: Arc<ImergArchive>,
}

impl ImergSource {
    pub fn new(archive: Arc<ImergArchive>) -> Self {
        Self { archive }
    }
}

#[async_trait]
impl PrecipitationSource for ImergSource {
    fn name(&self) -> &'static str {
        "imerg"
    }

    #[instrument(skip(self, geometry), fields(range = %range))]
    async fn fetch_series(&self, geometry: &QueryGeometry, range: &DateRange) -> Result<SourceSeries, PipelineError> {
        let contributions = self.archive.read_geometry(geometry, range).await?;
        debug!(cells = contributions.len(), "Read archive contributions");
        SourceSeries::from_contributions(&contributions, range, Vec::new())
    }
}

/// Frost stations with a complete record over the range.
///
/// A point uses the nearest complete station. An area averages every
/// complete station inside it, each with an equal weight of `1/n`. These
/// weights are a plain mean chosen here; they are not area-based and say
/// nothing about how much of the polygon a station represents.
pub struct FrostSource<'a> {
    client: &'a FrostClient,
    nearest_candidates: usize,
}

impl<'a> FrostSource<'a> {
    pub fn new(client: &'a FrostClient, nearest_candidates: usize) -> Self {
        Self {
            client,
            nearest_candidates,
        }
    }

    /// Complete stations inside every polygon of `geometry`, each listed once.
    async fn stations_inside(&self, geometry: &QueryGeometry, range: &DateRange) -> Result<Vec<Station>, PipelineError> {
        let mut seen = HashSet::new();
        let mut stations = Vec::new();
        for wkt in geometry.to_wkt_parts() {
            for station in self.client.polygon_precipitation(&wkt, range).await? {
                if seen.insert(station.id.clone()) {
                    stations.push(station);
                }
            }
        }
        Ok(stations)
    }
}

#[async_trait]
impl PrecipitationSource for FrostSource<'_> {
    fn name(&self) -> &'static str {
        "met"
    }

    #[instrument(skip(self, geometry), fields(range = %range))]
    async fn fetch_series(&self, geometry: &QueryGeometry, range: &DateRange) -> Result<SourceSeries, PipelineError> {
        let stations = match geometry {
            QueryGeometry::Point { lon, lat } => {
                vec![
                    self.client
                        .point_precipitation(*lon, *lat, range, self.nearest_candidates)
                        .await?,
                ]
            }
            QueryGeometry::Area { .. } => self.stations_inside(geometry, range).await?,
        };
        if stations.is_empty() {
            return Err(PipelineError::no_data(format!(
                "No station inside the polygon has a complete record for {}",
                range
            )));
        }

        let weight = 1.0 / stations.len() as f64;
        let contributions: Vec<Contribution> = stations
            .iter()
            .map(|s| Contribution::new(s.id.clone(), weight, s.series().values().to_vec()))
            .collect();
        SourceSeries::from_contributions(&contributions, range, stations)
    }
}
