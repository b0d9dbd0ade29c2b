//! MET Norway Locationforecast 2.0: hourly precipitation forecast.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Result, StationError};
use crate::http::trim_base;

pub const DEFAULT_BASE_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0";

const PROVIDER: &str = "Locationforecast";

#[derive(Debug, Deserialize)]
struct CompactResponse {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(default)]
    timeseries: Vec<TimeStep>,
}

#[derive(Debug, Deserialize)]
struct TimeStep {
    time: DateTime<Utc>,
    data: StepData,
}

#[derive(Debug, Deserialize)]
struct StepData {
    #[serde(default)]
    next_1_hours: Option<Period>,
}

#[derive(Debug, Deserialize)]
struct Period {
    details: PeriodDetails,
}

#[derive(Debug, Deserialize)]
struct PeriodDetails {
    #[serde(default)]
    precipitation_amount: Option<f64>,
}

/// Locationforecast only accepts up to four decimals per coordinate.
fn round_coordinate(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone)]
pub struct ForecastClient {
    http: Client,
    base_url: String,
}

impl ForecastClient {
    /// The `http` client must send an identifying User-Agent.
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
        }
    }

    /// `(epoch ms, mm)` for every forecast hour that carries a one-hour
    /// precipitation amount. The six-hourly tail of the forecast is skipped.
    #[instrument(skip(self))]
    pub async fn forecast(&self, lon: f64, lat: f64) -> Result<Vec<(i64, f64)>> {
        let lat = round_coordinate(lat).to_string();
        let lon = round_coordinate(lon).to_string();

        let response = self
            .http
            .get(format!("{}/compact", self.base_url))
            .query(&[("lat", lat.as_str()), ("lon", lon.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StationError::Upstream(format!(
                "Locationforecast returned HTTP {}: {}",
                status.as_u16(),
                text.trim()
            )));
        }

        let body: CompactResponse = response
            .json()
            .await
            .map_err(|e| StationError::decode(PROVIDER, e.to_string()))?;

        let series: Vec<(i64, f64)> = body
            .properties
            .timeseries
            .into_iter()
            .filter_map(|step| {
                let amount = step.data.next_1_hours?.details.precipitation_amount?;
                Some((step.time.timestamp_millis(), amount))
            })
            .collect();

        debug!(steps = series.len(), "Forecast received");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_coordinate() {
        assert_eq!(round_coordinate(10.123456), 10.1235);
        assert_eq!(round_coordinate(-5.0), -5.0);
    }
}
