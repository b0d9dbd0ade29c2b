//! HTTP clients for the point-sensor providers.
//!
//! - [`frost`]: MET Norway weather stations with hourly precipitation
//! - [`forecast`]: MET Norway Locationforecast
//! - [`nve`]: NVE river gauges (water level, discharge)
//! - [`pipelife`]: PipeLife culvert water level sensors
//!
//! Every client takes a shared [`reqwest::Client`] and a base URL so tests
//! can point it at a local stub. Each call is a single attempt.

pub mod completeness;
pub mod error;
pub mod forecast;
pub mod frost;
pub mod http;
pub mod nve;
pub mod pipelife;
pub mod station;

pub use completeness::retain_complete;
pub use error::{Result, StationError};
pub use forecast::ForecastClient;
pub use frost::FrostClient;
pub use http::{build_client, HttpOptions};
pub use nve::{FlowSeries, NveClient, NveStation};
pub use pipelife::{CulvertResults, PipeLifeClient, PipeLifeCredentials};
pub use station::Station;
