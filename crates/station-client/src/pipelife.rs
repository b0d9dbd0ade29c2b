//! PipeLife (telecontrolnet) culvert sensors: hourly water level.
//!
//! Every configured user logs in with a password grant. The user's location
//! listing is filtered to the requested culvert ids; for each location the
//! `Water Level` tags are looked up and their trend read between the range
//! bounds.

use std::collections::HashSet;
use std::fmt;

use culvert_protocol::DateRange;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, StationError};
use crate::http::trim_base;

pub const DEFAULT_BASE_URL: &str = "https://www.telecontrolnet.nl";

/// Tag description marking a water level sensor.
pub const WATER_LEVEL_TAG: &str = "Water Level";

const PROVIDER: &str = "PipeLife";

/// Login for one PipeLife account.
#[derive(Clone, Deserialize)]
pub struct PipeLifeCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for PipeLifeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeLifeCredentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Water level series of one tag at one culvert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CulvertResults {
    /// Culvert (location) id.
    pub id: String,
    /// Unix seconds, as logged by the sensor.
    pub timestamp: Vec<i64>,
    pub values: Vec<f64>,
}

/// A culvert location owned by a PipeLife account.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeLifeLocation {
    pub id: String,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    locations: Vec<LocationWrapper>,
}

#[derive(Debug, Deserialize)]
struct LocationWrapper {
    location: LocationEntry,
}

#[derive(Debug, Deserialize)]
struct LocationEntry {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(deserialize_with = "lenient_f64")]
    x: f64,
    #[serde(deserialize_with = "lenient_f64")]
    y: f64,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Vec<TagWrapper>,
}

#[derive(Debug, Deserialize)]
struct TagWrapper {
    tag: TagEntry,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TrendPoint {
    #[serde(rename = "logtime@uts", deserialize_with = "lenient_i64")]
    logtime: i64,
    #[serde(deserialize_with = "lenient_f64")]
    logvalue: f64,
}

// The vendor sends ids and coordinates as strings or numbers, seemingly at random.

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {}", other))),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected number, got {}", other))),
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    lenient_f64(deserializer).map(|v| v as i64)
}

#[derive(Debug, Clone)]
pub struct PipeLifeClient {
    http: Client,
    base_url: String,
}

impl PipeLifeClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| StationError::decode(PROVIDER, e.to_string()))?;
        if let Some(error) = body.get("error") {
            return Err(StationError::Upstream(format!("PipeLife API ({}): {}", path, error)));
        }
        if !status.is_success() {
            return Err(StationError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }
        Ok(body)
    }

    fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T> {
        serde_json::from_value(body).map_err(|e| StationError::decode(PROVIDER, e.to_string()))
    }

    /// Exchange `credentials` for an access token.
    #[instrument(skip(self, credentials), fields(user = %credentials.username))]
    pub async fn access_token(&self, credentials: &PipeLifeCredentials) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.base_url))
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| StationError::decode(PROVIDER, e.to_string()))?;
        if body.get("error").is_some() {
            return Err(StationError::InvalidCredentials);
        }
        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StationError::decode(PROVIDER, "token response has no access_token"))
    }

    /// Every location visible to the token holder.
    pub async fn locations(&self, token: &str) -> Result<Vec<PipeLifeLocation>> {
        let body = self.get_json("/api/v1/locations", &[("access_token", token)]).await?;
        let parsed: LocationsResponse = Self::decode(body)?;
        Ok(parsed
            .locations
            .into_iter()
            .map(|w| PipeLifeLocation {
                id: w.location.id,
                lon: w.location.x,
                lat: w.location.y,
            })
            .collect())
    }

    /// Ids of the water level tags at `location_id`.
    pub async fn water_level_tags(&self, token: &str, location_id: &str) -> Result<Vec<String>> {
        let path = format!("/api/v1/locations/{}/tags", location_id);
        let body = self.get_json(&path, &[("access_token", token)]).await?;
        let parsed: TagsResponse = Self::decode(body)?;
        Ok(parsed
            .tags
            .into_iter()
            .filter(|w| w.tag.description == WATER_LEVEL_TAG)
            .map(|w| w.tag.id)
            .collect())
    }

    /// Logged `(unix seconds, value)` points of `tag_id` within `range`.
    pub async fn trend(&self, token: &str, tag_id: &str, range: &DateRange) -> Result<Vec<(i64, f64)>> {
        let path = format!("/api/v1/trend/{}", tag_id);
        let start = range.start_unix().to_string();
        let end = range.end_unix().to_string();
        let body = self
            .get_json(&path, &[("access_token", token), ("s", start.as_str()), ("e", end.as_str())])
            .await?;
        let points: Vec<TrendPoint> = Self::decode(body)?;
        Ok(points.into_iter().map(|p| (p.logtime, p.logvalue)).collect())
    }

    /// Water level series for the requested culvert `ids`, across every
    /// account in `users`. A culvert visible to several accounts is read once.
    #[instrument(skip(self, users), fields(users = users.len(), range = %range))]
    pub async fn water_levels(
        &self,
        users: &[PipeLifeCredentials],
        ids: &[String],
        range: &DateRange,
    ) -> Result<Vec<CulvertResults>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut results = Vec::new();

        for user in users {
            let token = self.access_token(user).await?;
            let locations = self.locations(&token).await?;
            for location in locations {
                if !wanted.contains(location.id.as_str()) || !seen.insert(location.id.clone()) {
                    continue;
                }
                let tags = self.water_level_tags(&token, &location.id).await?;
                if tags.is_empty() {
                    warn!(location = %location.id, "Culvert has no water level tag");
                }
                for tag in tags {
                    let points = self.trend(&token, &tag, range).await?;
                    debug!(location = %location.id, tag = %tag, points = points.len(), "Read water level trend");
                    let (timestamp, values) = points.into_iter().unzip();
                    results.push(CulvertResults {
                        id: location.id.clone(),
                        timestamp,
                        values,
                    });
                }
            }
        }

        let missing: Vec<&str> = wanted.iter().filter(|id| !seen.contains(**id)).copied().collect();
        if !missing.is_empty() {
            info!(?missing, "Requested culverts not found for any configured user");
        }
        Ok(results)
    }
}
