//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::Client;

use crate::error::Result;

/// Default request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Options applied to every provider client.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    /// Sent on every request; Locationforecast rejects anonymous clients.
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("culvert-precipitation/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Build a `reqwest` client. Every call is a single attempt; no retries.
pub fn build_client(options: &HttpOptions) -> Result<Client> {
    let client = Client::builder()
        .timeout(options.timeout)
        .connect_timeout(Duration::from_secs(30))
        .user_agent(options.user_agent.clone())
        .pool_max_idle_per_host(4)
        .build()?;
    Ok(client)
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
