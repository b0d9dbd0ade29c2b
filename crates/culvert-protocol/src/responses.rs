//! Error envelope returned on failed requests.

use serde::{Deserialize, Serialize};

const TYPE_BASE: &str = "urn:culvert-precipitation:error";

/// Problem-details style body for error responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionResponse {
    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// Human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// HTTP status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Detailed error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Path of the request that caused the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ExceptionResponse {
    /// Create a new exception response. `kind` is appended to the type URN.
    pub fn new(kind: &str, status: u16, detail: impl Into<String>) -> Self {
        Self {
            type_: format!("{}:{}", TYPE_BASE, kind),
            title: None,
            status: Some(status),
            detail: Some(detail.into()),
            instance: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// 400, malformed request parameter.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("invalid-parameter-value", 400, detail).with_title("Bad Request")
    }

    /// 400, date range outside the archive.
    pub fn out_of_range(detail: impl Into<String>) -> Self {
        Self::new("out-of-archive-range", 400, detail).with_title("Bad Request")
    }

    /// 204, nothing matched the query.
    pub fn no_data(detail: impl Into<String>) -> Self {
        Self::new("no-data", 204, detail).with_title("No Content")
    }

    /// 502, an upstream provider reported an error.
    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new("upstream-error", 502, detail).with_title("Bad Gateway")
    }

    /// 503, a provider or the archive is not configured.
    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new("unavailable", 503, detail).with_title("Service Unavailable")
    }

    /// 500, anything unexpected.
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new("server-error", 500, detail).with_title("Internal Server Error")
    }
}
