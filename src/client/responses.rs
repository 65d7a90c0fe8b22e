//! Response types for the Software Add-on client.
//!
//! [`ApiResult`] is the uniform shape every operation returns. The `check`
//! payload additionally has a typed form, [`CheckResponse`], which is what
//! the activation matcher works on.

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::client::errors::{value_to_string, ApiError};

/// Rendered in place of an error message when a request succeeded.
pub const NO_ERROR: &str = "No error occurred";

/// Body of a response, as far as it could be understood.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// The body parsed as JSON
    Json(Value),
    /// The body could not be parsed; kept verbatim
    Raw(String),
}

/// Outcome of a single request to the add-on.
///
/// Callers must check [`ApiResult::success`] before trusting
/// [`ApiResult::output`]: a failed result may still carry the body that
/// caused the failure.
#[derive(Debug, Clone)]
pub struct ApiResult {
    pub(crate) success: bool,
    pub(crate) code: Option<u16>,
    pub(crate) headers: Option<HeaderMap>,
    pub(crate) output: Option<Output>,
    pub(crate) error: Option<ApiError>,
}

impl ApiResult {
    pub(crate) fn json(code: u16, headers: HeaderMap, value: Value) -> Self {
        Self {
            success: true,
            code: Some(code),
            headers: Some(headers),
            output: Some(Output::Json(value)),
            error: None,
        }
    }

    /// A failure detected before any request was made.
    pub(crate) fn local_failure(error: ApiError) -> Self {
        Self {
            success: false,
            code: None,
            headers: None,
            output: None,
            error: Some(error),
        }
    }

    pub(crate) fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(0),
            headers: None,
            output: None,
            error: Some(ApiError::Transport(message.into())),
        }
    }

    pub(crate) fn status_failure(code: u16, headers: HeaderMap) -> Self {
        Self {
            success: false,
            code: Some(code),
            headers: Some(headers),
            output: None,
            error: Some(ApiError::Status(code)),
        }
    }

    pub(crate) fn invalid_json(code: u16, headers: HeaderMap, body: String, error: String) -> Self {
        Self {
            success: false,
            code: Some(code),
            headers: Some(headers),
            output: Some(Output::Raw(body)),
            error: Some(ApiError::InvalidJson(error)),
        }
    }

    /// Downgrades this result to a failure, keeping code, headers and output.
    pub(crate) fn fail_with(mut self, error: ApiError) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Whether the operation succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// HTTP status; `Some(0)` for transport failures, `None` when no request was made.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// The parsed JSON body, if the body was JSON.
    pub fn json_output(&self) -> Option<&Value> {
        match &self.output {
            Some(Output::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// The verbatim body, if it could not be parsed.
    pub fn raw_output(&self) -> Option<&str> {
        match &self.output {
            Some(Output::Raw(body)) => Some(body),
            _ => None,
        }
    }

    /// Error text, or [`NO_ERROR`] for successful results.
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| NO_ERROR.to_string())
    }

    /// Converts into a `Result` for callers that prefer `?`.
    pub fn into_result(self) -> Result<Option<Output>, ApiError> {
        match self.error {
            Some(error) if !self.success => Err(error),
            _ => Ok(self.output),
        }
    }
}

/// One recorded activation of a license key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub activation_id: String,
    /// Instance identifier chosen by the client at activation time
    #[serde(default, deserialize_with = "lenient_string")]
    pub instance: String,
    /// Platform string; empty when none was recorded
    #[serde(default, deserialize_with = "lenient_string")]
    pub activation_platform: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub activation_time: String,
}

impl Activation {
    /// Parses `activation_time` (`YYYY-MM-DD HH:MM:SS`, server local time).
    pub fn activated_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.activation_time, "%Y-%m-%d %H:%M:%S").ok()
    }
}

/// Successful `check` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckSuccess {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub sig: String,
    /// Activations still available for this key
    #[serde(default)]
    pub remaining: i64,
    #[serde(default)]
    pub activations: Vec<Activation>,
}

impl CheckSuccess {
    pub fn server_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// Failed `check` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckFailed {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub sig: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub error: String,
}

/// `check` payload, discriminated by its `success` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResponse {
    Success(CheckSuccess),
    Failed(CheckFailed),
}

impl CheckResponse {
    /// Interprets a parsed body. A missing `success` field counts as failure.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if success {
            Ok(CheckResponse::Success(CheckSuccess::deserialize(value)?))
        } else {
            Ok(CheckResponse::Failed(CheckFailed::deserialize(value)?))
        }
    }
}

/// Accepts strings, numbers, booleans and null for string fields.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value))
}
