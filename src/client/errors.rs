//! Operation-level error types.
//!
//! Every failure of a license operation is reported as an [`ApiError`] stored
//! in the returned [`ApiResult`](super::responses::ApiResult). Errors reported
//! by the add-on itself carry the add-on's numeric code, which is mapped to
//! [`RemoteErrorCode`] for programmatic handling.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Error codes documented by the WooCommerce Software Add-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorCode {
    /// 100: missing or malformed request parameters
    InvalidRequest,
    /// 101: license key does not exist for this email/product
    InvalidLicenseKey,
    /// 102: the software has been deactivated
    SoftwareDeactivated,
    /// 103: maximum number of activations reached
    ActivationLimitReached,
    /// 104: instance does not belong to this license key
    InvalidInstance,
    /// 105: secret key was rejected
    InvalidSecretKey,
    /// Any code this crate does not know about
    Unknown,
}

impl RemoteErrorCode {
    /// Maps the raw code sent by the add-on.
    pub fn from_code(raw: &str) -> Self {
        match raw.trim().parse::<u16>() {
            Ok(100) => RemoteErrorCode::InvalidRequest,
            Ok(101) => RemoteErrorCode::InvalidLicenseKey,
            Ok(102) => RemoteErrorCode::SoftwareDeactivated,
            Ok(103) => RemoteErrorCode::ActivationLimitReached,
            Ok(104) => RemoteErrorCode::InvalidInstance,
            Ok(105) => RemoteErrorCode::InvalidSecretKey,
            _ => RemoteErrorCode::Unknown,
        }
    }

    /// Returns a default human-readable message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            RemoteErrorCode::InvalidRequest => "Invalid request",
            RemoteErrorCode::InvalidLicenseKey => "Invalid license key",
            RemoteErrorCode::SoftwareDeactivated => "Software has been deactivated",
            RemoteErrorCode::ActivationLimitReached => "Exceeded maximum number of activations",
            RemoteErrorCode::InvalidInstance => "Invalid instance ID",
            RemoteErrorCode::InvalidSecretKey => "Invalid security key",
            RemoteErrorCode::Unknown => "Unknown error",
        }
    }

    /// Returns true if the license key itself cannot be used any more.
    pub fn is_license_invalid(&self) -> bool {
        matches!(
            self,
            RemoteErrorCode::InvalidLicenseKey | RemoteErrorCode::SoftwareDeactivated
        )
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default_message())
    }
}

/// An error payload returned by the add-on inside a 200 response.
///
/// ```json
/// { "error": "Invalid License Key", "code": "101", "timestamp": 1700000000, "sig": "..." }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    /// Typed error code
    pub code: RemoteErrorCode,
    /// Code exactly as sent (the add-on uses both strings and numbers)
    pub raw_code: String,
    /// Message sent by the add-on
    pub message: String,
}

impl RemoteError {
    pub fn new(raw_code: impl Into<String>, message: impl Into<String>) -> Self {
        let raw_code = raw_code.into();
        Self {
            code: RemoteErrorCode::from_code(&raw_code),
            raw_code,
            message: message.into(),
        }
    }

    /// Extracts the embedded error from a parsed response body, if any.
    ///
    /// Only JSON objects with a non-null `error` field qualify.
    pub fn from_output(output: &Value) -> Option<Self> {
        let object = output.as_object()?;
        let message = match object.get("error")? {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let raw_code = object.get("code").map(value_to_string).unwrap_or_default();

        Some(Self::new(raw_code, message))
    }

    /// Returns true if the license key itself cannot be used any more.
    pub fn is_license_invalid(&self) -> bool {
        self.code.is_license_invalid()
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code {}: {}", self.raw_code, self.message)
    }
}

/// Renders a scalar JSON value without surrounding quotes.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Why a license operation did not succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// DNS, connection, TLS or body stream failure
    #[error("{0}")]
    Transport(String),

    /// The server answered with a status other than 200
    #[error("Status code is {0}")]
    Status(u16),

    /// The body of a 200 response was not valid JSON
    #[error("{0}")]
    InvalidJson(String),

    /// The add-on reported a failure in a well-formed response
    #[error("{0}")]
    Remote(RemoteError),

    /// No email was bound to the client nor passed to the call
    #[error("No email set")]
    NoEmail,

    /// The check succeeded but the key has no activations
    #[error("Software key is not yet activated")]
    NotActivated,

    /// None of the activations matched the requested instance/platform
    #[error("No matching timestamp '{instance}' and/or platform '{platform}'")]
    NoMatch { instance: String, platform: String },
}

impl ApiError {
    /// The add-on's error, when the failure came from the add-on.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ApiError::Remote(err) => Some(err),
            _ => None,
        }
    }
}
