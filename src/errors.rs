//! Crate-level errors.
//!
//! License operations never fail with `Err`: they report every failure inside
//! an [`ApiResult`](crate::client::responses::ApiResult). The errors in this
//! module cover the steps that happen before a request can be made at all,
//! such as building the HTTP client or loading configuration.

use thiserror::Error;

/// Errors raised while setting up a client or loading configuration.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The host name or base URL could not be turned into an endpoint URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The underlying HTTP client could not be constructed.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type LicenseResult<T> = Result<T, LicenseError>;
