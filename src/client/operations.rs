//! The five Software Add-on operations.
//!
//! Each function sends one request through a [`Transport`] and returns the
//! normalized [`ApiResult`]. Parameter order on the wire follows the order in
//! which the add-on documents them.
//!
//! ```rust,no_run
//! use woo_software::client::matcher::ActivationFilter;
//! use woo_software::client::operations::check_license;
//! use woo_software::client::request::Transport;
//!
//! # async fn run() -> woo_software::errors::LicenseResult<()> {
//! let transport = Transport::new("shop.example.com")?;
//! let filter = ActivationFilter::new(1_700_000_000u64, "");
//! let result = check_license(&transport, "PRODUCT", "me@example.com", "KEY", &filter).await;
//! if !result.success() {
//!     eprintln!("license check failed: {}", result.error_message());
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::matcher::{match_activations, ActivationFilter, Platform};
use crate::client::request::{QueryParams, Request, Transport};
use crate::client::responses::ApiResult;
use crate::logging::{log_license_event, LicenseEvent};

/// Optional parameters of `generate_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateKeyOptions {
    pub order_id: Option<String>,
    pub version: Option<String>,
    pub key_prefix: Option<String>,
    /// Number of activations the key allows
    pub activations: u32,
}

impl Default for GenerateKeyOptions {
    fn default() -> Self {
        Self {
            order_id: None,
            version: None,
            key_prefix: None,
            activations: 1,
        }
    }
}

/// Generates a new license key (`generate_key`).
pub async fn generate_key(
    transport: &Transport,
    product_id: &str,
    email: &str,
    secret_key: &str,
    options: &GenerateKeyOptions,
) -> ApiResult {
    let params = QueryParams::new()
        .required("secret_key", secret_key)
        .required("email", email)
        .required("product_id", product_id)
        .optional("order_id", options.order_id.as_deref())
        .optional("version", options.version.as_deref())
        .optional("key_prefix", options.key_prefix.as_deref())
        .required("activations", &options.activations.to_string());

    let result = transport.get(Request::GenerateKey, &params).await;
    record(Request::GenerateKey, product_id, &result);
    result
}

/// Activates a license key for one instance (`activation`).
///
/// `Platform::System` sends the local system-info string;
/// `Platform::Unspecified` sends no platform at all.
pub async fn activate_license(
    transport: &Transport,
    product_id: &str,
    email: &str,
    license_key: &str,
    instance: Option<&str>,
    platform: &Platform,
) -> ApiResult {
    let platform = platform.resolve_async().await;
    let params = QueryParams::new()
        .required("email", email)
        .required("license_key", license_key)
        .required("product_id", product_id)
        .optional("instance", instance)
        .optional("platform", platform.as_deref());

    let result = transport.get(Request::Activation, &params).await;
    record(Request::Activation, license_key, &result);
    result
}

/// Removes every activation of a license key (`activation_reset`).
pub async fn reset_license(
    transport: &Transport,
    product_id: &str,
    email: &str,
    license_key: &str,
) -> ApiResult {
    let params = QueryParams::new()
        .required("email", email)
        .required("license_key", license_key)
        .required("product_id", product_id);

    let result = transport.get(Request::ActivationReset, &params).await;
    record(Request::ActivationReset, license_key, &result);
    result
}

/// Removes one activation, selected by instance and/or activation id (`deactivation`).
pub async fn deactivate_license(
    transport: &Transport,
    product_id: &str,
    email: &str,
    license_key: &str,
    instance: Option<&str>,
    activation_id: Option<&str>,
) -> ApiResult {
    let params = QueryParams::new()
        .required("email", email)
        .required("license_key", license_key)
        .required("product_id", product_id)
        .optional("instance", instance)
        .optional("activation_id", activation_id);

    let result = transport.get(Request::Deactivation, &params).await;
    record(Request::Deactivation, license_key, &result);
    result
}

/// Checks a license key and looks for an activation matching `filter` (`check`).
pub async fn check_license(
    transport: &Transport,
    product_id: &str,
    email: &str,
    license_key: &str,
    filter: &ActivationFilter,
) -> ApiResult {
    let params = QueryParams::new()
        .required("email", email)
        .required("license_key", license_key)
        .required("product_id", product_id);

    let response = transport.get(Request::Check, &params).await;
    let platform = filter.platform.resolve_async().await;
    let result = match_activations(response, &filter.instance, platform.as_deref());
    record(Request::Check, license_key, &result);
    result
}

fn record(request: Request, subject: &str, result: &ApiResult) {
    let event = if !result.success() {
        LicenseEvent::Rejected
    } else {
        match request {
            Request::GenerateKey => LicenseEvent::KeyGenerated,
            Request::Activation => LicenseEvent::Activated,
            Request::ActivationReset => LicenseEvent::Reset,
            Request::Deactivation => LicenseEvent::Deactivated,
            Request::Check => LicenseEvent::Checked,
        }
    };
    let details = result
        .error()
        .map(|e| format!("{request}: {e}"))
        .unwrap_or_else(|| request.to_string());
    log_license_event(event, subject, Some(&details));
}
