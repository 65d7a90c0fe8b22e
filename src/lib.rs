//! woo-software - client for the WooCommerce Software Add-on licensing API
//!
//! The add-on exposes five operations on
//! `https://<host>/woocommerce/?wc-api=software-api&request=<op>`:
//! `generate_key`, `activation`, `activation_reset`, `deactivation` and
//! `check`. This crate builds those requests and normalizes every outcome
//! (network failure, HTTP status, malformed body, add-on error) into one
//! [`ApiResult`] shape. For `check` it also looks for an activation matching
//! a given instance and platform.
//!
//! # Features
//!
//! - `rustls-tls` - rustls TLS backend. Enabled by default.
//! - `native-tls` - the platform's native TLS backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use woo_software::{CheckOptions, SoftwareAddOn};
//!
//! # async fn run() -> woo_software::errors::LicenseResult<()> {
//! let addon = SoftwareAddOn::new("shop.example.com", "MY-PRODUCT", Some("me@example.com"))?;
//!
//! let options = CheckOptions {
//!     instance: 1_700_000_000u64.into(),
//!     ..Default::default()
//! };
//! let result = addon.check_license("LICENSE-KEY", None, &options).await;
//! if result.success() {
//!     println!("licensed");
//! } else {
//!     println!("not licensed: {}", result.error_message());
//! }
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod hardware;
pub mod logging;

// Client modules
pub mod client {
    pub mod addon;
    pub mod errors;
    pub mod matcher;
    pub mod operations;
    pub mod request;
    pub mod responses;
}

pub use client::addon::{ActivateOptions, CheckOptions, DeactivateOptions, SoftwareAddOn};
pub use client::errors::{ApiError, RemoteError, RemoteErrorCode};
pub use client::matcher::{ActivationFilter, InstanceFilter, Platform};
pub use client::operations::GenerateKeyOptions;
pub use client::request::Transport;
pub use client::responses::{Activation, ApiResult, CheckResponse, Output, NO_ERROR};
