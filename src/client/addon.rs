//! Object form of the client.
//!
//! [`SoftwareAddOn`] binds the site, the product and optionally an email so
//! that repeated calls only need the license key. Every operation also takes
//! an `email` override; a non-empty override wins over the bound email. When
//! neither is set the call returns a `"No email set"` result without touching
//! the network.

use tracing::debug;

use crate::client::errors::ApiError;
use crate::client::matcher::{ActivationFilter, InstanceFilter, Platform};
use crate::client::operations::{self, GenerateKeyOptions};
use crate::client::request::Transport;
use crate::client::responses::ApiResult;
use crate::config::WooConfig;
use crate::errors::LicenseResult;

/// Optional parameters of [`SoftwareAddOn::activate_license`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateOptions {
    pub instance: Option<String>,
    /// Platform to record; `None` uses the client's activation default
    pub platform: Option<Platform>,
}

/// Optional parameters of [`SoftwareAddOn::deactivate_license`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeactivateOptions {
    pub instance: Option<String>,
    pub activation_id: Option<String>,
}

/// Optional parameters of [`SoftwareAddOn::check_license`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub instance: InstanceFilter,
    /// Platform to match; `None` uses the client's check default
    pub platform: Option<Platform>,
}

/// Client bound to one site and product.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SoftwareAddOn {
    transport: Transport,
    product_id: String,
    email: Option<String>,
    activation_platform: Platform,
    check_platform: Platform,
}

impl SoftwareAddOn {
    /// Client for `https://<host>/woocommerce/`.
    pub fn new(host: &str, product_id: &str, email: Option<&str>) -> LicenseResult<Self> {
        Ok(Self::with_transport(Transport::new(host)?, product_id, email))
    }

    pub fn with_transport(transport: Transport, product_id: &str, email: Option<&str>) -> Self {
        Self {
            transport,
            product_id: product_id.to_string(),
            email: email.filter(|e| !e.is_empty()).map(str::to_string),
            activation_platform: Platform::System,
            check_platform: Platform::System,
        }
    }

    /// Builds a client from [`WooConfig`]. `api.base_url` wins over `api.host`.
    pub fn from_config(config: &WooConfig) -> LicenseResult<Self> {
        config.validate_client()?;

        let api = &config.api;
        let transport = if api.base_url.is_empty() {
            Transport::for_host(&api.host, api.timeout())?
        } else {
            Transport::from_base_url(&api.base_url, api.timeout())?
        };

        Ok(Self::with_transport(transport, &api.product_id, api.email())
            .with_activation_platform(config.platform.activation_platform())
            .with_check_platform(config.platform.check_platform()))
    }

    /// A copy of this client bound to another email.
    pub fn with_email(&self, email: &str) -> Self {
        let mut other = self.clone();
        other.email = Some(email.to_string()).filter(|e| !e.is_empty());
        other
    }

    /// Platform recorded by `activate_license` when the call names none.
    pub fn with_activation_platform(mut self, platform: Platform) -> Self {
        self.activation_platform = platform;
        self
    }

    /// Platform matched by `check_license` when the call names none.
    pub fn with_check_platform(mut self, platform: Platform) -> Self {
        self.check_platform = platform;
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the override, else the bound email, else the local "no email" failure.
    fn require_email<'a>(&'a self, email: Option<&'a str>) -> Result<&'a str, ApiResult> {
        email
            .filter(|e| !e.is_empty())
            .or(self.email.as_deref())
            .ok_or_else(|| {
                debug!(product_id = %self.product_id, "No email set, skipping request");
                ApiResult::local_failure(ApiError::NoEmail)
            })
    }

    /// Generates a new license key for the bound product.
    pub async fn generate_key(
        &self,
        secret_key: &str,
        email: Option<&str>,
        options: &GenerateKeyOptions,
    ) -> ApiResult {
        let email = match self.require_email(email) {
            Ok(email) => email,
            Err(result) => return result,
        };
        operations::generate_key(&self.transport, &self.product_id, email, secret_key, options)
            .await
    }

    pub async fn activate_license(
        &self,
        license_key: &str,
        email: Option<&str>,
        options: &ActivateOptions,
    ) -> ApiResult {
        let email = match self.require_email(email) {
            Ok(email) => email,
            Err(result) => return result,
        };
        let platform = options
            .platform
            .as_ref()
            .unwrap_or(&self.activation_platform);
        operations::activate_license(
            &self.transport,
            &self.product_id,
            email,
            license_key,
            options.instance.as_deref(),
            platform,
        )
        .await
    }

    pub async fn reset_license(&self, license_key: &str, email: Option<&str>) -> ApiResult {
        let email = match self.require_email(email) {
            Ok(email) => email,
            Err(result) => return result,
        };
        operations::reset_license(&self.transport, &self.product_id, email, license_key).await
    }

    pub async fn deactivate_license(
        &self,
        license_key: &str,
        email: Option<&str>,
        options: &DeactivateOptions,
    ) -> ApiResult {
        let email = match self.require_email(email) {
            Ok(email) => email,
            Err(result) => return result,
        };
        operations::deactivate_license(
            &self.transport,
            &self.product_id,
            email,
            license_key,
            options.instance.as_deref(),
            options.activation_id.as_deref(),
        )
        .await
    }

    pub async fn check_license(
        &self,
        license_key: &str,
        email: Option<&str>,
        options: &CheckOptions,
    ) -> ApiResult {
        let email = match self.require_email(email) {
            Ok(email) => email,
            Err(result) => return result,
        };
        let filter = ActivationFilter {
            instance: options.instance.clone(),
            platform: options
                .platform
                .clone()
                .unwrap_or_else(|| self.check_platform.clone()),
        };
        operations::check_license(&self.transport, &self.product_id, email, license_key, &filter)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addon(email: Option<&str>) -> SoftwareAddOn {
        SoftwareAddOn::new("shop.example.com", "PRODUCT", email).unwrap()
    }

    #[test]
    fn empty_email_is_no_email() {
        assert_eq!(addon(Some("")).email(), None);
        assert_eq!(addon(None).with_email("").email(), None);
    }

    #[test]
    fn with_email_leaves_original_untouched() {
        let original = addon(None);
        let bound = original.with_email("me@example.com");
        assert_eq!(original.email(), None);
        assert_eq!(bound.email(), Some("me@example.com"));
        assert_eq!(bound.product_id(), "PRODUCT");
    }

    #[test]
    fn from_config_prefers_base_url() {
        let mut config = WooConfig::default();
        config.api.host = "shop.example.com".to_string();
        config.api.base_url = "http://127.0.0.1:9000".to_string();
        config.api.product_id = "PRODUCT".to_string();
        config.platform.check = "none".to_string();

        let addon = SoftwareAddOn::from_config(&config).unwrap();
        assert_eq!(
            addon.transport().endpoint().as_str(),
            "http://127.0.0.1:9000/woocommerce/"
        );
        assert_eq!(addon.check_platform, Platform::Unspecified);
        assert_eq!(addon.activation_platform, Platform::System);
        assert_eq!(addon.email(), None);
    }

    #[test]
    fn from_config_requires_product() {
        let mut config = WooConfig::default();
        config.api.host = "shop.example.com".to_string();
        assert!(SoftwareAddOn::from_config(&config).is_err());
    }

    #[test]
    fn override_email_wins_over_bound() {
        let bound = addon(Some("bound@example.com"));
        assert_eq!(
            bound.require_email(Some("other@example.com")).ok(),
            Some("other@example.com")
        );
        assert_eq!(bound.require_email(Some("")).ok(), Some("bound@example.com"));
        assert_eq!(bound.require_email(None).ok(), Some("bound@example.com"));
        assert_eq!(
            addon(None).require_email(Some("other@example.com")).ok(),
            Some("other@example.com")
        );
        assert!(addon(None).require_email(Some("")).is_err());
    }

    #[tokio::test]
    async fn no_email_short_circuits() {
        let result = addon(None).reset_license("KEY", None).await;
        assert!(!result.success());
        assert_eq!(result.code(), None);
        assert_eq!(result.error(), Some(&ApiError::NoEmail));
        assert_eq!(result.error_message(), "No email set");
    }
}
