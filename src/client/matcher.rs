//! Activation matching for the `check` operation.
//!
//! A `check` only tells whether the key exists; the caller usually also wants
//! to know whether *this* installation is among the key's activations. An
//! activation matches when both filters hold:
//!
//! - instance: [`InstanceFilter::Any`], or the record's `instance` equals the
//!   requested one as a string;
//! - platform: the record has no platform (empty string), the caller disabled
//!   the platform filter, or the record's platform equals the requested one.
//!
//! The first match in server order wins.

use std::fmt;

use crate::client::errors::{ApiError, RemoteError};
use crate::client::responses::{Activation, ApiResult, CheckResponse};
use crate::hardware::{get_system_info, system_info};

/// Which instance to look for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InstanceFilter {
    /// Ignore the instance of each activation.
    #[default]
    Any,
    /// Only activations with exactly this instance.
    Exact(String),
}

/// `0` is the "ignore instance" sentinel; any other number is compared as
/// its decimal string.
impl From<u64> for InstanceFilter {
    fn from(instance: u64) -> Self {
        match instance {
            0 => InstanceFilter::Any,
            n => InstanceFilter::Exact(n.to_string()),
        }
    }
}

impl From<&str> for InstanceFilter {
    fn from(instance: &str) -> Self {
        InstanceFilter::Exact(instance.to_string())
    }
}

impl From<String> for InstanceFilter {
    fn from(instance: String) -> Self {
        InstanceFilter::Exact(instance)
    }
}

impl fmt::Display for InstanceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceFilter::Any => f.write_str("0"),
            InstanceFilter::Exact(instance) => f.write_str(instance),
        }
    }
}

/// Platform sent on activation and matched on check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Platform {
    /// Send no platform / do not filter on platform.
    Unspecified,
    /// The local system-info string (see [`crate::hardware`]).
    #[default]
    System,
    /// A caller-chosen platform name.
    Named(String),
}

impl Platform {
    /// Parses a configuration value: `system`, `none` (or empty), or a literal name.
    pub fn from_setting(setting: &str) -> Self {
        match setting.trim() {
            "" | "none" => Platform::Unspecified,
            "system" => Platform::System,
            name => Platform::Named(name.to_string()),
        }
    }

    /// The concrete platform string, `None` when unspecified.
    pub fn resolve(&self) -> Option<String> {
        match self {
            Platform::Unspecified => None,
            Platform::System => Some(get_system_info().to_string()),
            Platform::Named(name) => Some(name.clone()),
        }
    }

    /// Like [`Platform::resolve`], computing the system info off the executor.
    pub async fn resolve_async(&self) -> Option<String> {
        match self {
            Platform::System => Some(system_info().await.to_string()),
            other => other.resolve(),
        }
    }
}

/// An empty name disables the platform filter.
impl From<&str> for Platform {
    fn from(platform: &str) -> Self {
        if platform.is_empty() {
            Platform::Unspecified
        } else {
            Platform::Named(platform.to_string())
        }
    }
}

impl From<String> for Platform {
    fn from(platform: String) -> Self {
        Platform::from(platform.as_str())
    }
}

/// Instance and platform to look for among a key's activations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivationFilter {
    pub instance: InstanceFilter,
    pub platform: Platform,
}

impl ActivationFilter {
    pub fn new(instance: impl Into<InstanceFilter>, platform: impl Into<Platform>) -> Self {
        Self {
            instance: instance.into(),
            platform: platform.into(),
        }
    }

    /// Matches any activation at all.
    pub fn any() -> Self {
        Self {
            instance: InstanceFilter::Any,
            platform: Platform::Unspecified,
        }
    }
}

/// Returns the first activation satisfying both filters.
///
/// `platform` is the resolved platform string; `None` disables the filter.
pub fn find_activation<'a>(
    activations: &'a [Activation],
    instance: &InstanceFilter,
    platform: Option<&str>,
) -> Option<&'a Activation> {
    activations.iter().find(|activation| {
        let instance_ok = match instance {
            InstanceFilter::Any => true,
            InstanceFilter::Exact(wanted) => activation.instance == *wanted,
        };
        let platform_ok = activation.activation_platform.is_empty()
            || platform.map_or(true, |wanted| activation.activation_platform == wanted);
        instance_ok && platform_ok
    })
}

/// Applies the matcher to the result of a `check` request.
///
/// Failed results pass through untouched; successful ones are downgraded when
/// the key has no activations or none of them matches.
pub fn match_activations(
    result: ApiResult,
    instance: &InstanceFilter,
    platform: Option<&str>,
) -> ApiResult {
    if !result.success() {
        return result;
    }

    let Some(value) = result.json_output() else {
        return result.fail_with(ApiError::InvalidJson("empty check response".to_string()));
    };

    let check = match CheckResponse::from_value(value) {
        Ok(CheckResponse::Success(check)) => check,
        Ok(CheckResponse::Failed(failed)) => {
            let remote = RemoteError::new(failed.code, failed.error);
            return result.fail_with(ApiError::Remote(remote));
        }
        Err(e) => return result.fail_with(ApiError::InvalidJson(e.to_string())),
    };

    if check.activations.is_empty() {
        return result.fail_with(ApiError::NotActivated);
    }

    if find_activation(&check.activations, instance, platform).is_none() {
        return result.fail_with(ApiError::NoMatch {
            instance: instance.to_string(),
            platform: platform.unwrap_or_default().to_string(),
        });
    }

    result
}
