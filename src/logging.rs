//! Logging helpers.
//!
//! The crate emits `tracing` events and never installs a subscriber on its
//! own. Applications without a subscriber can call [`init_logging`].
//!
//! License keys are never logged in full; see [`mask_key`].

use std::str::FromStr;
use tracing::{info, info_span, warn, Level};

use crate::config::LoggingConfig;

/// License state change event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseEvent {
    /// A license key was generated
    KeyGenerated,
    /// A license key was activated for an instance
    Activated,
    /// An activation was removed
    Deactivated,
    /// All activations of a key were reset
    Reset,
    /// A check found a matching activation
    Checked,
    /// The add-on or the matcher refused the operation
    Rejected,
}

impl std::fmt::Display for LicenseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LicenseEvent::KeyGenerated => "key_generated",
            LicenseEvent::Activated => "activated",
            LicenseEvent::Deactivated => "deactivated",
            LicenseEvent::Reset => "reset",
            LicenseEvent::Checked => "checked",
            LicenseEvent::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// Log a license state change event.
///
/// # Arguments
///
/// * `event` - The type of license event
/// * `subject` - License key (masked before logging) or product id
/// * `details` - Optional additional details about the event
pub fn log_license_event(event: LicenseEvent, subject: &str, details: Option<&str>) {
    let span = info_span!(
        "license_event",
        event = %event,
        subject = %mask_key(subject),
    );
    let _enter = span.enter();

    match event {
        LicenseEvent::Rejected => {
            if let Some(d) = details {
                warn!(reason = %d, "License event occurred");
            } else {
                warn!("License event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(details = %d, "License event occurred");
            } else {
                info!("License event occurred");
            }
        }
    }
}

/// Hides all but the last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Install a `tracing-subscriber` fmt subscriber when logging is enabled.
///
/// Returns `true` if a subscriber was installed by this call. Returns `false`
/// when logging is disabled or another global subscriber already exists.
pub fn init_logging(config: &LoggingConfig) -> bool {
    if !config.enabled {
        return false;
    }

    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}
