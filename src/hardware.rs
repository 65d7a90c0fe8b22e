//! Local system identification.
//!
//! The add-on records a free-form `platform` string with every activation.
//! When the caller does not name a platform, this crate sends (and later
//! matches against) a string derived from the local machine:
//!
//! ```text
//! <hostname> <os> [<cpu model>, <cpu model>, ...] <machine id hash>
//! ```
//!
//! The string is computed once per process and reused afterwards.

use sha2::{Digest, Sha256};
use std::env;
use std::sync::OnceLock;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform;
#[cfg(target_os = "macos")]
use macos as platform;
#[cfg(target_os = "windows")]
use windows as platform;

static SYSTEM_INFO: OnceLock<String> = OnceLock::new();

/// Placeholder used when the machine identifier cannot be read.
const UNKNOWN: &str = "unknown";

/// Raw components of the system-info string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// Host name of the machine.
    pub hostname: String,
    /// Operating system name (`linux`, `macos`, `windows`, ...).
    pub os_name: String,
    /// Distinct CPU model names, in the order the OS reports them.
    pub cpu_models: Vec<String>,
    /// SHA-256 of the OS machine identifier, hex encoded.
    pub machine_id: Option<String>,
}

impl SystemInfo {
    /// Collects information about the current machine.
    ///
    /// This shells out or reads files on some platforms; prefer
    /// [`get_system_info`] which caches the result.
    pub fn collect() -> Self {
        Self {
            hostname: get_hostname(),
            os_name: env::consts::OS.to_string(),
            cpu_models: dedup_models(cpu_models()),
            machine_id: machine_id().map(|raw| hash_machine_id(&raw)),
        }
    }

    /// Renders the single-line identifier sent as `platform`.
    pub fn identifier(&self) -> String {
        format!(
            "{} {} [{}] {}",
            self.hostname,
            self.os_name,
            self.cpu_models.join(", "),
            self.machine_id.as_deref().unwrap_or(UNKNOWN)
        )
    }
}

/// Returns the process-wide system-info string, computing it on first use.
pub fn get_system_info() -> &'static str {
    SYSTEM_INFO.get_or_init(|| {
        let info = SystemInfo::collect().identifier();
        tracing::debug!(system_info = %info, "Computed system info");
        info
    })
}

/// Async variant of [`get_system_info`].
///
/// The first computation runs on the blocking pool so that it never stalls
/// the caller's executor thread.
pub async fn system_info() -> &'static str {
    if let Some(info) = SYSTEM_INFO.get() {
        return info;
    }

    tokio::task::spawn_blocking(get_system_info)
        .await
        .unwrap_or_else(|_| get_system_info())
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn hash_machine_id(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.trim().as_bytes()))
}

/// Removes duplicate model names while keeping first-seen order.
fn dedup_models(models: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(models.len());
    for model in models {
        let model = model.trim().to_string();
        if !model.is_empty() && !seen.contains(&model) {
            seen.push(model);
        }
    }
    seen
}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn cpu_models() -> Vec<String> {
    platform::cpu_models()
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn cpu_models() -> Vec<String> {
    Vec::new()
}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn machine_id() -> Option<String> {
    platform::machine_id()
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn machine_id() -> Option<String> {
    None
}
