use std::fs;

/// Reads the `model name` entries of `/proc/cpuinfo`.
pub fn cpu_models() -> Vec<String> {
    fs::read_to_string("/proc/cpuinfo")
        .map(|content| parse_cpuinfo(&content))
        .unwrap_or_default()
}

/// Reads the D-Bus machine id, falling back to the legacy location.
pub fn machine_id() -> Option<String> {
    fs::read_to_string("/etc/machine-id")
        .or_else(|_| fs::read_to_string("/var/lib/dbus/machine-id"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_cpuinfo(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            (key.trim() == "model name").then(|| value.trim().to_string())
        })
        .collect()
}
