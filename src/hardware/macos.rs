use std::process::Command;

pub fn cpu_models() -> Vec<String> {
    Command::new("sysctl")
        .args(["-n", "machdep.cpu.brand_string"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| vec![s.trim().to_string()])
        .unwrap_or_default()
}

/// Hardware UUID from the platform expert device.
pub fn machine_id() -> Option<String> {
    Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .and_then(|output| {
            output
                .lines()
                .find(|l| l.contains("IOPlatformUUID"))
                .and_then(|l| l.split('"').nth(3))
                .map(String::from)
        })
}
