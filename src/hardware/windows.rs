use std::process::Command;

/// `ProcessorNameString` of the first CPU, e.g. `Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz`.
pub fn cpu_models() -> Vec<String> {
    query_registry(
        r"HKEY_LOCAL_MACHINE\HARDWARE\DESCRIPTION\System\CentralProcessor\0",
        "ProcessorNameString",
    )
    .into_iter()
    .collect()
}

/// `MachineGuid` from the cryptography registry key.
pub fn machine_id() -> Option<String> {
    query_registry(
        r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Cryptography",
        "MachineGuid",
    )
}

fn query_registry(key: &str, name: &str) -> Option<String> {
    Command::new("reg")
        .args(["query", key, "/v", name])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .and_then(|output| reg_value(&output, name))
}

/// Extracts the string data of `name` from `reg query` output.
///
/// Lines look like `    ProcessorNameString    REG_SZ    Intel(R) Core(TM) ...`;
/// the data may itself contain spaces.
fn reg_value(output: &str, name: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix(name))
        .find_map(|rest| rest.trim_start().strip_prefix("REG_SZ"))
        .map(|data| data.trim().to_string())
        .filter(|data| !data.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_name_keeps_inner_spaces() {
        let output = "\r\nHKEY_LOCAL_MACHINE\\HARDWARE\\DESCRIPTION\\System\\CentralProcessor\\0\r\n    \
                      ProcessorNameString    REG_SZ    Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz\r\n\r\n";
        assert_eq!(
            reg_value(output, "ProcessorNameString").as_deref(),
            Some("Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz")
        );
    }

    #[test]
    fn machine_guid_is_read() {
        let output = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Cryptography\r\n    \
                      MachineGuid    REG_SZ    0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0\r\n";
        assert_eq!(
            reg_value(output, "MachineGuid").as_deref(),
            Some("0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0")
        );
    }

    #[test]
    fn missing_value_is_none() {
        let output = "ERROR: The system was unable to find the specified registry key or value.";
        assert_eq!(reg_value(output, "ProcessorNameString"), None);
        assert_eq!(reg_value("    MachineGuid    REG_SZ    ", "MachineGuid"), None);
    }
}
