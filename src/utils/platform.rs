use serde::{Deserialize, Serialize};
use std::env;
use std::process::Command;

/// Machine the benchmark ran on. Frame timing is measured here, so the host
/// matters as much as the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub os_name: String,
    pub os_version: String,
    pub arch: String,
    pub hostname: String,
    pub cpu_cores: usize,
    pub memory_mb: u64,
    pub tool_version: String,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self {
            os_name: env::consts::OS.to_string(),
            os_version: Self::detect_os_version(),
            arch: env::consts::ARCH.to_string(),
            hostname: Self::detect_hostname(),
            cpu_cores: num_cpus::get(),
            memory_mb: Self::detect_memory(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn detect_os_version() -> String {
        // Simple detection using uname -r
        if let Ok(output) = Command::new("uname").arg("-r").output() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            "Unknown".to_string()
        }
    }

    fn detect_hostname() -> String {
        if let Ok(name) = env::var("HOSTNAME").or_else(|_| env::var("COMPUTERNAME")) {
            return name;
        }
        if let Ok(output) = Command::new("hostname").output() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
        "unknown".to_string()
    }

    fn detect_memory() -> u64 {
        if cfg!(target_os = "macos") {
            if let Ok(output) = Command::new("sysctl").arg("-n").arg("hw.memsize").output() {
                let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if let Ok(bytes) = s.parse::<u64>() {
                    return bytes / (1024 * 1024);
                }
            }
        }
        if cfg!(target_os = "linux") {
            if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
                return Self::parse_meminfo(&meminfo).unwrap_or(0);
            }
        }
        0
    }

    /// `MemTotal:  16384256 kB` -> MB
    fn parse_meminfo(meminfo: &str) -> Option<u64> {
        let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
        let kb = line.split_whitespace().nth(1)?.parse::<u64>().ok()?;
        Some(kb / 1024)
    }
}
