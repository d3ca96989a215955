//! Host system probing.

use std::path::Path;

use crate::core::arch;
use crate::core::target::{normalize_platform, Libc};
use crate::util::process::{find_executable, ProcessBuilder};

/// Facts about the machine crossport runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub machine: String,
    pub libc: Libc,
    pub platform: String,
}

impl HostInfo {
    /// Probe the running host.
    pub fn detect() -> Self {
        HostInfo {
            machine: arch::normalize_machine(std::env::consts::ARCH),
            libc: detect_libc(),
            platform: normalize_platform(std::env::consts::OS),
        }
    }
}

/// Probe the host libc by asking `ldd --version`; gnu unless musl says so.
pub fn detect_libc() -> Libc {
    match ProcessBuilder::new("ldd").arg("--version").exec() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
            let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
            if stdout.contains("musl") || stderr.contains("musl") {
                Libc::Musl
            } else {
                Libc::Gnu
            }
        }
        Err(e) => {
            tracing::debug!("could not run ldd, assuming gnu libc: {}", e);
            Libc::Gnu
        }
    }
}

/// Package managers in detection order, with the binaries that identify them.
const PACKAGE_MANAGERS: &[(&str, &[&str])] = &[
    ("apt", &["apt", "apt-get"]),
    ("pacman", &["pacman"]),
    ("dnf", &["dnf"]),
    ("yum", &["yum"]),
    ("zypper", &["zypper"]),
    ("apk", &["apk"]),
    ("emerge", &["emerge"]),
    ("xbps", &["xbps-install"]),
    ("swupd", &["swupd"]),
    ("nix", &["nix-env"]),
];

/// Distribution marker files, checked when no package manager binary is found.
const RELEASE_MARKERS: &[(&str, &str)] = &[
    ("/etc/debian_version", "apt"),
    ("/etc/arch-release", "pacman"),
    ("/etc/fedora-release", "dnf"),
    ("/etc/redhat-release", "yum"),
    ("/etc/SuSE-release", "zypper"),
    ("/etc/SUSE-brand", "zypper"),
    ("/etc/alpine-release", "apk"),
    ("/etc/gentoo-release", "emerge"),
];

/// Detect the host distribution's package manager.
pub fn detect_package_manager() -> Option<String> {
    detect_package_manager_with(|bin| find_executable(bin).is_some(), |p| p.exists())
}

/// Detection with injectable probes.
pub fn detect_package_manager_with<W, E>(has_binary: W, exists: E) -> Option<String>
where
    W: Fn(&str) -> bool,
    E: Fn(&Path) -> bool,
{
    for (name, binaries) in PACKAGE_MANAGERS {
        if binaries.iter().any(|bin| has_binary(bin)) {
            return Some(name.to_string());
        }
    }

    RELEASE_MARKERS
        .iter()
        .find(|(marker, _)| exists(Path::new(marker)))
        .map(|(_, name)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prefers_binaries_in_order() {
        let found = detect_package_manager_with(|bin| bin == "apk" || bin == "pacman", |_| false);
        assert_eq!(found.as_deref(), Some("pacman"));
    }

    #[test]
    fn test_detect_falls_back_to_markers() {
        let found = detect_package_manager_with(
            |_| false,
            |p| p == Path::new("/etc/alpine-release"),
        );
        assert_eq!(found.as_deref(), Some("apk"));
    }

    #[test]
    fn test_detect_nothing() {
        assert!(detect_package_manager_with(|_| false, |_| false).is_none());
    }

    #[test]
    fn test_host_detect_normalizes_machine() {
        let host = HostInfo::detect();
        assert!(!host.machine.is_empty());
        assert_ne!(host.machine, "aarch64");
        assert_ne!(host.machine, "amd64");
    }
}
