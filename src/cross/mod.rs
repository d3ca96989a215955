//! Cross-compilation artifacts.
//!
//! - [`cmake`]: typed CMake script builder shared by every generated file
//! - [`toolchain`]: CMake cross toolchain with sysroot isolation
//! - [`pkgconfig`]: pkg-config wrapper filtering host search paths
//! - [`meson`]: Meson cross file from the architecture table
//!
//! Host probing goes through [`HostTools`] so generation can be tested
//! without a cross compiler installed.

pub mod cmake;
pub mod meson;
pub mod pkgconfig;
pub mod toolchain;

use std::path::PathBuf;
use std::time::Duration;

use crate::util::process::{find_executable, ProcessBuilder};

/// Outcome of asking a compiler for its sysroot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SysrootProbe {
    Found(String),
    /// Compiler missing, failed, or printed nothing
    Missing,
    /// The compiler did not answer within its time budget
    TimedOut,
}

/// Host queries needed to generate cross artifacts.
pub trait HostTools {
    /// Locate a binary on `PATH`.
    fn which(&self, name: &str) -> Option<PathBuf>;

    /// Run `<compiler> --print-sysroot`.
    fn sysroot(&self, compiler: &str) -> SysrootProbe;
}

/// [`HostTools`] backed by the real system.
#[derive(Debug, Clone)]
pub struct SystemTools {
    sysroot_timeout: Duration,
}

impl SystemTools {
    pub fn new(sysroot_timeout: Duration) -> Self {
        SystemTools { sysroot_timeout }
    }
}

impl HostTools for SystemTools {
    fn which(&self, name: &str) -> Option<PathBuf> {
        find_executable(name)
    }

    fn sysroot(&self, compiler: &str) -> SysrootProbe {
        let Some(path) = find_executable(compiler) else {
            tracing::warn!("cross compiler `{}` not found, building without a sysroot", compiler);
            return SysrootProbe::Missing;
        };

        let output = match ProcessBuilder::new(&path)
            .arg("--print-sysroot")
            .exec_with_timeout(self.sysroot_timeout)
        {
            Ok(Some(output)) => output,
            Ok(None) => return SysrootProbe::TimedOut,
            Err(e) => {
                tracing::warn!("{:#}", e);
                return SysrootProbe::Missing;
            }
        };

        let sysroot = String::from_utf8_lossy(&output.stdout).trim().replace('\\', "/");
        if output.status.success() && !sysroot.is_empty() {
            tracing::debug!("{} sysroot: {}", compiler, sysroot);
            SysrootProbe::Found(sysroot)
        } else {
            tracing::warn!("`{} --print-sysroot` gave no sysroot", compiler);
            SysrootProbe::Missing
        }
    }
}
