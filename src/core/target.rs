//! Build target selection.
//!
//! A [`BuildTarget`] is the (machine, libc, compiler, platform, linkage, mode)
//! combination one invocation resolves packages for, together with the host
//! facts needed to tell whether the build is a cross build.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::core::arch;
use crate::core::host::HostInfo;

/// C library flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Libc {
    #[default]
    Gnu,
    Musl,
}

/// Compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compiler {
    #[default]
    Gcc,
    Clang,
    /// Emscripten
    Em,
    Mingw,
    Zig,
}

/// Library linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Linkage {
    Static,
    #[default]
    Dynamic,
}

/// Invalid target selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("unknown libc: `{0}` (expected gnu or musl)")]
    UnknownLibc(String),

    #[error("compiler `{0}` is not supported (expected gcc, clang, em, mingw or zig)")]
    UnknownCompiler(String),

    #[error("unknown linkage: `{0}` (expected static or dynamic)")]
    UnknownLinkage(String),

    #[error("unknown architecture width: `{0}` (expected 32 or 64)")]
    UnknownWidth(String),

    #[error("cannot use a 32 bits architecture with 64 bits machine: `{machine}`")]
    WidthMismatch { machine: String },

    #[error("mode `{mode}` unknown (available: {})", available.join(", "))]
    UnknownMode { mode: String, available: Vec<String> },
}

impl Libc {
    pub fn as_str(&self) -> &'static str {
        match self {
            Libc::Gnu => "gnu",
            Libc::Musl => "musl",
        }
    }
}

impl FromStr for Libc {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gnu" => Ok(Libc::Gnu),
            "musl" => Ok(Libc::Musl),
            _ => Err(TargetError::UnknownLibc(s.to_string())),
        }
    }
}

impl fmt::Display for Libc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Compiler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
            Compiler::Em => "em",
            Compiler::Mingw => "mingw",
            Compiler::Zig => "zig",
        }
    }
}

impl FromStr for Compiler {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            "em" => Ok(Compiler::Em),
            "mingw" => Ok(Compiler::Mingw),
            "zig" => Ok(Compiler::Zig),
            _ => Err(TargetError::UnknownCompiler(s.to_string())),
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Linkage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Linkage::Static => "static",
            Linkage::Dynamic => "dynamic",
        }
    }
}

impl FromStr for Linkage {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static" => Ok(Linkage::Static),
            "dynamic" => Ok(Linkage::Dynamic),
            _ => Err(TargetError::UnknownLinkage(s.to_string())),
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default build mode when none is requested.
pub const DEFAULT_MODE: &str = "debug";

/// Raw target selection from flags and tool config; every field optional.
#[derive(Debug, Clone, Default)]
pub struct TargetRequest {
    pub machine: Option<String>,
    /// `32` or `64`
    pub arch: Option<String>,
    pub libc: Option<String>,
    pub compiler: Option<String>,
    pub platform: Option<String>,
    pub static_libs: bool,
    pub mode: Option<String>,
}

/// The resolved build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Canonical machine key (see [`arch`])
    pub machine: String,
    pub libc: Libc,
    pub compiler: Compiler,
    pub platform: String,
    pub linkage: Linkage,
    pub mode: String,
    pub host_machine: String,
    pub host_libc: Libc,
}

impl BuildTarget {
    /// Resolve a request against the host.
    ///
    /// Compiler and platform imply each other: `windows` selects mingw and
    /// `web` selects emscripten, and vice versa.
    pub fn resolve(request: &TargetRequest, host: &HostInfo) -> Result<Self, TargetError> {
        let libc = match &request.libc {
            Some(libc) => libc.parse()?,
            None => Libc::Gnu,
        };

        let machine = resolve_machine(request, &host.machine)?;

        let mut platform = normalize_platform(request.platform.as_deref().unwrap_or(&host.platform));
        let mut compiler = match &request.compiler {
            Some(compiler) => compiler.parse()?,
            None => Compiler::Gcc,
        };
        match platform.as_str() {
            "windows" => compiler = Compiler::Mingw,
            "web" => compiler = Compiler::Em,
            _ => {}
        }
        match compiler {
            Compiler::Mingw => platform = "windows".to_string(),
            Compiler::Em => platform = "web".to_string(),
            _ => {}
        }

        Ok(BuildTarget {
            machine,
            libc,
            compiler,
            platform,
            linkage: if request.static_libs {
                Linkage::Static
            } else {
                Linkage::Dynamic
            },
            mode: request
                .mode
                .as_deref()
                .unwrap_or(DEFAULT_MODE)
                .to_lowercase(),
            host_machine: arch::normalize_machine(&host.machine),
            host_libc: host.libc,
        })
    }

    /// Check the selection and apply forced adjustments.
    ///
    /// Returns a warning per adjustment made.
    pub fn validate(&mut self, modes: &[String]) -> Result<Vec<String>, TargetError> {
        if !modes.is_empty() && !modes.iter().any(|m| *m == self.mode) {
            return Err(TargetError::UnknownMode {
                mode: self.mode.clone(),
                available: modes.to_vec(),
            });
        }

        let mut warnings = Vec::new();

        if self.compiler == Compiler::Zig && self.libc != Libc::Musl {
            warnings.push("gnu libc is not supported with zig, switching to musl".to_string());
            self.libc = Libc::Musl;
        }

        if matches!(self.compiler, Compiler::Mingw | Compiler::Em) && self.linkage != Linkage::Static
        {
            warnings.push(format!(
                "{} requires static libs, switching to static libs",
                self.compiler
            ));
            self.linkage = Linkage::Static;
        }

        Ok(warnings)
    }

    /// Whether the target differs from the host in machine or libc.
    pub fn is_cross_building(&self) -> bool {
        self.host_machine != self.machine || self.host_libc != self.libc
    }

    /// Cross building for a linux platform.
    pub fn is_cross_linux(&self) -> bool {
        self.is_cross_building() && self.platform == "linux"
    }

    /// `build/<platform>-<machine>/<compiler>/<mode>` under the project root.
    pub fn build_dir(&self, root: &Path) -> PathBuf {
        root.join("build")
            .join(format!("{}-{}", self.platform, self.machine))
            .join(self.compiler.as_str())
            .join(&self.mode)
    }

    /// Where the installed package tree is linked for the build.
    pub fn extlib_dir(&self, root: &Path) -> PathBuf {
        self.build_dir(root).join("extlib")
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "platform={} compiler={} machine={} libc={} linkage={} mode={}",
            self.platform, self.compiler, self.machine, self.libc, self.linkage, self.mode
        )
    }
}

/// Lowercase a platform name; anything containing "win" is windows.
pub fn normalize_platform(platform: &str) -> String {
    let lower = platform.to_lowercase();
    if lower.contains("win") && lower != "darwin" {
        "windows".to_string()
    } else {
        lower
    }
}

fn resolve_machine(request: &TargetRequest, host_machine: &str) -> Result<String, TargetError> {
    let width = request.arch.as_deref();
    if let Some(width) = width {
        if width != "32" && width != "64" {
            return Err(TargetError::UnknownWidth(width.to_string()));
        }
    }

    let machine = match &request.machine {
        Some(machine) => {
            if width == Some("32") && machine.contains("64") {
                return Err(TargetError::WidthMismatch {
                    machine: machine.clone(),
                });
            }
            arch::normalize_machine(machine)
        }
        None => arch::normalize_machine(host_machine),
    };

    if width == Some("32") {
        Ok(arch::to_32bit(&machine))
    } else {
        Ok(machine)
    }
}
