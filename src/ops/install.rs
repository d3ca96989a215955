//! Install orchestration.
//!
//! One run is:
//!
//! ```text
//! overlays -> [foundation manifest -> install] -> full manifest -> install -> link extlib
//! ```
//!
//! The bracketed phase only runs for cross-linux builds that need the display
//! foundation and do not have it installed yet. A failed install aborts the
//! run with the engine's exit code; nothing is retried.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::app::AppConfig;
use crate::core::target::BuildTarget;
use crate::cross::toolchain::generate_cross_toolchain;
use crate::cross::{pkgconfig, HostTools};
use crate::ops::extlibs::ExternalLibraries;
use crate::resolver::BuildPlan;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{ensure_dir, replace_link, slash_path};
use crate::util::process::ProcessBuilder;
use crate::vcpkg::manifest::{Manifest, ManifestBuilder};
use crate::vcpkg::overlay::{build_host_overlay, build_overlay, write_overlays};
use crate::vcpkg::triplet::Triplet;
use crate::vcpkg::VcpkgLayout;

/// Link names that imply the display foundation is needed.
pub const DISPLAY_LIBS: &[&str] = &["glfw", "glfw3", "SDL3", "GL", "GLEW", "X11", "wayland-client"];

/// Installed files proving the foundation is already present.
const FOUNDATION_SENTINELS: &[&str] = &["libX11.so", "libwayland-client.so"];

/// Fatal packaging-engine failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("`{tool}` {}", describe_failure(.code, .timed_out))]
    ExternalToolFailure {
        tool: String,
        code: Option<i32>,
        timed_out: bool,
    },

    #[error("cross-linux phase 1 failed with exit code {code}")]
    FoundationInstallFailure { code: i32 },

    #[error("vcpkg not found at {}", path.display())]
    MissingEngine { path: PathBuf },
}

fn describe_failure(code: &Option<i32>, timed_out: &bool) -> String {
    match (*timed_out, *code) {
        (true, _) => "timed out".to_string(),
        (false, Some(code)) => format!("failed with exit code {}", code),
        (false, None) => "was terminated by a signal".to_string(),
    }
}

impl InstallError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            InstallError::ExternalToolFailure { tool, .. } => Diagnostic::error(self.to_string())
                .with_context(format!("while running {}", tool))
                .with_suggestion(suggestions::INSTALL_FAILED),
            InstallError::FoundationInstallFailure { .. } => Diagnostic::error(self.to_string())
                .with_context("the X11/Wayland foundation packages could not be installed")
                .with_context("the full manifest was not written")
                .with_suggestion(suggestions::INSTALL_FAILED),
            InstallError::MissingEngine { path } => {
                Diagnostic::error(format!("VCPKG path does not exist: {}", path.display()))
                    .with_suggestion(suggestions::DEPLOY_VCPKG)
            }
        }
    }

    /// Process exit code for this failure: the engine's own when it has one.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::ExternalToolFailure { code: Some(code), .. } if *code != 0 => *code,
            InstallError::FoundationInstallFailure { code } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// One packaging-engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: PathBuf,
    pub timeout: Option<Duration>,
}

/// How an engine invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    Exited(i32),
    TimedOut,
}

/// The packaging engine as seen by the orchestrator.
pub trait PackageEngine {
    /// Display name used in errors.
    fn name(&self) -> String;

    /// Fail with [`InstallError::MissingEngine`] when the engine is not deployed.
    fn check(&self) -> Result<()>;

    fn run(&self, command: &EngineCommand) -> Result<EngineOutcome>;
}

/// The real vcpkg binary.
#[derive(Debug, Clone)]
pub struct VcpkgEngine {
    binary: PathBuf,
}

impl VcpkgEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        VcpkgEngine {
            binary: binary.into(),
        }
    }
}

impl PackageEngine for VcpkgEngine {
    fn name(&self) -> String {
        self.binary.display().to_string()
    }

    fn check(&self) -> Result<()> {
        if self.binary.exists() {
            Ok(())
        } else {
            Err(InstallError::MissingEngine {
                path: self.binary.clone(),
            }
            .into())
        }
    }

    fn run(&self, command: &EngineCommand) -> Result<EngineOutcome> {
        ensure_dir(&command.cwd)?;
        let process = ProcessBuilder::new(&self.binary)
            .args(&command.args)
            .envs(&command.env)
            .cwd(&command.cwd);
        tracing::debug!(
            "executing '{}' in '{}'",
            process.display_command(),
            command.cwd.display()
        );

        match process.status_with_timeout(command.timeout)? {
            // A signal-terminated child has no code.
            Some(status) => Ok(EngineOutcome::Exited(status.code().unwrap_or(-1))),
            None => Ok(EngineOutcome::TimedOut),
        }
    }
}

/// Whether the display foundation is needed.
///
/// True when `x11=1` or `wayland=1` is set, or when any module links a display
/// library under `libs`, `<platform>-libs`, `<platform>-cross-libs`,
/// `<platform>-native-libs`, `cross-libs` or `native-libs`.
pub fn needs_display_foundation<F>(
    plan: &BuildPlan,
    platform: &str,
    extra_display_libs: &[String],
    env: F,
) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    if ["x11", "wayland"]
        .iter()
        .any(|var| env(var).is_some_and(|v| v == "1"))
    {
        return true;
    }

    let keys = [
        "libs".to_string(),
        format!("{}-libs", platform),
        format!("{}-cross-libs", platform),
        format!("{}-native-libs", platform),
        "cross-libs".to_string(),
        "native-libs".to_string(),
    ];
    let is_display = |lib: &String| {
        DISPLAY_LIBS.contains(&lib.as_str()) || extra_display_libs.contains(lib)
    };

    plan.modules()
        .values()
        .any(|module| keys.iter().any(|key| module.list(key).iter().any(is_display)))
}

/// Everything an install run needs.
pub struct InstallOrchestrator<'a> {
    pub app: &'a AppConfig,
    pub target: &'a BuildTarget,
    pub layout: &'a VcpkgLayout,
    pub triplet: &'a Triplet,
    pub libraries: &'a ExternalLibraries,
    pub needs_display: bool,
    pub seconds_per_library: u64,
    /// Binary cache exported in the environment or set in the tool config
    pub binary_cache: Option<PathBuf>,
    pub engine: &'a dyn PackageEngine,
    pub tools: &'a dyn HostTools,
}

impl InstallOrchestrator<'_> {
    fn manifests(&self) -> ManifestBuilder {
        ManifestBuilder::new(self.app, self.target)
    }

    /// The full manifest for this run.
    pub fn full_manifest(&self) -> Manifest {
        self.manifests()
            .build(&self.libraries.libraries, self.needs_display)
    }

    /// Whether the foundation libraries are already in the installed tree.
    pub fn foundation_installed(&self) -> bool {
        let lib = self.layout.installed_lib(&self.triplet.name);
        FOUNDATION_SENTINELS
            .iter()
            .all(|sentinel| lib.join(sentinel).exists())
    }

    /// Whether phase 1 must run.
    pub fn needs_foundation_phase(&self) -> bool {
        if !self.target.is_cross_linux() {
            return false;
        }
        if !self.needs_display {
            tracing::debug!("cross-linux: no module needs X11/Wayland, skipping foundation install");
            return false;
        }
        if !self.manifests().has_foundation() {
            return false;
        }
        if self.foundation_installed() {
            tracing::info!("cross-linux: X11/Wayland foundation already installed, skipping phase 1");
            return false;
        }
        true
    }

    /// Generate the cross toolchain and overlay triplets.
    ///
    /// Returns the overlay directory when one was written.
    pub fn prepare_overlays(&self) -> Result<Option<PathBuf>> {
        let cross_linux = self.target.is_cross_linux();
        let toolchain = if cross_linux {
            generate_cross_toolchain(self.layout, self.target, self.tools)?
        } else {
            None
        };

        let overlay = build_overlay(
            self.app,
            self.target,
            self.layout,
            self.triplet,
            toolchain.as_deref(),
        )?;
        let Some(overlay) = overlay else {
            return Ok(None);
        };

        let host = if cross_linux {
            build_host_overlay(self.layout, self.target)
        } else {
            None
        };
        write_overlays(self.layout, &overlay, host.as_ref()).map(Some)
    }

    /// Overlay search order: generated, local, addon triplets, then addon ports.
    pub fn overlay_args(&self, generated: Option<&Path>) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(dir) = generated {
            args.push(format!("--overlay-triplets={}", slash_path(dir)));
        }
        args.push(format!(
            "--overlay-triplets={}",
            slash_path(&self.layout.local_triplets())
        ));
        let addon_triplets = self.layout.addon_triplets();
        if addon_triplets.is_dir() {
            args.push(format!("--overlay-triplets={}", slash_path(&addon_triplets)));
        }
        let addon_ports = self.layout.addon_ports();
        if addon_ports.is_dir() {
            args.push(format!("--overlay-ports={}", slash_path(&addon_ports)));
        }
        args
    }

    pub fn install_args(&self, generated: Option<&Path>) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            format!("--triplet={}", self.triplet.name),
            "--allow-unsupported".to_string(),
        ];
        args.extend(self.overlay_args(generated));
        args
    }

    /// Environment for `vcpkg install`.
    pub fn install_env(&self) -> Result<BTreeMap<String, String>> {
        let mut env = BTreeMap::new();
        env.insert(
            "VCPKG_BINARY_SOURCES".to_string(),
            "clear;default,readwrite".to_string(),
        );

        let cache = self
            .binary_cache
            .clone()
            .unwrap_or_else(|| self.layout.archives_dir());
        ensure_dir(&cache)?;
        env.insert(
            "VCPKG_DEFAULT_BINARY_CACHE".to_string(),
            cache.display().to_string(),
        );

        if self.target.is_cross_linux() {
            let wrapper = pkgconfig::write_wrapper(self.layout, &self.triplet.name, self.tools)?;
            env.insert("PKG_CONFIG".to_string(), wrapper.display().to_string());
        }
        Ok(env)
    }

    /// Time budget for the full install: per-library seconds times the
    /// library count (at least one).
    pub fn install_timeout(&self) -> Duration {
        self.timeout_for(self.libraries.len())
    }

    fn timeout_for(&self, count: usize) -> Duration {
        let count = count.max(1) as u64;
        Duration::from_secs(self.seconds_per_library.saturating_mul(count))
    }

    /// Write `manifest` and install it.
    fn run_install(&self, manifest: &Manifest, generated: Option<&Path>, timeout: Duration) -> Result<EngineOutcome> {
        manifest.write(&self.layout.manifest_path())?;
        let command = EngineCommand {
            args: self.install_args(generated),
            env: self.install_env()?,
            cwd: self.layout.build_dir.clone(),
            timeout: Some(timeout),
        };
        self.engine.run(&command)
    }

    fn failure(&self, args: &[String], outcome: EngineOutcome) -> InstallError {
        let tool = format!("{} {}", self.engine.name(), args.first().map(String::as_str).unwrap_or_default());
        match outcome {
            EngineOutcome::TimedOut => InstallError::ExternalToolFailure {
                tool,
                code: None,
                timed_out: true,
            },
            EngineOutcome::Exited(code) => InstallError::ExternalToolFailure {
                tool,
                code: Some(code),
                timed_out: false,
            },
        }
    }

    /// Full install run.
    pub fn fetch(&self) -> Result<()> {
        self.engine.check()?;
        tracing::info!("fetching external libraries for {}", self.app.app.name);
        let start = std::time::Instant::now();

        let generated = self.prepare_overlays()?;

        if self.needs_foundation_phase() {
            tracing::info!("cross-linux phase 1: installing X11/Wayland foundation packages");
            let foundation = self.manifests().foundation();
            let timeout = self.timeout_for(foundation.dependencies.len());
            match self.run_install(&foundation, generated.as_deref(), timeout)? {
                EngineOutcome::Exited(0) => {}
                EngineOutcome::Exited(code) => {
                    tracing::error!("cross-linux phase 1 failed");
                    return Err(InstallError::FoundationInstallFailure { code }.into());
                }
                outcome @ EngineOutcome::TimedOut => {
                    return Err(self.failure(&["install".to_string()], outcome).into());
                }
            }
            tracing::info!("cross-linux phase 2: installing all packages");
        }

        match self.run_install(&self.full_manifest(), generated.as_deref(), self.install_timeout())? {
            EngineOutcome::Exited(0) => {}
            outcome => return Err(self.failure(&["install".to_string()], outcome).into()),
        }
        tracing::info!("fetched in {:.3} seconds", start.elapsed().as_secs_f64());

        let installed = self.layout.installed_dir(&self.triplet.name);
        replace_link(&installed, &self.layout.extlib_dir).with_context(|| {
            format!(
                "failed to link installed packages into {}",
                self.layout.extlib_dir.display()
            )
        })?;
        Ok(())
    }

    fn run_plain(&self, args: Vec<String>) -> Result<()> {
        self.engine.check()?;
        self.full_manifest().write(&self.layout.manifest_path())?;
        let command = EngineCommand {
            args,
            env: BTreeMap::new(),
            cwd: self.layout.build_dir.clone(),
            timeout: None,
        };
        match self.engine.run(&command)? {
            EngineOutcome::Exited(0) => Ok(()),
            outcome => Err(self.failure(&command.args, outcome).into()),
        }
    }

    /// Write the manifest and run `vcpkg list`.
    pub fn list(&self) -> Result<()> {
        self.run_plain(vec!["list".to_string()])
    }

    /// Write the manifest and run `vcpkg depend-info` as a tree.
    pub fn tree(&self) -> Result<()> {
        let mut args = vec!["depend-info".to_string()];
        args.extend(self.libraries.names().cloned());
        args.push(format!("--triplet={}", self.triplet.name));
        args.push("--format=tree".to_string());
        args.push("--max-recurse=-1".to_string());
        args.extend(self.overlay_args(None));
        self.run_plain(args)
    }
}
