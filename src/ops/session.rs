//! Per-invocation state shared by every command.
//!
//! A session resolves, once, everything a command needs: the project root and
//! catalog, the merged tool config, the build target, the module plan, the
//! pinned external libraries and the vcpkg layout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::app::AppConfig;
use crate::core::host::HostInfo;
use crate::core::target::{BuildTarget, TargetRequest};
use crate::cross::{HostTools, SystemTools};
use crate::ops::extlibs::{gather, ExternalLibraries, ExtlibOptions};
use crate::ops::install::{needs_display_foundation, InstallOrchestrator, PackageEngine, VcpkgEngine};
use crate::ops::Warning;
use crate::resolver::{resolve_plan, BuildPlan, PlanRequest, Resolution};
use crate::util::config::{BuildConfig, Config};
use crate::util::context::{GlobalContext, CATALOG_FILE};
use crate::vcpkg::manifest::{Manifest, ManifestBuilder};
use crate::vcpkg::triplet::{Triplet, TripletResolver};
use crate::vcpkg::VcpkgLayout;

/// What the command line asked for.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Requested modules; the whole catalog when empty
    pub modules: Vec<String>,
    /// Conditional modules to add
    pub with: Vec<String>,
    /// Explicit triplet, bypassing auto-detection
    pub triplet: Option<String>,
    pub target: TargetRequest,
    pub tests: bool,
    pub demo: bool,
}

/// Resolved state for one crossport invocation.
#[derive(Debug)]
pub struct Session {
    pub project_root: PathBuf,
    pub app: AppConfig,
    pub config: Config,
    pub target: BuildTarget,
    pub resolution: Resolution,
    pub libraries: ExternalLibraries,
    pub layout: VcpkgLayout,
    pub warnings: Vec<Warning>,
    needs_display: bool,
    binary_cache: Option<PathBuf>,
    triplet_override: Option<String>,
}

impl Session {
    /// Open a session for the project enclosing the working directory.
    pub fn open(ctx: &GlobalContext, options: SessionOptions) -> Result<Self> {
        let project_root = ctx.find_project_root()?;
        let app = AppConfig::load(&project_root.join(CATALOG_FILE))?;
        let config = ctx.load_config(&project_root);
        let host = HostInfo::detect();
        tracing::debug!(
            "host: machine={} libc={} platform={}",
            host.machine,
            host.libc,
            host.platform
        );

        Self::from_parts(project_root, app, config, options, &host, |var| {
            std::env::var(var).ok()
        })
    }

    /// Build a session from already loaded parts.
    ///
    /// `env` answers every environment lookup (`VCPKG_PATH`,
    /// `VCPKG_DEFAULT_BINARY_CACHE`, `x11`, module switches...).
    pub fn from_parts<F>(
        project_root: PathBuf,
        app: AppConfig,
        config: Config,
        options: SessionOptions,
        host: &HostInfo,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let request = with_config_defaults(options.target, &config.build);
        let mut target = BuildTarget::resolve(&request, host)?;
        for message in target.validate(&app.app.modes)? {
            tracing::warn!("{}", message);
            warnings.push(Warning::TargetAdjusted { message });
        }
        tracing::info!("build target: {}", target);

        let plan_request = PlanRequest {
            modules: options.modules,
            conditionals: options.with,
            platform: target.platform.clone(),
        };
        let resolution = resolve_plan(&app, &plan_request, &env)?;
        warnings.extend(resolution.removed.iter().map(|module| Warning::ModuleRemoved {
            module: module.clone(),
            platform: target.platform.clone(),
        }));

        let mut libraries = gather(
            &app,
            &resolution.plan,
            &target.platform,
            ExtlibOptions {
                tests: options.tests,
                demo: options.demo,
            },
        );
        warnings.append(&mut libraries.warnings);

        let layout = VcpkgLayout::locate(&project_root, &app, &config, &target, &env);
        let needs_display = needs_display_foundation(
            &resolution.plan,
            &target.platform,
            &app.vcpkg.display_libs,
            &env,
        );

        // An exported cache wins over the tool config.
        let binary_cache = env("VCPKG_DEFAULT_BINARY_CACHE")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| config.vcpkg.binary_cache.clone());

        Ok(Session {
            project_root,
            app,
            config,
            target,
            resolution,
            libraries,
            layout,
            warnings,
            needs_display,
            binary_cache,
            triplet_override: options.triplet,
        })
    }

    pub fn plan(&self) -> &BuildPlan {
        &self.resolution.plan
    }

    /// Whether the display foundation is needed for this build.
    pub fn needs_display(&self) -> bool {
        self.needs_display
    }

    /// The triplet for this session's target.
    pub fn triplet(&self) -> Result<Triplet> {
        let resolver = TripletResolver::new(&self.layout, self.triplet_override.clone());
        let triplet = resolver
            .resolve(&self.target)
            .with_context(|| format!("failed to resolve a vcpkg triplet for {}", self.target))?;
        Ok(triplet.clone())
    }

    pub fn manifest_builder(&self) -> ManifestBuilder {
        ManifestBuilder::new(&self.app, &self.target)
    }

    /// The manifest a full install would write.
    pub fn manifest(&self) -> Manifest {
        self.manifest_builder()
            .build(&self.libraries.libraries, self.needs_display)
    }

    /// The real vcpkg binary.
    pub fn engine(&self) -> VcpkgEngine {
        VcpkgEngine::new(&self.layout.binary)
    }

    /// Host probing with the configured sysroot time budget.
    pub fn host_tools(&self) -> SystemTools {
        SystemTools::new(Duration::from_secs(self.config.sysroot_timeout_secs()))
    }

    /// An orchestrator over this session's state.
    pub fn orchestrator<'a>(
        &'a self,
        triplet: &'a Triplet,
        engine: &'a dyn PackageEngine,
        tools: &'a dyn HostTools,
    ) -> InstallOrchestrator<'a> {
        InstallOrchestrator {
            app: &self.app,
            target: &self.target,
            layout: &self.layout,
            triplet,
            libraries: &self.libraries,
            needs_display: self.needs_display,
            seconds_per_library: self.config.seconds_per_library(),
            binary_cache: self.binary_cache.clone(),
            engine,
            tools,
        }
    }
}

/// Fill unset request fields from the tool config's `[build]` table.
fn with_config_defaults(mut request: TargetRequest, build: &BuildConfig) -> TargetRequest {
    request.platform = request.platform.or_else(|| build.platform.clone());
    request.compiler = request.compiler.or_else(|| build.compiler.clone());
    request.libc = request.libc.or_else(|| build.libc.clone());
    request.machine = request.machine.or_else(|| build.machine.clone());
    request.mode = request.mode.or_else(|| build.mode.clone());
    request
}
