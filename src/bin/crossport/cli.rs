//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crossport::core::TargetRequest;
use crossport::ops::SessionOptions;

/// Crossport - module resolver and cross-target vcpkg driver
#[derive(Parser)]
#[command(name = "crossport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the external libraries for the active target
    Fetch(SessionArgs),

    /// Write the manifest and list installed packages
    List(SessionArgs),

    /// Write the manifest and show the package dependency tree
    Tree(SessionArgs),

    /// Print the vcpkg manifest that would be written
    Manifest(SessionArgs),

    /// Show the resolved module build plan
    Plan(PlanArgs),

    /// Print distribution package names for the external libraries
    Packages(PackagesArgs),

    /// Print the resolved vcpkg triplet
    Triplet(SessionArgs),

    /// Write the CMake toolchain and Meson cross file for the active target
    CrossFile(CrossFileArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Target selection; unset flags fall back to the tool config, then the host.
#[derive(Args, Clone, Default)]
pub struct TargetArgs {
    /// Target machine (x86_64, arm64, riscv64, ...)
    #[arg(short, long)]
    pub machine: Option<String>,

    /// Architecture width (32 or 64)
    #[arg(long)]
    pub arch: Option<String>,

    /// C library (gnu or musl)
    #[arg(long)]
    pub libc: Option<String>,

    /// Compiler (gcc, clang, em, mingw or zig)
    #[arg(short, long)]
    pub compiler: Option<String>,

    /// Target platform (linux, windows, web, ...)
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Link external libraries statically
    #[arg(long = "static")]
    pub static_libs: bool,

    /// Build mode
    #[arg(long)]
    pub mode: Option<String>,
}

impl TargetArgs {
    pub fn request(&self) -> TargetRequest {
        TargetRequest {
            machine: self.machine.clone(),
            arch: self.arch.clone(),
            libc: self.libc.clone(),
            compiler: self.compiler.clone(),
            platform: self.platform.clone(),
            static_libs: self.static_libs,
            mode: self.mode.clone(),
        }
    }
}

/// Module selection plus target selection.
#[derive(Args, Clone, Default)]
pub struct SessionArgs {
    /// Modules to build (defaults to every module)
    #[arg(value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Conditional modules to add
    #[arg(long, value_delimiter = ',')]
    pub with: Vec<String>,

    /// Include test external libraries
    #[arg(long)]
    pub test: bool,

    /// Include demo external libraries
    #[arg(long)]
    pub demo: bool,

    /// Use this vcpkg triplet instead of detecting one
    #[arg(long)]
    pub triplet: Option<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

impl SessionArgs {
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            modules: self.modules.clone(),
            with: self.with.clone(),
            triplet: self.triplet.clone(),
            target: self.target.request(),
            tests: self.test,
            demo: self.demo,
        }
    }
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Output the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PackagesArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Package manager to map to, or `auto` to detect the host's
    #[arg(long, default_value = "auto")]
    pub pkgdep: String,
}

#[derive(Args)]
pub struct CrossFileArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Output directory (defaults to the build's overlay directory)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
