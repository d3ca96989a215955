//! High-level operations.
//!
//! This module contains the implementation of crossport commands.

pub mod extlibs;
pub mod install;
pub mod session;

use std::fmt;

pub use extlibs::{gather, ExternalLibraries, ExtlibOptions, VendorPackages};
pub use install::{
    needs_display_foundation, InstallError, InstallOrchestrator, PackageEngine, VcpkgEngine,
};
pub use session::{Session, SessionOptions};

/// A non-fatal condition, reported and then ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MissingVersionEntry { library: String },
    MissingVendorPackage { library: String, manager: String },
    SkippedLibrary { library: String },
    ModuleRemoved { module: String, platform: String },
    TargetAdjusted { message: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingVersionEntry { library } => {
                write!(f, "no version entry for library `{}`", library)
            }
            Warning::MissingVendorPackage { library, manager } => {
                write!(f, "no {} package for library `{}`", manager, library)
            }
            Warning::SkippedLibrary { library } => write!(f, "skipping library {}", library),
            Warning::ModuleRemoved { module, platform } => {
                write!(f, "module '{}' cannot compile on platform: {}", module, platform)
            }
            Warning::TargetAdjusted { message } => f.write_str(message),
        }
    }
}
