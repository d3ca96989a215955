//! pkg-config wrapper for cross-linux builds.
//!
//! CMake's FindPkgConfig appends host directories to `PKG_CONFIG_PATH`, which
//! is searched before `PKG_CONFIG_LIBDIR`. The wrapper pins the libdir to the
//! installed triplet and drops every search path outside vcpkg.

use std::path::PathBuf;

use anyhow::Result;

use crate::cross::HostTools;
use crate::util::fs::{slash_path, write_executable};
use crate::vcpkg::VcpkgLayout;

pub const WRAPPER_NAME: &str = "pkg-config-cross-wrapper";

const FALLBACK_PKG_CONFIG: &str = "/bin/pkg-config";

/// The wrapper script, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgConfigWrapper {
    /// Replacement `PKG_CONFIG_LIBDIR` entries
    pub libdirs: Vec<String>,
    /// `PKG_CONFIG_PATH` entries are kept only under these roots
    pub allowed_roots: Vec<String>,
    /// The real pkg-config binary
    pub real: String,
}

impl PkgConfigWrapper {
    pub fn new(layout: &VcpkgLayout, triplet: &str, tools: &dyn HostTools) -> Self {
        let installed = slash_path(&layout.installed_dir(triplet));
        let real = tools
            .which("pkg-config")
            .map(|p| slash_path(&p))
            .unwrap_or_else(|| FALLBACK_PKG_CONFIG.to_string());

        PkgConfigWrapper {
            libdirs: vec![
                format!("{}/lib/pkgconfig", installed),
                format!("{}/debug/lib/pkgconfig", installed),
                format!("{}/share/pkgconfig", installed),
            ],
            allowed_roots: vec![slash_path(&layout.root), slash_path(&layout.build_dir)],
            real,
        }
    }

    pub fn render(&self) -> String {
        let patterns = self
            .allowed_roots
            .iter()
            .map(|root| format!("{}/*", root))
            .collect::<Vec<_>>()
            .join("|");

        let mut out = String::new();
        out.push_str("#!/bin/sh\n");
        out.push_str("# Auto-generated pkg-config wrapper for cross-linux builds.\n");
        out.push_str(&format!(
            "export PKG_CONFIG_LIBDIR=\"{}\"\n\n",
            self.libdirs.join(":")
        ));
        out.push_str("FILTERED=\"\"\n");
        out.push_str("OLDIFS=\"$IFS\"\n");
        out.push_str("IFS=\":\"\n");
        out.push_str("for dir in $PKG_CONFIG_PATH; do\n");
        out.push_str("  case \"$dir\" in\n");
        out.push_str(&format!(
            "    {}) FILTERED=\"${{FILTERED:+$FILTERED:}}$dir\" ;;\n",
            patterns
        ));
        out.push_str("  esac\n");
        out.push_str("done\n");
        out.push_str("IFS=\"$OLDIFS\"\n");
        out.push_str("export PKG_CONFIG_PATH=\"$FILTERED\"\n");
        out.push_str(&format!("exec {} \"$@\"\n", self.real));
        out
    }
}

/// Write the wrapper into the overlay directory and return its path.
pub fn write_wrapper(layout: &VcpkgLayout, triplet: &str, tools: &dyn HostTools) -> Result<PathBuf> {
    let path = layout.overlay_dir().join(WRAPPER_NAME);
    let wrapper = PkgConfigWrapper::new(layout, triplet, tools);
    write_executable(&path, &wrapper.render())?;
    tracing::info!("using pkg-config wrapper: {}", path.display());
    Ok(path)
}
