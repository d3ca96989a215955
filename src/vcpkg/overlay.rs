//! Overlay triplets.
//!
//! An overlay triplet layers project flags, cross-linux isolation and
//! per-port configure options on top of a base triplet. It is written under
//! `<build>/vcpkg/overlay-triplets/` and passed first in the overlay search
//! order, so it shadows the base triplet of the same name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::app::AppConfig;
use crate::core::arch;
use crate::core::target::BuildTarget;
use crate::cross::cmake::CMakeScript;
use crate::util::fs::{ensure_dir, slash_path, write_string};
use crate::vcpkg::triplet::{dynamic_triplet_script, Triplet, TripletError};
use crate::vcpkg::VcpkgLayout;

const FORCE_X_LIBRARIES: &str = "X_VCPKG_FORCE_VCPKG_X_LIBRARIES";
const FORCE_WAYLAND_LIBRARIES: &str = "X_VCPKG_FORCE_VCPKG_WAYLAND_LIBRARIES";

/// A generated overlay triplet, kept as separate sections until rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayTriplet {
    /// Triplet name; also the file stem
    pub name: String,
    /// `include()` of a static triplet, or a synthesized body
    pub base: CMakeScript,
    /// `VCPKG_C_FLAGS` / `VCPKG_CXX_FLAGS` additions
    pub flags: CMakeScript,
    /// Cross-linux isolation directives
    pub cross: CMakeScript,
    /// Non-empty configure options per port
    pub ports: BTreeMap<String, Vec<String>>,
}

impl OverlayTriplet {
    /// The whole triplet as one script.
    pub fn script(&self) -> CMakeScript {
        let mut script = self.base.clone();
        for section in [&self.flags, &self.cross] {
            if !section.is_empty() {
                script.extend(section.clone()).blank();
            }
        }
        if !self.ports.is_empty() {
            for (port, options) in &self.ports {
                script.port_options(port.clone(), options.clone());
            }
            script.blank();
        }
        script
    }

    pub fn render(&self) -> String {
        self.script().render()
    }

    pub fn file_name(&self) -> String {
        format!("{}.cmake", self.name)
    }
}

/// Overlay for the host triplet during cross-linux builds.
///
/// Host-side tools of the display foundation ports are only produced when the
/// host triplet force-builds them too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOverlay {
    pub name: String,
    pub script: CMakeScript,
}

/// Per-port configure options for the target.
///
/// The platform table (cross or native) replaces a port's base list
/// wholesale; an empty replacement removes the port.
pub fn port_options(app: &AppConfig, target: &BuildTarget) -> BTreeMap<String, Vec<String>> {
    let settings = &app.vcpkg;
    let mut options = settings.cmake_configure_options.clone();

    let overrides = if target.is_cross_building() {
        settings.cmake_configure_options_cross.get(&target.platform)
    } else {
        settings.cmake_configure_options_platform.get(&target.platform)
    };
    if let Some(overrides) = overrides {
        for (port, list) in overrides {
            options.insert(port.clone(), list.clone());
        }
    }

    options.retain(|_, list| !list.is_empty());
    options
}

/// First existing static definition of `triplet`: local, addon, vcpkg's own,
/// then vcpkg's community triplets.
pub fn find_static_triplet(layout: &VcpkgLayout, triplet: &str) -> Option<PathBuf> {
    let file = format!("{}.cmake", triplet);
    let [engine, community] = layout.engine_triplet_dirs();
    [layout.local_triplets(), layout.addon_triplets(), engine, community]
        .into_iter()
        .map(|dir| dir.join(&file))
        .find(|path| path.is_file())
}

/// Build the overlay triplet for a target.
///
/// `cross_toolchain` is the generated CMake cross toolchain, chain-loaded on
/// cross-linux builds. Returns `Ok(None)` when no overlay is needed, or when
/// the static base triplet cannot be found.
pub fn build_overlay(
    app: &AppConfig,
    target: &BuildTarget,
    layout: &VcpkgLayout,
    triplet: &Triplet,
    cross_toolchain: Option<&Path>,
) -> Result<Option<OverlayTriplet>, TripletError> {
    let settings = &app.vcpkg;
    let need_flags = !settings.cflags.is_empty() || !settings.cxxflags.is_empty();
    let cross_linux = target.is_cross_linux();
    let ports = port_options(app, target);
    let dynamic = triplet.kind.is_dynamic();

    if !need_flags && !cross_linux && ports.is_empty() && !dynamic {
        return Ok(None);
    }

    let base = if dynamic {
        let mut body = dynamic_triplet_script(&triplet.name, &layout.zig_toolchain())?;
        body.blank();
        body
    } else {
        let Some(original) = find_static_triplet(layout, &triplet.name) else {
            tracing::warn!(
                "cannot find original triplet file for '{}', skipping overlay generation",
                triplet.name
            );
            return Ok(None);
        };
        let mut base = CMakeScript::new();
        base.comment("Auto-generated overlay triplet")
            .include(slash_path(&original))
            .blank();
        base
    };

    // vcpkg needs both flag variables whenever either is set.
    let mut flags = CMakeScript::new();
    if need_flags {
        flags
            .string_append("VCPKG_C_FLAGS", settings.cflags.join(" "))
            .string_append("VCPKG_CXX_FLAGS", settings.cxxflags.join(" "));
    }

    let mut cross = CMakeScript::new();
    if cross_linux {
        let include = format!("-I{}", slash_path(&layout.installed_include(&triplet.name)));
        cross
            .comment("Force vcpkg X11/Wayland libraries for cross-compilation")
            .set(FORCE_X_LIBRARIES, "ON")
            .set(FORCE_WAYLAND_LIBRARIES, "ON")
            .blank()
            .string_append("VCPKG_C_FLAGS", include.clone())
            .string_append("VCPKG_CXX_FLAGS", include);
        if let Some(toolchain) = cross_toolchain {
            cross
                .blank()
                .set_quoted("VCPKG_CHAINLOAD_TOOLCHAIN_FILE", slash_path(toolchain));
        }
    }

    Ok(Some(OverlayTriplet {
        name: triplet.name.clone(),
        base,
        flags,
        cross,
        ports,
    }))
}

/// Host overlay for a cross-linux build, when the host triplet exists in vcpkg.
pub fn build_host_overlay(layout: &VcpkgLayout, target: &BuildTarget) -> Option<HostOverlay> {
    let name = format!("{}-linux", arch::vcpkg_machine(&target.host_machine));
    let file = format!("{}.cmake", name);
    let original = layout
        .engine_triplet_dirs()
        .into_iter()
        .map(|dir| dir.join(&file))
        .find(|path| path.is_file())?;

    let mut script = CMakeScript::new();
    script
        .comment("Auto-generated host overlay triplet for cross-linux X11/Wayland")
        .include(slash_path(&original))
        .blank()
        .set(FORCE_X_LIBRARIES, "ON")
        .set(FORCE_WAYLAND_LIBRARIES, "ON");
    Some(HostOverlay { name, script })
}

/// Write the overlay (and host overlay) into the overlay directory.
pub fn write_overlays(
    layout: &VcpkgLayout,
    overlay: &OverlayTriplet,
    host: Option<&HostOverlay>,
) -> Result<PathBuf> {
    let dir = layout.overlay_dir();
    ensure_dir(&dir)?;

    let path = dir.join(overlay.file_name());
    write_string(&path, &overlay.render())?;
    tracing::info!("generated overlay triplet at: {}", path.display());

    if let Some(host) = host {
        let path = dir.join(format!("{}.cmake", host.name));
        write_string(&path, &host.script.render())?;
        tracing::info!("generated host overlay triplet at: {}", path.display());
    }

    Ok(dir)
}
