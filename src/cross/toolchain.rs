//! CMake cross toolchain.
//!
//! Pins the cross compilers explicitly, then includes vcpkg's own Linux
//! toolchain. vcpkg only detects a cross compiler when the host and target
//! processors differ, so a musl build on the host CPU would otherwise fall
//! back to the host `cc`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::arch;
use crate::core::target::BuildTarget;
use crate::cross::cmake::{find_root_isolation, CMakeScript, CacheKind};
use crate::cross::{HostTools, SysrootProbe};
use crate::ops::install::InstallError;
use crate::util::fs::{slash_path, write_string};
use crate::vcpkg::VcpkgLayout;

/// Binutils pinned only when the host actually has them.
const OPTIONAL_TOOLS: &[(&str, &str)] = &[
    ("CMAKE_AR", "ar"),
    ("CMAKE_RANLIB", "ranlib"),
    ("CMAKE_STRIP", "strip"),
    ("CMAKE_OBJCOPY", "objcopy"),
    ("CMAKE_NM", "nm"),
    ("CMAKE_LINKER", "ld"),
];

/// File name of the toolchain for a machine.
pub fn toolchain_file_name(machine: &str) -> String {
    format!("cmake-cross-{}.cmake", machine)
}

/// Render the toolchain for a gcc prefix (empty when the target has none).
pub fn cross_toolchain_script(
    prefix: &str,
    linux_toolchain: &Path,
    sysroot: Option<&str>,
    tools: &dyn HostTools,
) -> CMakeScript {
    let mut script = CMakeScript::new();
    script
        .comment("Auto-generated cmake cross-compilation toolchain")
        .comment("Includes the vcpkg Linux toolchain and adds host-header isolation")
        .blank();

    if !prefix.is_empty() {
        script
            .comment("Cross-compiler tools, set before linux.cmake so they take precedence")
            .set_quoted("CMAKE_C_COMPILER", format!("{}gcc", prefix))
            .set_quoted("CMAKE_CXX_COMPILER", format!("{}g++", prefix));
        for (var, tool) in OPTIONAL_TOOLS {
            let name = format!("{}{}", prefix, tool);
            if tools.which(&name).is_some() {
                script.set_cache(*var, name, CacheKind::FilePath, *var, false);
            }
        }
        script.blank();
    }

    script.include(slash_path(linux_toolchain)).blank();

    if let Some(sysroot) = sysroot {
        script
            .comment("Cross-compiler sysroot")
            .list_append("CMAKE_FIND_ROOT_PATH", sysroot)
            .set_quoted("CMAKE_SYSROOT", sysroot)
            .blank();
    }

    script
        .comment("Keep find_* away from host system paths")
        .extend(find_root_isolation());
    script
}

/// The target's gcc prefix, empty when the architecture has none.
pub fn gcc_prefix(target: &BuildTarget) -> &'static str {
    arch::lookup(&target.machine)
        .map(|a| a.gcc_prefix(target.libc))
        .unwrap_or_default()
}

/// Ask the target's cross gcc for its sysroot.
///
/// A missing compiler means no sysroot; a probe that times out is fatal.
pub fn probe_sysroot(target: &BuildTarget, tools: &dyn HostTools) -> Result<Option<String>> {
    let prefix = gcc_prefix(target);
    if prefix.is_empty() {
        return Ok(None);
    }

    let compiler = format!("{}gcc", prefix);
    match tools.sysroot(&compiler) {
        SysrootProbe::Found(sysroot) => Ok(Some(sysroot)),
        SysrootProbe::Missing => Ok(None),
        SysrootProbe::TimedOut => Err(InstallError::ExternalToolFailure {
            tool: format!("{} --print-sysroot", compiler),
            code: None,
            timed_out: true,
        }
        .into()),
    }
}

/// Generate the toolchain into the overlay directory.
///
/// Returns `Ok(None)` with a warning when vcpkg's Linux toolchain is missing.
/// A sysroot probe that times out is fatal.
pub fn generate_cross_toolchain(
    layout: &VcpkgLayout,
    target: &BuildTarget,
    tools: &dyn HostTools,
) -> Result<Option<PathBuf>> {
    let linux_toolchain = layout.linux_toolchain();
    if !linux_toolchain.is_file() {
        tracing::warn!(
            "cannot find vcpkg linux toolchain at '{}', skipping cmake cross toolchain",
            slash_path(&linux_toolchain)
        );
        return Ok(None);
    }

    let prefix = gcc_prefix(target);
    let sysroot = probe_sysroot(target, tools)?;

    let script = cross_toolchain_script(prefix, &linux_toolchain, sysroot.as_deref(), tools);
    let path = layout.overlay_dir().join(toolchain_file_name(&target.machine));
    write_string(&path, &script.render())?;
    tracing::info!("generated cmake cross toolchain at: {}", path.display());
    Ok(Some(path))
}
