//! Vcpkg integration.
//!
//! - Locating the vcpkg root and binary
//! - Path helpers for the per-build vcpkg working directory
//! - Triplet resolution, manifest building and overlay triplets

pub mod manifest;
pub mod overlay;
pub mod triplet;

use std::path::{Path, PathBuf};

use crate::core::app::AppConfig;
use crate::core::target::BuildTarget;
use crate::util::config::Config;
use crate::util::fs::absolutize;

/// Name of the vcpkg executable on this platform.
pub fn vcpkg_exe_name() -> &'static str {
    if cfg!(windows) {
        "vcpkg.exe"
    } else {
        "vcpkg"
    }
}

/// Every path crossport reads or writes for one build target.
#[derive(Debug, Clone)]
pub struct VcpkgLayout {
    /// vcpkg root (holds `triplets/`, `scripts/`)
    pub root: PathBuf,
    /// vcpkg executable
    pub binary: PathBuf,
    /// `<build>/vcpkg` - engine working directory
    pub build_dir: PathBuf,
    /// `<build>/extlib` - link to the installed tree
    pub extlib_dir: PathBuf,
    /// Local triplets and toolchains (`<project>/vcpkg` by default)
    pub local_dir: PathBuf,
    /// Project addon directory (`<project>/addon/vcpkg` by default)
    pub addon_dir: PathBuf,
}

impl VcpkgLayout {
    /// Resolve the layout for a target.
    ///
    /// Binary priority: `VCPKG_PATH` > tool config `vcpkg.root` > `VCPKG_ROOT`
    /// > `<project>/.vcpkg`.
    pub fn locate<F>(
        project_root: &Path,
        app: &AppConfig,
        config: &Config,
        target: &BuildTarget,
        env: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let binary = resolve_binary(project_root, config, &env);
        let root = binary
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_root.join(".vcpkg"));

        let local_dir = app
            .vcpkg
            .local_dir
            .as_deref()
            .map(|p| absolutize(project_root, p))
            .unwrap_or_else(|| project_root.join("vcpkg"));
        let addon_dir = app
            .vcpkg
            .addon_dir
            .as_deref()
            .map(|p| absolutize(project_root, p))
            .unwrap_or_else(|| project_root.join("addon").join("vcpkg"));

        let build = target.build_dir(project_root);

        VcpkgLayout {
            root,
            binary,
            build_dir: build.join("vcpkg"),
            extlib_dir: build.join("extlib"),
            local_dir,
            addon_dir,
        }
    }

    /// `vcpkg.json` inside the working directory.
    pub fn manifest_path(&self) -> PathBuf {
        self.build_dir.join("vcpkg.json")
    }

    /// Generated overlay triplets, toolchain and wrapper.
    pub fn overlay_dir(&self) -> PathBuf {
        self.build_dir.join("overlay-triplets")
    }

    /// Installed tree for a triplet.
    pub fn installed_dir(&self, triplet: &str) -> PathBuf {
        self.build_dir.join("vcpkg_installed").join(triplet)
    }

    pub fn installed_include(&self, triplet: &str) -> PathBuf {
        self.installed_dir(triplet).join("include")
    }

    pub fn installed_lib(&self, triplet: &str) -> PathBuf {
        self.installed_dir(triplet).join("lib")
    }

    /// vcpkg's own triplet directories, in lookup order.
    pub fn engine_triplet_dirs(&self) -> [PathBuf; 2] {
        let triplets = self.root.join("triplets");
        [triplets.clone(), triplets.join("community")]
    }

    pub fn local_triplets(&self) -> PathBuf {
        self.local_dir.join("triplets")
    }

    /// Shared zig toolchain descriptor chain-loaded by zig triplets.
    pub fn zig_toolchain(&self) -> PathBuf {
        self.local_dir.join("toolchains").join("zig-toolchain.cmake")
    }

    pub fn addon_triplets(&self) -> PathBuf {
        self.addon_dir.join("triplets")
    }

    pub fn addon_ports(&self) -> PathBuf {
        self.addon_dir.join("overlay-ports")
    }

    /// vcpkg's Linux toolchain, included by the cross toolchain.
    pub fn linux_toolchain(&self) -> PathBuf {
        self.root.join("scripts").join("toolchains").join("linux.cmake")
    }

    /// Default binary cache directory.
    pub fn archives_dir(&self) -> PathBuf {
        self.root.join("archives")
    }
}

fn resolve_binary<F>(project_root: &Path, config: &Config, env: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env("VCPKG_PATH").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(root) = &config.vcpkg.root {
        return absolutize(project_root, root).join(vcpkg_exe_name());
    }
    if let Some(root) = env("VCPKG_ROOT").filter(|p| !p.is_empty()) {
        return PathBuf::from(root).join(vcpkg_exe_name());
    }
    project_root.join(".vcpkg").join(vcpkg_exe_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::HostInfo;
    use crate::core::target::{Libc, TargetRequest};

    fn target() -> BuildTarget {
        let host = HostInfo {
            machine: "x86_64".to_string(),
            libc: Libc::Gnu,
            platform: "linux".to_string(),
        };
        BuildTarget::resolve(&TargetRequest::default(), &host).unwrap()
    }

    #[test]
    fn test_binary_priority() {
        let app = AppConfig::default();
        let project = Path::new("/proj");
        let mut config = Config::default();

        let layout = VcpkgLayout::locate(project, &app, &config, &target(), |_| None);
        assert_eq!(layout.binary, project.join(".vcpkg").join(vcpkg_exe_name()));
        assert_eq!(layout.root, project.join(".vcpkg"));

        let env = |var: &str| (var == "VCPKG_ROOT").then(|| "/opt/vcpkg".to_string());
        let layout = VcpkgLayout::locate(project, &app, &config, &target(), env);
        assert_eq!(layout.root, PathBuf::from("/opt/vcpkg"));

        config.vcpkg.root = Some(PathBuf::from("tools/vcpkg"));
        let layout = VcpkgLayout::locate(project, &app, &config, &target(), env);
        assert_eq!(layout.root, project.join("tools/vcpkg"));

        let env = |var: &str| match var {
            "VCPKG_PATH" => Some("/usr/local/vcpkg/vcpkg".to_string()),
            _ => None,
        };
        let layout = VcpkgLayout::locate(project, &app, &config, &target(), env);
        assert_eq!(layout.root, PathBuf::from("/usr/local/vcpkg"));
    }

    #[test]
    fn test_build_paths() {
        let layout = VcpkgLayout::locate(
            Path::new("/proj"),
            &AppConfig::default(),
            &Config::default(),
            &target(),
            |_| None,
        );
        let build = PathBuf::from("/proj/build/linux-x86_64/gcc/debug");
        assert_eq!(layout.manifest_path(), build.join("vcpkg/vcpkg.json"));
        assert_eq!(
            layout.installed_include("x64-linux"),
            build.join("vcpkg/vcpkg_installed/x64-linux/include")
        );
        assert_eq!(layout.extlib_dir, build.join("extlib"));
        assert_eq!(layout.local_triplets(), PathBuf::from("/proj/vcpkg/triplets"));
        assert_eq!(
            layout.addon_ports(),
            PathBuf::from("/proj/addon/vcpkg/overlay-ports")
        );
    }
}
