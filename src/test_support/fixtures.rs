//! Test fixtures for common test scenarios.
//!
//! A small app catalog exercising every catalog feature, plus layout and
//! target builders rooted in a temporary directory.

use std::path::Path;

use crate::core::app::AppConfig;
use crate::core::host::HostInfo;
use crate::core::target::{BuildTarget, Libc, TargetRequest};
use crate::vcpkg::VcpkgLayout;

/// Catalog shared by the unit tests.
///
/// Dependency graph: `http -> net -> util`, `core -> util`; `lua` is a
/// conditional module depending on `util` and conditionally on `core`.
pub const SAMPLE_CATALOG: &str = r#"
test-extlibs = ["gtest"]
demo-extlibs = ["imgui"]

[app]
name = "sample"
version = "0.3.0"
modes = ["debug", "release"]

[modules.util]
libs = ["pthread"]
extlibs = ["fmt"]
linux-extlibs = ["libuuid"]
platforms = ["linux", "windows"]

[modules.core]
depends = ["util"]

[modules.net]
depends = ["util"]
linux-libs = ["dl"]

[modules.http]
depends = ["net"]
extlibs = ["curl", "libpsl"]

[conditional-modules.lua]
depends = ["util"]
conditional-depends = ["core"]
conditional-env = "lua"

[extlibs]
fmt = "12.1.0"
curl = ""
libuuid = ""
libusb = ""
zlib = ""
gtest = ""
imgui = ""

[extlibs-features-platform.linux]
libusb = ["udev"]

[extlibs-skip-platform]
web = ["libusb"]

[packages.apt]
fmt = "libfmt-dev"
libuuid = "uuid-dev"
"#;

/// Parse [`SAMPLE_CATALOG`].
pub fn sample_app() -> AppConfig {
    AppConfig::parse("Crossport.toml", SAMPLE_CATALOG).unwrap()
}

/// Layout with every directory under `root`; nothing is created.
pub fn layout_in(root: &Path) -> VcpkgLayout {
    let vcpkg = root.join(".vcpkg");
    VcpkgLayout {
        binary: vcpkg.join("vcpkg"),
        root: vcpkg,
        build_dir: root.join("build").join("vcpkg"),
        extlib_dir: root.join("build").join("extlib"),
        local_dir: root.join("vcpkg"),
        addon_dir: root.join("addon").join("vcpkg"),
    }
}

/// An x86_64 gnu linux host.
pub fn linux_host() -> HostInfo {
    HostInfo {
        machine: "x86_64".to_string(),
        libc: Libc::Gnu,
        platform: "linux".to_string(),
    }
}

/// Target for `machine` built from a [`linux_host`].
pub fn cross_target(machine: &str) -> BuildTarget {
    let request = TargetRequest {
        machine: Some(machine.to_string()),
        ..Default::default()
    };
    BuildTarget::resolve(&request, &linux_host()).unwrap()
}

/// The host's own target.
pub fn native_target() -> BuildTarget {
    cross_target("x86_64")
}
