//! Triplet resolution and dynamic triplet generation.
//!
//! A triplet is either a static `.cmake` file shipped with vcpkg or a local
//! directory, or one crossport synthesizes on demand:
//! - musl: `<vcpkg-machine>-linux-musl`
//! - zig:  `zig-<vcpkg-machine>-linux-{static,dynamic}`

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Result;
use thiserror::Error;

use crate::core::arch::{self, Architecture};
use crate::core::target::{BuildTarget, Compiler, Libc, Linkage};
use crate::cross::cmake::{find_root_isolation, CMakeScript, CacheKind};
use crate::util::diagnostic::Diagnostic;
use crate::util::fs::{file_stems_with_extension, slash_path};
use crate::vcpkg::VcpkgLayout;

/// Machine token vcpkg uses for emscripten.
pub const WEB_MACHINE: &str = "wasm32";
/// Platform token vcpkg uses for emscripten with threads.
pub const WEB_PLATFORM: &str = "emscripten-threads";
/// Platform token vcpkg uses for windows builds (mingw).
pub const WINDOWS_PLATFORM: &str = "mingw";

const MUSL_MARKER: &str = "-linux-musl";
const ZIG_PREFIX: &str = "zig-";

/// How a triplet's definition is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripletKind {
    /// A `.cmake` file on disk
    Static,
    /// Synthesized musl triplet
    MuslDynamic,
    /// Synthesized zig triplet
    ZigDynamic,
}

impl TripletKind {
    /// Classify a triplet name.
    pub fn of(name: &str) -> Self {
        if is_zig_triplet(name) {
            TripletKind::ZigDynamic
        } else if is_musl_triplet(name) {
            TripletKind::MuslDynamic
        } else {
            TripletKind::Static
        }
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self, TripletKind::Static)
    }
}

impl fmt::Display for TripletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripletKind::Static => write!(f, "static"),
            TripletKind::MuslDynamic => write!(f, "musl-dynamic"),
            TripletKind::ZigDynamic => write!(f, "zig-dynamic"),
        }
    }
}

/// A resolved triplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet {
    pub name: String,
    pub kind: TripletKind,
}

impl Triplet {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = TripletKind::of(&name);
        Triplet { name, kind }
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Triplet resolution or generation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TripletError {
    #[error("no vcpkg triplet detected (tried: {})", candidates.join(", "))]
    NoTripletResolved { candidates: Vec<String> },

    #[error("cannot find architecture for vcpkg machine `{machine}`")]
    UnknownPackagingMachine { machine: String },

    #[error("triplet `{triplet}` is not generated dynamically")]
    NotDynamic { triplet: String },
}

impl TripletError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            TripletError::NoTripletResolved { candidates } => {
                Diagnostic::error("no vcpkg triplet detected")
                    .with_context(format!("tried: {}", candidates.join(", ")))
                    .with_suggestion("help: Pass `--triplet` or add a matching file to vcpkg/triplets")
            }
            TripletError::UnknownPackagingMachine { machine } => Diagnostic::error(format!(
                "cannot find architecture for vcpkg machine `{}`",
                machine
            )),
            TripletError::NotDynamic { triplet } => Diagnostic::error(format!(
                "triplet `{}` is not generated dynamically",
                triplet
            )),
        }
    }
}

pub fn is_musl_triplet(name: &str) -> bool {
    name.ends_with("-musl") && name.contains(MUSL_MARKER) && !name.starts_with(ZIG_PREFIX)
}

pub fn is_zig_triplet(name: &str) -> bool {
    name.starts_with(ZIG_PREFIX)
        && (name.contains("-linux-static") || name.contains("-linux-dynamic"))
}

/// Musl triplet name for a machine, when the machine has a musl toolchain.
pub fn musl_triplet_name(machine: &str) -> Option<String> {
    arch::lookup(machine)
        .filter(|a| !a.gcc_musl.is_empty())
        .map(|a| format!("{}{}", a.vcpkg_machine, MUSL_MARKER))
}

/// Recover the architecture (and zig linkage) encoded in a dynamic triplet name.
pub fn parse_dynamic(name: &str) -> Result<(&'static Architecture, Option<Linkage>), TripletError> {
    let (machine, linkage) = if is_zig_triplet(name) {
        let rest = &name[ZIG_PREFIX.len()..];
        if let Some(machine) = rest.strip_suffix("-linux-static") {
            (machine, Some(Linkage::Static))
        } else if let Some(machine) = rest.strip_suffix("-linux-dynamic") {
            (machine, Some(Linkage::Dynamic))
        } else {
            return Err(TripletError::NotDynamic {
                triplet: name.to_string(),
            });
        }
    } else if is_musl_triplet(name) {
        let machine = name.split(MUSL_MARKER).next().unwrap_or_default();
        (machine, None)
    } else {
        return Err(TripletError::NotDynamic {
            triplet: name.to_string(),
        });
    };

    let arch = arch::from_vcpkg_machine(machine).ok_or_else(|| {
        TripletError::UnknownPackagingMachine {
            machine: machine.to_string(),
        }
    })?;
    Ok((arch, linkage))
}

/// Candidate triplet names for a target, most specific first.
pub fn candidates(target: &BuildTarget) -> Vec<String> {
    let (machine, platform) = match target.platform.as_str() {
        "web" => (WEB_MACHINE.to_string(), WEB_PLATFORM.to_string()),
        "windows" => (arch::vcpkg_machine(&target.machine), WINDOWS_PLATFORM.to_string()),
        other => (arch::vcpkg_machine(&target.machine), other.to_string()),
    };

    let (prefix, suffix) = if target.libc == Libc::Musl && target.platform == "linux" {
        ("", "-musl")
    } else if target.compiler == Compiler::Zig {
        (ZIG_PREFIX, "")
    } else {
        ("", "")
    };

    let base = format!("{}{}-{}{}", prefix, machine, platform, suffix);
    let linkage = target.linkage.as_str();
    vec![
        format!("{}-{}-{}", base, linkage, target.mode),
        format!("{}-{}", base, linkage),
        format!("{}-{}", base, target.mode),
        base,
    ]
}

/// First candidate present in `available`.
pub fn pick(candidates: &[String], available: &BTreeSet<String>) -> Result<String, TripletError> {
    candidates
        .iter()
        .find(|c| available.contains(*c))
        .cloned()
        .ok_or_else(|| TripletError::NoTripletResolved {
            candidates: candidates.to_vec(),
        })
}

/// Triplet names defined by vcpkg itself.
pub fn scan_engine_triplets(layout: &VcpkgLayout) -> Result<BTreeSet<String>> {
    let mut triplets = BTreeSet::new();
    for dir in layout.engine_triplet_dirs() {
        triplets.extend(file_stems_with_extension(&dir, "cmake")?);
    }
    Ok(triplets)
}

/// Triplet names crossport can provide: local and addon files plus every
/// musl and zig triplet the architecture table supports.
pub fn generatable_triplets(layout: &VcpkgLayout) -> Result<BTreeSet<String>> {
    let mut triplets = BTreeSet::new();
    for dir in [layout.local_triplets(), layout.addon_triplets()] {
        triplets.extend(file_stems_with_extension(&dir, "cmake")?);
    }

    for arch in arch::all() {
        if !arch.gcc_musl.is_empty() {
            triplets.insert(format!("{}{}", arch.vcpkg_machine, MUSL_MARKER));
        }
        if !arch.zig_target.is_empty() {
            triplets.insert(format!("{}{}-linux-static", ZIG_PREFIX, arch.vcpkg_machine));
            triplets.insert(format!("{}{}-linux-dynamic", ZIG_PREFIX, arch.vcpkg_machine));
        }
    }
    Ok(triplets)
}

/// Resolves the triplet once per resolver and caches the answer.
#[derive(Debug)]
pub struct TripletResolver<'a> {
    layout: &'a VcpkgLayout,
    explicit: Option<String>,
    cache: OnceLock<Triplet>,
}

impl<'a> TripletResolver<'a> {
    pub fn new(layout: &'a VcpkgLayout, explicit: Option<String>) -> Self {
        TripletResolver {
            layout,
            explicit,
            cache: OnceLock::new(),
        }
    }

    /// Resolve the triplet for `target`.
    ///
    /// An explicit triplet is used verbatim. Otherwise the candidates are
    /// tried against vcpkg's triplets and the generatable ones.
    pub fn resolve(&self, target: &BuildTarget) -> Result<&Triplet> {
        if let Some(triplet) = self.cache.get() {
            return Ok(triplet);
        }

        let triplet = match &self.explicit {
            Some(name) => Triplet::new(name.clone()),
            None => {
                let mut available = scan_engine_triplets(self.layout)?;
                available.extend(generatable_triplets(self.layout)?);
                let tries = candidates(target);
                tracing::debug!("triplet candidates: {:?}", tries);
                let name = pick(&tries, &available)?;
                tracing::info!("vcpkg triplet auto-detected as: {}", name);
                Triplet::new(name)
            }
        };

        Ok(self.cache.get_or_init(|| triplet))
    }
}

/// Synthesize the definition of a musl or zig triplet.
pub fn dynamic_triplet_script(name: &str, zig_toolchain: &Path) -> Result<CMakeScript, TripletError> {
    let (arch, linkage) = parse_dynamic(name)?;
    match linkage {
        Some(linkage) => zig_triplet_script(arch, linkage, zig_toolchain),
        None => Ok(musl_triplet_script(arch)),
    }
}

/// Musl triplet with an inline toolchain.
///
/// Compilers and archivers are named explicitly: a musl build on a host of
/// the same CPU is not detected as a cross build by processor comparison.
pub fn musl_triplet_script(arch: &Architecture) -> CMakeScript {
    let mut script = CMakeScript::new();
    script
        .comment(format!("Auto-generated musl triplet for {}", arch.machine))
        .set("CMAKE_SYSTEM_NAME", "Linux")
        .set("CMAKE_SYSTEM_PROCESSOR", arch.meson.cpu)
        .set("VCPKG_TARGET_ARCHITECTURE", arch.vcpkg_machine)
        .set("VCPKG_CRT_LINKAGE", "dynamic")
        .set("VCPKG_LIBRARY_LINKAGE", "dynamic")
        .set("VCPKG_CMAKE_SYSTEM_NAME", "Linux")
        .set_cache("CMAKE_C_FLAGS", "-fPIC", CacheKind::String, "", true)
        .set_cache("CMAKE_CXX_FLAGS", "-fPIC", CacheKind::String, "", true);

    let prefix = arch.gcc_musl;
    if !prefix.is_empty() {
        script
            .blank()
            .comment("Inline cross-compilation toolchain")
            .set("CMAKE_C_COMPILER", format!("{}gcc", prefix))
            .set("CMAKE_CXX_COMPILER", format!("{}g++", prefix))
            .set_cache("CMAKE_AR", format!("{}ar", prefix), CacheKind::FilePath, "Archiver", false)
            .set_cache(
                "CMAKE_RANLIB",
                format!("{}ranlib", prefix),
                CacheKind::FilePath,
                "Ranlib",
                false,
            )
            .extend(find_root_isolation());
    }
    script
}

/// Zig triplet chain-loading the shared zig toolchain.
pub fn zig_triplet_script(
    arch: &Architecture,
    linkage: Linkage,
    zig_toolchain: &Path,
) -> Result<CMakeScript, TripletError> {
    if arch.zig_target.is_empty() {
        return Err(TripletError::UnknownPackagingMachine {
            machine: arch.vcpkg_machine.to_string(),
        });
    }

    let mut c_flags = format!("-target {}", arch.zig_target);
    if !arch.zig_flags.is_empty() {
        c_flags.push(' ');
        c_flags.push_str(arch.zig_flags);
    }
    c_flags.push_str(" -fPIC");

    let mut script = CMakeScript::new();
    script
        .comment(format!(
            "Auto-generated zig triplet for {} ({})",
            arch.machine, linkage
        ))
        .set("CMAKE_SYSTEM_PROCESSOR", arch.meson.cpu)
        .set("VCPKG_TARGET_ARCHITECTURE", arch.vcpkg_machine)
        .set("VCPKG_CRT_LINKAGE", linkage.as_str())
        .set("VCPKG_LIBRARY_LINKAGE", linkage.as_str())
        .set("VCPKG_CMAKE_SYSTEM_NAME", "Linux")
        .set_quoted("VCPKG_TARGET_TRIPLET", arch.zig_target)
        .set_quoted("ARCH_TARGET", arch.zig_target)
        .set_cache("CMAKE_C_FLAGS", c_flags.clone(), CacheKind::String, "", true)
        .set_cache("CMAKE_CXX_FLAGS", c_flags, CacheKind::String, "", true)
        .set_quoted("VCPKG_CHAINLOAD_TOOLCHAIN_FILE", slash_path(zig_toolchain));
    Ok(script)
}
