//! Architecture table for cross-compilation.
//!
//! Static facts per supported CPU: toolchain prefixes per libc, the zig
//! target, the vcpkg machine token, and meson host-machine info.

use crate::core::target::Libc;

/// Meson `[host_machine]` facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MesonCpu {
    pub cpu_family: &'static str,
    pub cpu: &'static str,
    pub endian: &'static str,
}

/// One supported CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Architecture {
    /// Canonical machine key (e.g. `arm64`)
    pub machine: &'static str,
    /// GCC toolchain prefix for glibc targets
    pub gcc_gnu: &'static str,
    /// GCC toolchain prefix for musl targets
    pub gcc_musl: &'static str,
    /// `zig cc -target` value
    pub zig_target: &'static str,
    /// Extra flags zig needs for this target
    pub zig_flags: &'static str,
    /// Machine token used in vcpkg triplet names
    pub vcpkg_machine: &'static str,
    pub meson: MesonCpu,
}

impl Architecture {
    /// GCC toolchain prefix for the given libc (empty when none exists).
    pub fn gcc_prefix(&self, libc: Libc) -> &'static str {
        match libc {
            Libc::Gnu => self.gcc_gnu,
            Libc::Musl => self.gcc_musl,
        }
    }

    /// Machine name as spelled in GNU triplets (e.g. `arm32` -> `arm`).
    pub fn gnu_machine(&self) -> &'static str {
        GNU_MACHINE_NAMES
            .iter()
            .find(|(machine, _)| *machine == self.machine)
            .map(|(_, gnu)| *gnu)
            .unwrap_or(self.machine)
    }
}

const fn arch(
    machine: &'static str,
    gcc_gnu: &'static str,
    gcc_musl: &'static str,
    zig_target: &'static str,
    zig_flags: &'static str,
    vcpkg_machine: &'static str,
    meson: (&'static str, &'static str, &'static str),
) -> Architecture {
    Architecture {
        machine,
        gcc_gnu,
        gcc_musl,
        zig_target,
        zig_flags,
        vcpkg_machine,
        meson: MesonCpu {
            cpu_family: meson.0,
            cpu: meson.1,
            endian: meson.2,
        },
    }
}

/// Alternative machine spellings and their canonical key.
pub const MACHINE_ALIASES: &[(&str, &str)] = &[
    ("aarch64", "arm64"),
    ("amd64", "x86_64"),
    ("x64", "x86_64"),
    ("i686", "i386"),
    ("armv7l", "arm32"),
    ("armv6l", "arm32"),
    ("arm", "arm32"),
];

const GNU_MACHINE_NAMES: &[(&str, &str)] = &[("arm32", "arm"), ("arm64", "aarch64")];

/// 64-bit machines and their 32-bit counterpart, for `--arch 32`.
const WIDTH_32_COUNTERPARTS: &[(&str, &str)] = &[
    ("x86_64", "x86"),
    ("arm64", "arm32"),
    ("riscv64", "riscv32"),
];

/// Libraries provided by musl itself; linking them explicitly is an error.
pub const MUSL_BUILTIN_LIBS: &[&str] = &["pthread", "m", "dl", "rt", "crypt", "util", "xnet", "resolv"];

#[rustfmt::skip]
const ARCHITECTURES: &[Architecture] = &[
    arch("x86_64",      "x86_64-linux-gnu-",       "x86_64-linux-musl-",      "x86_64-linux-musl",      "",                  "x64",         ("x86_64", "x86_64", "little")),
    arch("x86",         "i686-linux-gnu-",         "i686-linux-musl-",        "i686-linux-musl",        "",                  "x86",         ("x86", "i686", "little")),
    arch("i386",        "i686-linux-gnu-",         "i686-linux-musl-",        "i386-linux-musl",        "",                  "x86",         ("x86", "i386", "little")),
    arch("arm32",       "arm-linux-gnueabihf-",    "arm-linux-musleabihf-",   "arm-linux-musleabihf",   "-mcpu=generic+v7a", "arm",         ("arm", "armv7", "little")),
    arch("arm64",       "aarch64-linux-gnu-",      "aarch64-linux-musl-",     "aarch64-linux-musl",     "",                  "arm64",       ("aarch64", "aarch64", "little")),
    arch("riscv64",     "riscv64-linux-gnu-",      "riscv64-linux-musl-",     "riscv64-linux-musl",     "",                  "riscv64",     ("riscv64", "riscv64", "little")),
    arch("riscv32",     "riscv32-linux-gnu-",      "riscv32-linux-musl-",     "riscv32-linux-musl",     "",                  "riscv32",     ("riscv32", "riscv32", "little")),
    arch("loongarch64", "loongarch64-linux-gnu-",  "loongarch64-linux-musl-", "loongarch64-linux-musl", "",                  "loongarch64", ("loongarch64", "loongarch64", "little")),
    arch("mips64el",    "mips64el-linux-gnuabi64-", "mips64el-linux-musl-",   "mips64el-linux-musl",    "",                  "mips64",      ("mips64", "mips64", "little")),
    arch("s390x",       "s390x-linux-gnu-",        "s390x-linux-musl-",       "s390x-linux-musl",       "",                  "s390x",       ("s390x", "s390x", "big")),
    arch("ppc64le",     "powerpc64le-linux-gnu-",  "powerpc64le-linux-musl-", "powerpc64le-linux-musl", "",                  "ppc64le",     ("ppc64", "ppc64le", "little")),
];

/// Every supported architecture, in table order.
pub fn all() -> &'static [Architecture] {
    ARCHITECTURES
}

/// Map an alias (`aarch64`, `amd64`, ...) to its canonical machine key.
///
/// Unknown names are returned unchanged (lowercased).
pub fn normalize_machine(machine: &str) -> String {
    let lower = machine.to_lowercase();
    MACHINE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lower)
}

/// Look up an architecture by machine name or alias.
pub fn lookup(machine: &str) -> Option<&'static Architecture> {
    let canonical = normalize_machine(machine);
    ARCHITECTURES.iter().find(|a| a.machine == canonical)
}

/// vcpkg machine token for a machine; unknown machines keep their own name.
pub fn vcpkg_machine(machine: &str) -> String {
    lookup(machine)
        .map(|a| a.vcpkg_machine.to_string())
        .unwrap_or_else(|| normalize_machine(machine))
}

/// Reverse lookup: the first architecture using the given vcpkg machine token.
pub fn from_vcpkg_machine(vcpkg_machine: &str) -> Option<&'static Architecture> {
    ARCHITECTURES.iter().find(|a| a.vcpkg_machine == vcpkg_machine)
}

/// The 32-bit counterpart of a 64-bit machine (identity for others).
pub fn to_32bit(machine: &str) -> String {
    let canonical = normalize_machine(machine);
    WIDTH_32_COUNTERPARTS
        .iter()
        .find(|(wide, _)| *wide == canonical)
        .map(|(_, narrow)| narrow.to_string())
        .unwrap_or(canonical)
}

/// Whether a library is built into musl libc.
pub fn is_musl_builtin(lib: &str) -> bool {
    MUSL_BUILTIN_LIBS.contains(&lib)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_machine("aarch64"), "arm64");
        assert_eq!(normalize_machine("AMD64"), "x86_64");
        assert_eq!(normalize_machine("armv7l"), "arm32");
        assert_eq!(normalize_machine("riscv64"), "riscv64");
    }

    #[test]
    fn test_lookup_facts() {
        let arm = lookup("arm").unwrap();
        assert_eq!(arm.machine, "arm32");
        assert_eq!(arm.gcc_prefix(Libc::Musl), "arm-linux-musleabihf-");
        assert_eq!(arm.zig_flags, "-mcpu=generic+v7a");
        assert_eq!(arm.gnu_machine(), "arm");

        let s390x = lookup("s390x").unwrap();
        assert_eq!(s390x.meson.endian, "big");
    }

    #[test]
    fn test_vcpkg_machine_round_trip() {
        assert_eq!(vcpkg_machine("x86_64"), "x64");
        assert_eq!(from_vcpkg_machine("x64").unwrap().machine, "x86_64");
        // x86 and i386 share a token; the first table entry wins.
        assert_eq!(from_vcpkg_machine("x86").unwrap().machine, "x86");
        assert_eq!(vcpkg_machine("sparc"), "sparc");
    }

    #[test]
    fn test_to_32bit() {
        assert_eq!(to_32bit("x86_64"), "x86");
        assert_eq!(to_32bit("aarch64"), "arm32");
        assert_eq!(to_32bit("arm32"), "arm32");
    }
}
