//! Meson cross file.
//!
//! Built from the architecture table's meson facts and the target's
//! toolchain prefix.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::core::arch::{self, MesonCpu};
use crate::core::target::{BuildTarget, Compiler};
use crate::util::fs::{slash_path, write_string};

/// A binary entry: one program, or a program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MesonBinary {
    pub name: &'static str,
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MesonCrossFile {
    pub binaries: Vec<MesonBinary>,
    pub system: String,
    pub cpu: MesonCpu,
    pub sys_root: Option<String>,
}

impl MesonCrossFile {
    /// Cross file for a target. `pkg_config` overrides the pkg-config binary.
    pub fn for_target(target: &BuildTarget, pkg_config: Option<&Path>, sys_root: Option<String>) -> Result<Self> {
        let arch = arch::lookup(&target.machine)
            .ok_or_else(|| anyhow!("unknown machine `{}` for meson cross file", target.machine))?;

        let mut binaries = Vec::new();
        if target.compiler == Compiler::Zig {
            for (name, driver) in [("c", "cc"), ("cpp", "c++")] {
                binaries.push(MesonBinary {
                    name,
                    command: vec![
                        "zig".to_string(),
                        driver.to_string(),
                        "-target".to_string(),
                        arch.zig_target.to_string(),
                    ],
                });
            }
            for (name, tool) in [("ar", "ar"), ("ranlib", "ranlib")] {
                binaries.push(MesonBinary {
                    name,
                    command: vec!["zig".to_string(), tool.to_string()],
                });
            }
        } else {
            let prefix = arch.gcc_prefix(target.libc);
            for (name, tool) in [("c", "gcc"), ("cpp", "g++"), ("ar", "ar"), ("strip", "strip")] {
                binaries.push(MesonBinary {
                    name,
                    command: vec![format!("{}{}", prefix, tool)],
                });
            }
        }
        binaries.push(MesonBinary {
            name: "pkg-config",
            command: vec![pkg_config
                .map(slash_path)
                .unwrap_or_else(|| "pkg-config".to_string())],
        });

        Ok(MesonCrossFile {
            binaries,
            system: target.platform.clone(),
            cpu: arch.meson,
            sys_root,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::from("[binaries]\n");
        for binary in &self.binaries {
            let value = match binary.command.as_slice() {
                [single] => quote(single),
                many => format!(
                    "[{}]",
                    many.iter().map(|s| quote(s)).collect::<Vec<_>>().join(", ")
                ),
            };
            out.push_str(&format!("{} = {}\n", binary.name, value));
        }

        out.push_str("\n[host_machine]\n");
        out.push_str(&format!("system = {}\n", quote(&self.system)));
        out.push_str(&format!("cpu_family = {}\n", quote(self.cpu.cpu_family)));
        out.push_str(&format!("cpu = {}\n", quote(self.cpu.cpu)));
        out.push_str(&format!("endian = {}\n", quote(self.cpu.endian)));

        if let Some(sys_root) = &self.sys_root {
            out.push_str("\n[properties]\n");
            out.push_str(&format!("sys_root = {}\n", quote(sys_root)));
        }
        out
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "\\'"))
}

/// File name of the cross file for a machine.
pub fn cross_file_name(machine: &str) -> String {
    format!("meson-cross-{}.ini", machine)
}

/// Write the cross file into `dir`.
pub fn write_cross_file(dir: &Path, target: &BuildTarget, cross: &MesonCrossFile) -> Result<PathBuf> {
    let path = dir.join(cross_file_name(&target.machine));
    write_string(&path, &cross.render())?;
    tracing::info!("generated meson cross file at: {}", path.display());
    Ok(path)
}
