//! `crossport cross-file` command
//!
//! Writes the CMake cross toolchain, the pkg-config wrapper and a Meson
//! cross file for a cross-linux target.

use anyhow::{bail, Result};

use crate::cli::CrossFileArgs;
use crate::commands::open_session;
use crossport::core::Compiler;
use crossport::cross::meson::{write_cross_file, MesonCrossFile};
use crossport::cross::pkgconfig::write_wrapper;
use crossport::cross::toolchain::{generate_cross_toolchain, probe_sysroot};

pub fn execute(args: CrossFileArgs) -> Result<()> {
    let session = open_session(&args.session)?;
    let target = &session.target;
    if !target.is_cross_linux() {
        bail!(
            "`{}` is not a cross-linux target (host: {} {})",
            target,
            target.host_machine,
            target.host_libc
        );
    }

    let tools = session.host_tools();
    let triplet = session.triplet()?;

    if let Some(toolchain) = generate_cross_toolchain(&session.layout, target, &tools)? {
        println!("{}", toolchain.display());
    }

    let wrapper = write_wrapper(&session.layout, &triplet.name, &tools)?;
    let sys_root = if target.compiler == Compiler::Zig {
        None
    } else {
        probe_sysroot(target, &tools)?
    };
    let cross = MesonCrossFile::for_target(target, Some(&wrapper), sys_root)?;

    let dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| session.layout.overlay_dir());
    let path = write_cross_file(&dir, target, &cross)?;
    println!("{}", path.display());
    Ok(())
}
