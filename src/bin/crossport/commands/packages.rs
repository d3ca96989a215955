//! `crossport packages` command
//!
//! Maps the external libraries to a distribution's package names, for
//! installing them with the system package manager instead of vcpkg.

use anyhow::{bail, Result};

use crate::cli::PackagesArgs;
use crate::commands::open_session;
use crossport::core::host::detect_package_manager;
use crossport::ops::extlibs::vendor_packages;

pub fn execute(args: PackagesArgs) -> Result<()> {
    let session = open_session(&args.session)?;

    let manager = if args.pkgdep == "auto" {
        match detect_package_manager() {
            Some(manager) => {
                tracing::info!("detected package manager: {}", manager);
                manager
            }
            None => bail!("could not detect the host package manager, pass --pkgdep <manager>"),
        }
    } else {
        args.pkgdep.clone()
    };

    let (mapped, warnings) = vendor_packages(&session.app, &manager, &session.libraries.libraries);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    for name in mapped.packages.keys() {
        println!("{}", name);
    }
    Ok(())
}
