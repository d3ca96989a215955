//! `crossport fetch` command

use anyhow::Result;

use crate::cli::SessionArgs;
use crate::commands::{nothing_to_build, open_session};

pub fn execute(args: SessionArgs) -> Result<()> {
    let session = open_session(&args)?;
    if nothing_to_build(&session) {
        return Ok(());
    }
    let triplet = session.triplet()?;
    let engine = session.engine();
    let tools = session.host_tools();

    if session.libraries.is_empty() {
        tracing::info!("no external libraries to fetch");
    }
    session.orchestrator(&triplet, &engine, &tools).fetch()?;

    println!(
        "fetched {} external libraries for {} into {}",
        session.libraries.len(),
        triplet,
        session.layout.extlib_dir.display()
    );
    Ok(())
}
