//! `crossport list` and `crossport tree` commands
//!
//! Both write the manifest first, then hand over to vcpkg.

use anyhow::Result;

use crate::cli::SessionArgs;
use crate::commands::{nothing_to_build, open_session};

pub fn list(args: SessionArgs) -> Result<()> {
    let session = open_session(&args)?;
    if nothing_to_build(&session) {
        return Ok(());
    }
    let triplet = session.triplet()?;
    let engine = session.engine();
    let tools = session.host_tools();
    session.orchestrator(&triplet, &engine, &tools).list()
}

pub fn tree(args: SessionArgs) -> Result<()> {
    let session = open_session(&args)?;
    if nothing_to_build(&session) {
        return Ok(());
    }
    let triplet = session.triplet()?;
    let engine = session.engine();
    let tools = session.host_tools();
    session.orchestrator(&triplet, &engine, &tools).tree()
}
