//! `crossport triplet` command

use anyhow::Result;

use crate::cli::SessionArgs;
use crate::commands::open_session;

pub fn execute(args: SessionArgs) -> Result<()> {
    let session = open_session(&args)?;
    let triplet = session.triplet()?;
    println!("{} ({})", triplet.name, triplet.kind);
    Ok(())
}
