//! `crossport manifest` command

use anyhow::Result;

use crate::cli::SessionArgs;
use crate::commands::open_session;

pub fn execute(args: SessionArgs) -> Result<()> {
    let session = open_session(&args)?;
    print!("{}", session.manifest().to_json()?);
    Ok(())
}
