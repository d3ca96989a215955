//! Command implementations

pub mod completions;
pub mod cross_file;
pub mod engine;
pub mod fetch;
pub mod manifest;
pub mod packages;
pub mod plan;
pub mod triplet;

use anyhow::Result;

use crate::cli::SessionArgs;
use crossport::ops::Session;
use crossport::util::GlobalContext;

/// Open a session for the project enclosing the working directory.
pub fn open_session(args: &SessionArgs) -> Result<Session> {
    let ctx = GlobalContext::new()?;
    Session::open(&ctx, args.options())
}

/// True when platform filtering left nothing to build; the command then
/// succeeds without touching vcpkg.
pub fn nothing_to_build(session: &Session) -> bool {
    if session.plan().is_empty() {
        tracing::info!(
            "no modules to build for platform {}, nothing to do",
            session.target.platform
        );
        return true;
    }
    false
}
