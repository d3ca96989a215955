//! Test utilities and mocks for crossport unit tests.
//!
//! This module provides mock implementations of the two seams that touch the
//! outside world: the packaging engine and host tool probing.
//!
//! # Example
//!
//! ```rust,ignore
//! use crossport::test_support::{MockEngine, MockHostTools};
//!
//! #[test]
//! fn test_example() {
//!     let engine = MockEngine::new(layout.manifest_path()).with_exit_codes([0, 2]);
//!     let tools = MockHostTools::new().with_binary("pkg-config");
//!
//!     // Drive an InstallOrchestrator with the mocks...
//!     assert_eq!(engine.calls().len(), 2);
//! }
//! ```

pub mod fixtures;

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::cross::{HostTools, SysrootProbe};
use crate::ops::install::{EngineCommand, EngineOutcome, PackageEngine};
use crate::vcpkg::manifest::Manifest;

/// One recorded engine invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The command as the orchestrator issued it.
    pub command: EngineCommand,
    /// The manifest on disk at the moment of the call, if any.
    pub manifest: Option<Manifest>,
}

/// Mock packaging engine.
///
/// Records every invocation together with a snapshot of the manifest, and
/// replays scripted outcomes in order. Calls beyond the script exit with 0.
#[derive(Debug, Clone)]
pub struct MockEngine {
    manifest_path: PathBuf,
    outcomes: Arc<Mutex<VecDeque<EngineOutcome>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    missing: bool,
}

impl MockEngine {
    /// Create an engine that snapshots the manifest at `manifest_path`.
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        MockEngine {
            manifest_path: manifest_path.into(),
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            missing: false,
        }
    }

    /// Queue exit codes for the next calls.
    pub fn with_exit_codes(self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .extend(codes.into_iter().map(EngineOutcome::Exited));
        self
    }

    /// Queue a timeout for the next call.
    pub fn with_timeout(self) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(EngineOutcome::TimedOut);
        self
    }

    /// Make `check` fail as if the engine were not deployed.
    pub fn missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl PackageEngine for MockEngine {
    fn name(&self) -> String {
        "vcpkg".to_string()
    }

    fn check(&self) -> Result<()> {
        if self.missing {
            return Err(crate::ops::InstallError::MissingEngine {
                path: PathBuf::from("vcpkg"),
            }
            .into());
        }
        Ok(())
    }

    fn run(&self, command: &EngineCommand) -> Result<EngineOutcome> {
        let manifest = read_manifest(&self.manifest_path);
        self.calls.lock().unwrap().push(RecordedCall {
            command: command.clone(),
            manifest,
        });
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(EngineOutcome::Exited(0)))
    }
}

fn read_manifest(path: &Path) -> Option<Manifest> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

/// Mock host probing.
///
/// Only registered binaries are found, each at `/usr/bin/<name>`. The sysroot
/// probe answers the same way for every compiler.
#[derive(Debug, Clone)]
pub struct MockHostTools {
    binaries: HashSet<String>,
    sysroot: SysrootProbe,
}

impl MockHostTools {
    pub fn new() -> Self {
        MockHostTools {
            binaries: HashSet::new(),
            sysroot: SysrootProbe::Missing,
        }
    }

    pub fn with_binary(mut self, name: &str) -> Self {
        self.binaries.insert(name.to_string());
        self
    }

    pub fn with_sysroot(mut self, sysroot: &str) -> Self {
        self.sysroot = SysrootProbe::Found(sysroot.to_string());
        self
    }

    pub fn with_sysroot_timeout(mut self) -> Self {
        self.sysroot = SysrootProbe::TimedOut;
        self
    }
}

impl Default for MockHostTools {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTools for MockHostTools {
    fn which(&self, name: &str) -> Option<PathBuf> {
        self.binaries
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }

    fn sysroot(&self, _compiler: &str) -> SysrootProbe {
        self.sysroot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn command(arg: &str) -> EngineCommand {
        EngineCommand {
            args: vec![arg.to_string()],
            env: BTreeMap::new(),
            cwd: PathBuf::from("/tmp"),
            timeout: None,
        }
    }

    #[test]
    fn test_mock_engine_replays_outcomes() {
        let engine = MockEngine::new("/nonexistent/vcpkg.json")
            .with_exit_codes([4])
            .with_timeout();

        assert_eq!(engine.run(&command("a")).unwrap(), EngineOutcome::Exited(4));
        assert_eq!(engine.run(&command("b")).unwrap(), EngineOutcome::TimedOut);
        assert_eq!(engine.run(&command("c")).unwrap(), EngineOutcome::Exited(0));

        let calls = engine.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].command.args, ["b"]);
        assert!(calls[0].manifest.is_none());
    }

    #[test]
    fn test_mock_engine_missing() {
        assert!(MockEngine::new("vcpkg.json").missing().check().is_err());
    }

    #[test]
    fn test_mock_host_tools() {
        let tools = MockHostTools::new().with_binary("pkg-config");
        assert_eq!(tools.which("pkg-config"), Some(PathBuf::from("/usr/bin/pkg-config")));
        assert_eq!(tools.which("gcc"), None);
        assert_eq!(tools.sysroot("gcc"), SysrootProbe::Missing);
        assert_eq!(
            tools.with_sysroot("/sys").sysroot("gcc"),
            SysrootProbe::Found("/sys".to_string())
        );
    }
}
