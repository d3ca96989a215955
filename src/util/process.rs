//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Interval between polls of a child running under a deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set several environment variables.
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command with captured output and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.output()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))
    }

    /// Execute with captured output, killing the child once `timeout` elapses.
    ///
    /// Both pipes are drained on their own threads while the child runs, so a
    /// chatty child cannot stall on a full pipe. Returns `Ok(None)` when the
    /// deadline was hit.
    pub fn exec_with_timeout(&self, timeout: Duration) -> Result<Option<Output>> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let Some(mut child) = self.wait_until(child, timeout)? else {
            return Ok(None);
        };
        let status = child
            .wait()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;

        Ok(Some(Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        }))
    }

    /// Execute with inherited stdio and return the exit status.
    ///
    /// With a timeout, the child is killed at the deadline and `Ok(None)` is returned.
    pub fn status_with_timeout(&self, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
        let mut cmd = self.build_command();

        let Some(timeout) = timeout else {
            let status = cmd
                .status()
                .with_context(|| format!("failed to execute `{}`", self.program.display()))?;
            return Ok(Some(status));
        };

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        match self.wait_until(child, timeout)? {
            Some(mut child) => {
                let status = child
                    .wait()
                    .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Poll the child until it exits or the deadline passes.
    ///
    /// Returns the (exited) child, or `None` after killing it at the deadline.
    fn wait_until(&self, mut child: Child, timeout: Duration) -> Result<Option<Child>> {
        let deadline = Instant::now() + timeout;
        loop {
            let exited = child
                .try_wait()
                .with_context(|| format!("failed to poll `{}`", self.program.display()))?
                .is_some();
            if exited {
                return Ok(Some(child));
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "`{}` exceeded its {}s time budget, killing it",
                    self.display_command(),
                    timeout.as_secs()
                );
                // The child may exit between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Read a pipe to its end on a background thread.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error just truncates the captured output.
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
