use std::{env, path::PathBuf, process::Stdio};

use tokio::process::Command as Process;
use tracing::{debug, instrument};

use super::CliError;

const FORWARDED_ENV: [&str; 2] = ["APP_ENV", "NODE_ENV"];

/// Captured result of a command run in a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildOutput {
    /// Everything the child wrote to stdout.
    pub stdout: String,
    /// Everything the child wrote to stderr.
    pub stderr: String,
    /// Exit code, `-1` when the child was terminated by a signal.
    pub exit_code: i32,
}

/// Runs commands in a separate OS process with its own registry.
///
/// The child runs `entrypoint <command tokens...>`. A non-zero exit is
/// reported through [`ChildOutput::exit_code`], never as an error.
#[derive(Debug, Clone)]
pub struct ChildInvoker {
    entrypoint: PathBuf,
    forward_env: bool,
    current_dir: Option<PathBuf>,
}

impl ChildInvoker {
    /// Invoker for an explicit entrypoint binary.
    pub fn new(entrypoint: impl Into<PathBuf>) -> Self {
        Self {
            entrypoint: entrypoint.into(),
            forward_env: true,
            current_dir: None,
        }
    }

    /// Invoker for the currently running executable.
    ///
    /// # Errors
    /// Returns `CliError::IoError` if the executable path is unavailable
    pub fn current() -> Result<Self, CliError> {
        Ok(Self::new(env::current_exe()?))
    }

    /// Whether `APP_ENV`/`NODE_ENV` reach the child. On by default.
    pub fn forward_env(mut self, forward: bool) -> Self {
        self.forward_env = forward;
        self
    }

    /// Working directory of the child, which decides its rc file.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Binary the child runs.
    pub fn entrypoint(&self) -> &PathBuf {
        &self.entrypoint
    }

    /// Runs `command` (split like a shell would) and waits for it.
    ///
    /// # Errors
    /// Returns `CliError::ChildProcess` if the command string cannot be split
    /// or the process cannot be spawned
    #[instrument(skip(self), fields(entrypoint = %self.entrypoint.display()))]
    pub async fn call(&self, command: &str) -> Result<ChildOutput, CliError> {
        let failed = |details: String| CliError::ChildProcess {
            entrypoint: self.entrypoint.clone(),
            details,
        };

        let tokens = shell_words::split(command).map_err(|e| failed(e.to_string()))?;

        let mut process = Process::new(&self.entrypoint);
        process
            .args(&tokens)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.current_dir {
            process.current_dir(dir);
        }

        if !self.forward_env {
            for name in FORWARDED_ENV {
                process.env_remove(name);
            }
        }

        let output = process
            .output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(exit_code, "Child process finished");

        Ok(ChildOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}
