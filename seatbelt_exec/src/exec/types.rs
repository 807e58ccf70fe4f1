use std::collections::HashMap;
use std::path::PathBuf;

/// Process-level options applied when spawning the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Working directory; the parent's when `None`.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    pub env: HashMap<String, String>,
    /// Start from the parent's environment before applying `env`.
    pub inherit_env: bool,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: HashMap::new(),
            inherit_env: true,
        }
    }
}

impl SpawnOptions {
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// How the process came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process exited on its own.
    Exited,
    /// The process was killed by a signal it did not request from us.
    Signaled(i32),
    /// The cancellation token fired, before or during execution.
    Cancelled,
    /// The configured timeout elapsed.
    TimedOut,
}

/// Outcome of a command that the runner was able to launch (or deliberately skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub termination: Termination,
}

impl ExecResult {
    /// Result for a command that was never started because cancellation came first.
    pub fn cancelled_before_start() -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            termination: Termination::Cancelled,
        }
    }

    pub fn success(&self) -> bool {
        self.termination == Termination::Exited && self.exit_code == Some(0)
    }

    pub fn was_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }

    /// Convert an unsuccessful outcome into the matching [`ExecError`].
    pub fn into_result(self) -> Result<Self, ExecError> {
        match self.termination {
            Termination::Exited if self.exit_code == Some(0) => Ok(self),
            Termination::Exited => Err(ExecError::NonZeroExit {
                code: self.exit_code.unwrap_or(-1),
                stderr: self.stderr,
            }),
            Termination::Signaled(signal) => Err(ExecError::Signaled { signal }),
            Termination::Cancelled => Err(ExecError::Cancelled),
            Termination::TimedOut => Err(ExecError::TimedOut),
        }
    }
}

/// Failures reported by a [`super::CommandRunner`].
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("No program to execute")]
    EmptyArgv,

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command exited with code {code}: {}", .stderr.trim())]
    NonZeroExit { code: i32, stderr: String },

    #[error("Command was killed by signal {signal}")]
    Signaled { signal: i32 },

    #[error("Command was cancelled")]
    Cancelled,

    #[error("Command timed out")]
    TimedOut,
}
