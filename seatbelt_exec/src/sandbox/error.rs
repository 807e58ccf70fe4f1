use std::path::PathBuf;

use crate::exec::ExecError;

/// Errors specific to sandbox operations
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Writable root '{}' cannot be resolved to a canonical path: {source}", .path.display())]
    InvalidWritableRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Seatbelt enforcer '{}' is unavailable: {reason}", .path.display())]
    EnforcerUnavailable { path: PathBuf, reason: String },

    #[error("Refusing to run an empty command under the sandbox")]
    EmptyCommand,

    #[error("Sandboxed command failed: {0}")]
    TargetExecution(#[from] ExecError),
}

impl SandboxError {
    /// True when the failure lies in the sandbox environment or its inputs rather than in the
    /// sandboxed program's own outcome.
    pub fn is_environment_error(&self) -> bool {
        !matches!(self, SandboxError::TargetExecution(_))
    }
}
