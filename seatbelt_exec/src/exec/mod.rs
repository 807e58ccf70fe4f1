//! # Subprocess Runner Boundary
//!
//! The sandbox executor never spawns processes itself. It assembles a command line and hands
//! it to a [`CommandRunner`] together with the caller's spawn options, configuration and
//! cancellation token. [`RawExec`] is the default runner built on `tokio::process`.

mod raw;
mod types;

use async_trait::async_trait;
use std::ffi::OsString;
use tokio_util::sync::CancellationToken;

pub use crate::config::ExecConfig;
pub use raw::RawExec;
pub use types::{ExecError, ExecResult, SpawnOptions, Termination};

/// Executes a fully assembled command line.
///
/// Implementations own the process lifecycle: spawning, output capture, and termination
/// when `cancel` fires or the configured timeout elapses.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(
        &self,
        argv: &[OsString],
        options: &SpawnOptions,
        config: &ExecConfig,
        cancel: CancellationToken,
    ) -> Result<ExecResult, ExecError>;
}
