//! # seatbelt_exec
//!
//! Runs commands under a macOS Seatbelt profile compiled from a list of writable roots.
//!
//! The crate is split in two halves:
//!
//! - [`sandbox`]: a pure policy compiler (writable roots to SBPL profile plus `-D` template
//!   parameters) and an executor that wraps a command with `/usr/bin/sandbox-exec`.
//! - [`exec`]: the subprocess runner boundary. The executor only assembles the command line
//!   and hands it to a [`exec::CommandRunner`]; [`exec::RawExec`] is the default runner.
//!
//! ```no_run
//! # async fn demo() -> Result<(), seatbelt_exec::sandbox::SandboxError> {
//! use seatbelt_exec::exec::{ExecConfig, SpawnOptions};
//! use seatbelt_exec::sandbox::exec_with_seatbelt;
//! use tokio_util::sync::CancellationToken;
//!
//! let result = exec_with_seatbelt(
//!     &["echo".to_string(), "hi".to_string()],
//!     &SpawnOptions::default(),
//!     &["/tmp/work"],
//!     &ExecConfig::default(),
//!     CancellationToken::new(),
//! )
//! .await?;
//! assert_eq!(result.stdout, "hi\n");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod exec;
pub mod sandbox;
pub mod shell;
pub mod utils;
