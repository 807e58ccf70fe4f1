//! # Seatbelt Sandboxing for Command Execution
//!
//! Confines a command with macOS Seatbelt (`sandbox-exec`). The filesystem is readable
//! everywhere; writes are limited to `/dev/null` and an explicit list of writable roots.
//!
//! ## Architecture
//!
//! - [`policy::compile`] turns writable roots into a [`SeatbeltPolicy`]: the fixed
//!   [`BASELINE_POLICY`] plus one `file-write*` clause per root, each bound to a
//!   `WRITABLE_ROOT_<i>` parameter. Pure apart from symlink resolution.
//! - [`SeatbeltExecutor`] compiles the profile, checks the enforcer at
//!   [`SEATBELT_EXECUTABLE`], assembles the command line and delegates to a
//!   [`crate::exec::CommandRunner`].
//!
//! There is no unsandboxed fallback. Without a working `/usr/bin/sandbox-exec` every run
//! fails with [`SandboxError::EnforcerUnavailable`].

mod error;
pub mod policy;
mod prerequisites;
mod roots;
mod seatbelt;

pub use error::SandboxError;
pub use policy::{
    BASELINE_POLICY, PolicyParameter, SeatbeltPolicy, WRITABLE_ROOT_PARAM_PREFIX, compile,
};
pub use prerequisites::{
    SEATBELT_EXECUTABLE, check_enforcer_available, exit_with_sandbox_error, probe_enforcer,
};
pub use roots::{canonicalize_root, implicit_writable_roots};
pub use seatbelt::{SandboxedCommand, SeatbeltExecutor, assemble_command, exec_with_seatbelt};
