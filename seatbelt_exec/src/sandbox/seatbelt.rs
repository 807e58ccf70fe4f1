use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use super::error::SandboxError;
use super::policy::{self, SeatbeltPolicy};
use super::prerequisites::{SEATBELT_EXECUTABLE, check_enforcer_available};
use super::roots::implicit_writable_roots;
use crate::exec::{CommandRunner, ExecConfig, ExecResult, RawExec, SpawnOptions};

/// A command wrapped in `sandbox-exec`, ready to hand to a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedCommand {
    pub policy: SeatbeltPolicy,
    pub argv: Vec<OsString>,
}

/// Build `sandbox-exec -p <policy> -D... -- <command...>`.
pub fn assemble_command<S>(policy: &SeatbeltPolicy, command: &[S]) -> Vec<OsString>
where
    S: AsRef<OsStr>,
{
    let mut argv = Vec::with_capacity(4 + policy.params().len() + command.len());
    argv.push(OsString::from(SEATBELT_EXECUTABLE));
    argv.push(OsString::from("-p"));
    argv.push(OsString::from(policy.text()));
    argv.extend(policy.define_args());
    argv.push(OsString::from("--"));
    argv.extend(command.iter().map(|arg| arg.as_ref().to_os_string()));
    argv
}

/// Runs commands under a Seatbelt profile compiled per invocation.
///
/// Holds no process state: each [`run`](Self::run) compiles, assembles and delegates to the
/// runner, which owns spawning and cancellation.
#[derive(Debug, Clone)]
pub struct SeatbeltExecutor<R = RawExec> {
    runner: R,
    implicit_roots: Vec<PathBuf>,
}

impl Default for SeatbeltExecutor<RawExec> {
    fn default() -> Self {
        Self::new(RawExec)
    }
}

impl<R: CommandRunner> SeatbeltExecutor<R> {
    /// Executor whose implicit roots come from the environment (see [`implicit_writable_roots`]).
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            implicit_roots: implicit_writable_roots(),
        }
    }

    /// Replace the environment-derived implicit roots.
    pub fn with_implicit_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.implicit_roots = roots;
        self
    }

    pub fn implicit_roots(&self) -> &[PathBuf] {
        &self.implicit_roots
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Compile the profile and assemble the wrapped command without running anything.
    pub fn prepare<S, P>(
        &self,
        command: &[S],
        writable_roots: &[P],
    ) -> Result<SandboxedCommand, SandboxError>
    where
        S: AsRef<OsStr>,
        P: AsRef<Path>,
    {
        if command.is_empty() {
            return Err(SandboxError::EmptyCommand);
        }
        let policy = policy::compile(writable_roots, self.implicit_roots.as_slice())?;
        let argv = assemble_command(&policy, command);
        Ok(SandboxedCommand { policy, argv })
    }

    /// Run `command` with write access limited to `writable_roots` plus the implicit roots.
    ///
    /// Every root is resolved and the enforcer is checked before the runner is called, so a
    /// bad root or a missing `sandbox-exec` never starts a process. `options`, `config` and
    /// `cancel` reach the runner untouched.
    pub async fn run<S, P>(
        &self,
        command: &[S],
        options: &SpawnOptions,
        writable_roots: &[P],
        config: &ExecConfig,
        cancel: CancellationToken,
    ) -> Result<ExecResult, SandboxError>
    where
        S: AsRef<OsStr>,
        P: AsRef<Path>,
    {
        let SandboxedCommand { policy, argv } = self.prepare(command, writable_roots)?;
        check_enforcer_available()?;

        tracing::debug!("{}", policy_summary(&policy));
        tracing::trace!(
            "Seatbelt template params: {:?}",
            policy.define_args().collect::<Vec<_>>()
        );

        Ok(self.runner.execute(&argv, options, config, cancel).await?)
    }
}

/// Run `command` under Seatbelt with the default [`RawExec`] runner.
pub async fn exec_with_seatbelt<S, P>(
    command: &[S],
    options: &SpawnOptions,
    writable_roots: &[P],
    config: &ExecConfig,
    cancel: CancellationToken,
) -> Result<ExecResult, SandboxError>
where
    S: AsRef<OsStr>,
    P: AsRef<Path>,
{
    SeatbeltExecutor::<RawExec>::default()
        .run(command, options, writable_roots, config, cancel)
        .await
}

/// Log line for a compiled policy. Parameter values are canonical paths, so only their count
/// appears here.
fn policy_summary(policy: &SeatbeltPolicy) -> String {
    format!(
        "Running seatbelt with policy: {} and {} template params",
        policy.text(),
        policy.writable_root_count()
    )
}
