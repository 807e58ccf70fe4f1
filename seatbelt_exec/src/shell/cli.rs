//! # seatbelt_exec CLI
//!
//! Command-line definition and main entry point.

use crate::config::{self, ExecConfig, SandboxConfig};
use crate::exec::{ExecResult, RawExec, SpawnOptions, Termination};
use crate::sandbox::{self, SeatbeltExecutor};
use crate::utils::logging::init_logging;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Run a command under a macOS Seatbelt profile that only allows writes to chosen directories.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "seatbelt_exec runs a command under /usr/bin/sandbox-exec.

The filesystem stays readable; writes are limited to /dev/null and the writable roots.

Examples:
   seatbelt_exec --writable-root . -- cargo build
   seatbelt_exec --print-policy --writable-root /tmp/work -- true
   seatbelt_exec --probe"
)]
pub struct Cli {
    /// Directory the command may write under (repeatable)
    #[arg(long = "writable-root", short = 'w', value_name = "DIR")]
    pub writable_roots: Vec<PathBuf>,

    /// TOML configuration file with default writable roots and execution settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Kill the command after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Working directory for the command
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Print the compiled policy and its parameters instead of running the command
    #[arg(long)]
    pub print_policy: bool,

    /// Check that sandbox-exec can be applied on this host and exit
    #[arg(long)]
    pub probe: bool,

    /// Print the result as JSON instead of replaying the command's output
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Log to stderr instead of file
    #[arg(long)]
    pub log_to_stderr: bool,

    /// Command to run (after --)
    #[arg(
        value_name = "COMMAND",
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// Writable roots from the command line followed by those from the config file.
    pub fn writable_roots(&self, file_config: &SandboxConfig) -> Vec<PathBuf> {
        self.writable_roots
            .iter()
            .chain(file_config.writable_roots.iter())
            .cloned()
            .collect()
    }

    /// Execution settings from the config file with `--timeout` applied on top.
    pub fn exec_config(&self, file_config: &SandboxConfig) -> ExecConfig {
        let mut exec = file_config.exec.clone();
        if self.timeout.is_some() {
            exec.timeout_seconds = self.timeout;
        }
        exec
    }
}

/// Parse the command line, run the command, and return the process exit code to use.
pub async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    init_logging(log_level, !cli.log_to_stderr)?;

    if cli.probe {
        return match sandbox::probe_enforcer() {
            Ok(()) => {
                println!("{} is available", sandbox::SEATBELT_EXECUTABLE);
                Ok(0)
            }
            Err(e) => sandbox::exit_with_sandbox_error(&e),
        };
    }

    if cli.command.is_empty() {
        return Err(anyhow!(
            "No command given. Usage: seatbelt_exec [OPTIONS] -- <COMMAND>..."
        ));
    }

    let file_config = match &cli.config {
        Some(path) => config::load_from_file(path)?,
        None => SandboxConfig::default(),
    };
    let writable_roots = cli.writable_roots(&file_config);
    let exec_config = cli.exec_config(&file_config);
    let executor = SeatbeltExecutor::<RawExec>::default();

    if cli.print_policy {
        let prepared = executor
            .prepare(&cli.command, &writable_roots)
            .context("Failed to compile sandbox policy")?;
        println!("{}", prepared.policy.text());
        for arg in prepared.policy.define_args() {
            println!("{}", arg.to_string_lossy());
        }
        return Ok(0);
    }

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; cancelling sandboxed command");
            ctrl_c_cancel.cancel();
        }
    });

    let options = SpawnOptions {
        cwd: cli.cwd.clone(),
        ..SpawnOptions::default()
    };

    tracing::info!("Running {:?} with writable roots {:?}", cli.command, writable_roots);

    let result = match executor
        .run(&cli.command, &options, &writable_roots, &exec_config, cancel)
        .await
    {
        Ok(result) => result,
        Err(e) if e.is_environment_error() => sandbox::exit_with_sandbox_error(&e),
        Err(e) => return Err(anyhow::Error::new(e).context("Sandboxed command could not be run")),
    };

    report(&cli, &result)?;
    Ok(exit_code_for(&result))
}

fn report(cli: &Cli, result: &ExecResult) -> Result<()> {
    if cli.json {
        let value = json!({
            "exit_code": result.exit_code,
            "stdout": result.stdout,
            "stderr": result.stderr,
            "termination": format!("{:?}", result.termination),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    std::io::stdout().write_all(result.stdout.as_bytes())?;
    std::io::stderr().write_all(result.stderr.as_bytes())?;
    Ok(())
}

/// Shell-style exit code for a finished command.
pub fn exit_code_for(result: &ExecResult) -> i32 {
    match (result.exit_code, result.termination) {
        (Some(code), _) => code,
        (None, Termination::Cancelled) => 130,
        (None, Termination::TimedOut) => 124,
        (None, Termination::Signaled(signal)) => 128 + signal,
        (None, Termination::Exited) => 1,
    }
}
