use async_trait::async_trait;
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::CommandRunner;
use super::types::{ExecError, ExecResult, SpawnOptions, Termination};
use crate::config::ExecConfig;

/// After killing an interrupted child, keep collecting output this long.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 8192;

/// Default runner: spawns the command with `tokio::process` and collects both output streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawExec;

enum Outcome {
    Finished(ExitStatus),
    Interrupted(Termination),
}

#[async_trait]
impl CommandRunner for RawExec {
    async fn execute(
        &self,
        argv: &[OsString],
        options: &SpawnOptions,
        config: &ExecConfig,
        cancel: CancellationToken,
    ) -> Result<ExecResult, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyArgv)?;

        if cancel.is_cancelled() {
            tracing::info!("Cancelled before {:?} was spawned; not starting it", program);
            return Ok(ExecResult::cancelled_before_start());
        }

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        if !options.inherit_env {
            cmd.env_clear();
        }
        cmd.envs(&options.env);

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;
        tracing::debug!("Spawned {:?} (pid {:?})", program, child.id());

        let mut stdout = OutputCapture::start(child.stdout.take(), config.max_output_bytes);
        let mut stderr = OutputCapture::start(child.stderr.take(), config.max_output_bytes);

        // One deadline covers both waiting for the child and draining its output.
        let deadline = config.timeout().map(|timeout| Instant::now() + timeout);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Outcome::Interrupted(Termination::Cancelled),
            _ = sleep_until_or_forever(deadline) => Outcome::Interrupted(Termination::TimedOut),
            status = child.wait() => Outcome::Finished(status?),
        };

        let (exit_code, termination) = match outcome {
            Outcome::Finished(status) => {
                // Background grandchildren can keep the pipes open after the child exits.
                let interrupted = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Some(Termination::Cancelled),
                    _ = sleep_until_or_forever(deadline) => Some(Termination::TimedOut),
                    _ = wait_for_eof(&mut stdout, &mut stderr) => None,
                };
                match interrupted {
                    None => (status.code(), termination_of(status)),
                    Some(termination) => {
                        tracing::info!(
                            "{:?} exited but its output stayed open: {:?}",
                            program,
                            termination
                        );
                        (None, termination)
                    }
                }
            }
            Outcome::Interrupted(termination) => {
                tracing::info!("Stopping {:?}: {:?}", program, termination);
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill {:?}: {}", program, e);
                }
                let drained = wait_for_eof(&mut stdout, &mut stderr);
                let _ = tokio::time::timeout(DRAIN_GRACE, drained).await;
                (None, termination)
            }
        };

        Ok(ExecResult {
            exit_code,
            stdout: stdout.take(),
            stderr: stderr.take(),
            termination,
        })
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn wait_for_eof(stdout: &mut OutputCapture, stderr: &mut OutputCapture) {
    stdout.wait().await;
    stderr.wait().await;
}

fn termination_of(status: ExitStatus) -> Termination {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Termination::Signaled(signal);
        }
    }
    #[cfg(not(unix))]
    let _ = status;
    Termination::Exited
}

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Background reader for one output stream, capped at `limit` bytes.
struct OutputCapture {
    buffer: SharedBuffer,
    task: Option<JoinHandle<()>>,
}

impl OutputCapture {
    fn start<R>(stream: Option<R>, limit: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = SharedBuffer::default();
        let task = stream.map(|stream| tokio::spawn(drain(stream, Arc::clone(&buffer), limit)));
        Self { buffer, task }
    }

    /// Wait until the reader hits EOF. Cancel-safe: the reader keeps running if dropped.
    async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            let _ = task.await;
            self.task = None;
        }
    }

    /// Stop the reader if it is still running and decode what it has seen so far.
    fn take(self) -> String {
        if let Some(task) = self.task {
            task.abort();
        }
        let bytes = {
            let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *buffer)
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Reads until EOF. Bytes past `limit` are discarded so the child never blocks on a full pipe.
async fn drain<R: AsyncRead + Unpin>(mut stream: R, buffer: SharedBuffer, limit: usize) {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                let room = limit.saturating_sub(buffer.len());
                buffer.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                tracing::debug!("Stopped reading command output: {}", e);
                break;
            }
        }
    }
}
