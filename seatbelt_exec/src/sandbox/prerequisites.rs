use std::path::Path;

use super::error::SandboxError;

/// The only `sandbox-exec` ever invoked.
///
/// Resolving through `PATH` would let anyone who controls the environment substitute their own
/// binary. Replacing the file under `/usr/bin` already requires root.
pub const SEATBELT_EXECUTABLE: &str = "/usr/bin/sandbox-exec";

/// Check that the Seatbelt enforcer is present and executable.
///
/// Fails on every host without `/usr/bin/sandbox-exec`, which is what keeps the executor from
/// ever running a command unsandboxed.
pub fn check_enforcer_available() -> Result<(), SandboxError> {
    check_executable(Path::new(SEATBELT_EXECUTABLE))
}

pub(super) fn check_executable(path: &Path) -> Result<(), SandboxError> {
    let unavailable = |reason: String| SandboxError::EnforcerUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(path).map_err(|e| unavailable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unavailable("not a regular file".to_string()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(unavailable("not executable".to_string()));
        }
    }

    Ok(())
}

/// Apply a permissive profile to `/usr/bin/true` to confirm `sandbox-exec` actually works here.
///
/// Detects running inside another sandbox (Cursor, VS Code, Docker), where `sandbox_apply`
/// is refused even though the binary exists.
pub fn probe_enforcer() -> Result<(), SandboxError> {
    check_enforcer_available()?;

    let output = std::process::Command::new(SEATBELT_EXECUTABLE)
        .args(["-p", "(version 1)(allow default)", "--", "/usr/bin/true"])
        .output()
        .map_err(|e| SandboxError::EnforcerUnavailable {
            path: SEATBELT_EXECUTABLE.into(),
            reason: e.to_string(),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    tracing::debug!("sandbox-exec probe failed: {}", stderr);
    let reason = if stderr.contains("Operation not permitted")
        || stderr.contains("sandbox_apply")
        || output.status.code() == Some(71)
    {
        "nested sandbox detected (running inside another sandbox)".to_string()
    } else {
        format!("probe exited with {}: {}", output.status, stderr.trim())
    };
    Err(SandboxError::EnforcerUnavailable {
        path: SEATBELT_EXECUTABLE.into(),
        reason,
    })
}

pub fn exit_with_sandbox_error(error: &SandboxError) -> ! {
    eprintln!("\n\u{274c} SECURITY ERROR: Refusing to run command\n");
    eprintln!("Reason: {}\n", error);
    std::process::exit(1);
}
