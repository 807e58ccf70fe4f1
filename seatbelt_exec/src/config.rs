//! # Execution Configuration
//!
//! Settings that shape how a sandboxed command is run. They can be built in code or loaded
//! from a TOML file:
//!
//! ```toml
//! writable_roots = ["/Users/me/project", "/private/tmp/scratch"]
//!
//! [exec]
//! timeout_seconds = 300
//! max_output_bytes = 1048576
//! ```
//!
//! - **`ExecConfig`**: runner settings forwarded untouched from the executor to the
//!   [`crate::exec::CommandRunner`].
//! - **`SandboxConfig`**: the file-level layout, adding default writable roots.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output streams larger than this are truncated.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Settings consumed by the subprocess runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecConfig {
    /// Kill the command after this many seconds. `None` waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// Maximum bytes kept per output stream.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ExecConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Configuration file layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Roots granted write access in addition to any given on the command line.
    #[serde(default)]
    pub writable_roots: Vec<PathBuf>,
    #[serde(default)]
    pub exec: ExecConfig,
}

impl SandboxConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse sandbox configuration")
    }
}

/// Load a [`SandboxConfig`] from a TOML file.
pub fn load_from_file(path: &Path) -> Result<SandboxConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    SandboxConfig::from_toml_str(&contents)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}
