use std::path::{Path, PathBuf};

use super::error::SandboxError;

/// Tool directories under `$HOME` that are granted write access whenever something exists there.
///
/// Without `.pyenv`, pyenv fails with "cannot rehash: $HOME/.pyenv/shims isn't writable".
const HOME_TOOL_ROOTS: &[&str] = &[".pyenv"];

/// Writable roots derived from the environment rather than supplied by the caller.
///
/// A tool directory is left out only when nothing exists at its path. Anything else,
/// including a dangling symlink or an unreadable parent, is offered and fails
/// canonicalization as `InvalidWritableRoot`.
pub fn implicit_writable_roots() -> Vec<PathBuf> {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => home_tool_roots(Path::new(&home)),
        _ => {
            tracing::warn!("HOME is not set; no home tool directories will be writable");
            Vec::new()
        }
    }
}

fn home_tool_roots(home: &Path) -> Vec<PathBuf> {
    HOME_TOOL_ROOTS
        .iter()
        .map(|tool| home.join(tool))
        .filter(|path| match std::fs::symlink_metadata(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Skipping absent tool directory {}", path.display());
                false
            }
            _ => true,
        })
        .collect()
}

/// Resolve a writable root to the symlink-free path the kernel checks against.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, SandboxError> {
    std::fs::canonicalize(path).map_err(|source| SandboxError::InvalidWritableRoot {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn home_tool_roots_skips_missing_directories() {
        let home = tempdir().unwrap();
        assert!(home_tool_roots(home.path()).is_empty());

        std::fs::create_dir(home.path().join(".pyenv")).unwrap();
        assert_eq!(
            home_tool_roots(home.path()),
            vec![home.path().join(".pyenv")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_tool_symlink_is_offered_and_rejected() {
        let home = tempdir().unwrap();
        let link = home.path().join(".pyenv");
        std::os::unix::fs::symlink(home.path().join("gone"), &link).unwrap();

        let roots = home_tool_roots(home.path());
        assert_eq!(roots, vec![link.clone()]);

        let no_roots: &[PathBuf] = &[];
        match crate::sandbox::compile(no_roots, &roots) {
            Err(SandboxError::InvalidWritableRoot { path, .. }) => assert_eq!(path, link),
            other => panic!("expected InvalidWritableRoot, got {other:?}"),
        }
    }

    #[test]
    fn canonicalize_root_reports_the_offending_path() {
        let missing = PathBuf::from("/definitely/not/a/real/root");
        match canonicalize_root(&missing) {
            Err(SandboxError::InvalidWritableRoot { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected InvalidWritableRoot, got {other:?}"),
        }
    }
}
