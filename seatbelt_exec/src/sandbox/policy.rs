//! Seatbelt profile compilation.
//!
//! Writable roots never appear in the profile text. Each one is bound to a `WRITABLE_ROOT_<i>`
//! template parameter that `sandbox-exec` substitutes itself (`-DWRITABLE_ROOT_<i>=<path>`),
//! so arbitrary path bytes cannot alter the structure of the profile.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::error::SandboxError;
use super::roots::canonicalize_root;

/// Prefix of the template parameter bound to each writable root.
pub const WRITABLE_ROOT_PARAM_PREFIX: &str = "WRITABLE_ROOT_";

/// Read-only baseline shared by every compiled profile.
///
/// Deny by default; reads, exec/fork, self-signalling, `/dev/null` writes and a fixed list of
/// hardware and OS sysctls are allowed.
pub const BASELINE_POLICY: &str = r#"(version 1)

; inspired by Chrome's sandbox policy:
; https://source.chromium.org/chromium/chromium/src/+/main:sandbox/policy/mac/common.sb;l=273-319;drc=7b3962fe2e5fc9e2ee58000dc8fbf3429d84d3bd

; start with closed-by-default
(deny default)

; allow read-only file operations
(allow file-read*)

; child processes inherit the policy of their parent
(allow process-exec)
(allow process-fork)
(allow signal (target self))

(allow file-write-data
  (require-all
    (path "/dev/null")
    (vnode-type CHARACTER-DEVICE)))

; sysctls permitted.
(allow sysctl-read
  (sysctl-name "hw.activecpu")
  (sysctl-name "hw.busfrequency_compat")
  (sysctl-name "hw.byteorder")
  (sysctl-name "hw.cacheconfig")
  (sysctl-name "hw.cachelinesize_compat")
  (sysctl-name "hw.cpufamily")
  (sysctl-name "hw.cpufrequency_compat")
  (sysctl-name "hw.cputype")
  (sysctl-name "hw.l1dcachesize_compat")
  (sysctl-name "hw.l1icachesize_compat")
  (sysctl-name "hw.l2cachesize_compat")
  (sysctl-name "hw.l3cachesize_compat")
  (sysctl-name "hw.logicalcpu_max")
  (sysctl-name "hw.machine")
  (sysctl-name "hw.ncpu")
  (sysctl-name "hw.nperflevels")
  (sysctl-name "hw.optional.arm.FEAT_BF16")
  (sysctl-name "hw.optional.arm.FEAT_DotProd")
  (sysctl-name "hw.optional.arm.FEAT_FCMA")
  (sysctl-name "hw.optional.arm.FEAT_FHM")
  (sysctl-name "hw.optional.arm.FEAT_FP16")
  (sysctl-name "hw.optional.arm.FEAT_I8MM")
  (sysctl-name "hw.optional.arm.FEAT_JSCVT")
  (sysctl-name "hw.optional.arm.FEAT_LSE")
  (sysctl-name "hw.optional.arm.FEAT_RDM")
  (sysctl-name "hw.optional.arm.FEAT_SHA512")
  (sysctl-name "hw.optional.armv8_2_sha512")
  (sysctl-name "hw.memsize")
  (sysctl-name "hw.pagesize")
  (sysctl-name "hw.packages")
  (sysctl-name "hw.pagesize_compat")
  (sysctl-name "hw.physicalcpu_max")
  (sysctl-name "hw.tbfrequency_compat")
  (sysctl-name "hw.vectorunit")
  (sysctl-name "kern.hostname")
  (sysctl-name "kern.maxfilesperproc")
  (sysctl-name "kern.osproductversion")
  (sysctl-name "kern.osrelease")
  (sysctl-name "kern.ostype")
  (sysctl-name "kern.osvariant_status")
  (sysctl-name "kern.osversion")
  (sysctl-name "kern.secure_kernel")
  (sysctl-name "kern.usrstack64")
  (sysctl-name "kern.version")
  (sysctl-name "sysctl.proc_cputype")
  (sysctl-name-prefix "hw.perflevel")
)"#;

/// One writable root bound to a named profile parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyParameter {
    name: String,
    value: PathBuf,
}

impl PolicyParameter {
    fn writable_root(index: usize, value: PathBuf) -> Self {
        Self {
            name: format!("{WRITABLE_ROOT_PARAM_PREFIX}{index}"),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical path bound to this parameter.
    pub fn value(&self) -> &Path {
        &self.value
    }

    /// The `-D<NAME>=<value>` argument understood by `sandbox-exec`.
    ///
    /// Built as an `OsString` so non-UTF-8 paths reach the enforcer byte for byte.
    pub fn to_define_arg(&self) -> OsString {
        let mut arg = OsString::from(format!("-D{}=", self.name));
        arg.push(self.value.as_os_str());
        arg
    }

    fn write_clause(&self) -> String {
        format!("(subpath (param \"{}\"))", self.name)
    }
}

/// A compiled Seatbelt profile together with the parameters it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatbeltPolicy {
    text: String,
    params: Vec<PolicyParameter>,
}

impl SeatbeltPolicy {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[PolicyParameter] {
        &self.params
    }

    /// Number of writable roots (and therefore `file-write*` clauses) in the profile.
    pub fn writable_root_count(&self) -> usize {
        self.params.len()
    }

    pub fn define_args(&self) -> impl Iterator<Item = OsString> + '_ {
        self.params.iter().map(PolicyParameter::to_define_arg)
    }
}

/// Compile `writable_roots` followed by `implicit_roots` into a Seatbelt profile.
///
/// Every root is canonicalized because the kernel resolves symlinks before Seatbelt compares
/// paths. Roots are neither deduplicated nor reordered: the parameter index is the position in
/// the combined list. With no roots at all the baseline is returned unchanged.
pub fn compile<P, Q>(
    writable_roots: &[P],
    implicit_roots: &[Q],
) -> Result<SeatbeltPolicy, SandboxError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let combined = writable_roots
        .iter()
        .map(|root| root.as_ref())
        .chain(implicit_roots.iter().map(|root| root.as_ref()));

    let mut params = Vec::with_capacity(writable_roots.len() + implicit_roots.len());
    for (index, root) in combined.enumerate() {
        params.push(PolicyParameter::writable_root(index, canonicalize_root(root)?));
    }

    let text = if params.is_empty() {
        BASELINE_POLICY.to_string()
    } else {
        let clauses: Vec<String> = params.iter().map(PolicyParameter::write_clause).collect();
        format!("{BASELINE_POLICY}\n(allow file-write*\n{}\n)", clauses.join(" "))
    };

    Ok(SeatbeltPolicy { text, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const NO_ROOTS: &[&str] = &[];

    #[test]
    fn empty_roots_yield_the_baseline() {
        let policy = compile(NO_ROOTS, NO_ROOTS).unwrap();
        assert_eq!(policy.text(), BASELINE_POLICY);
        assert!(policy.params().is_empty());
        assert!(!policy.text().contains("file-write*"));
    }

    #[test]
    fn write_block_matches_the_expected_layout() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let policy = compile(&[a.path()], &[b.path()]).unwrap();

        let expected_tail = "\n(allow file-write*\n\
             (subpath (param \"WRITABLE_ROOT_0\")) (subpath (param \"WRITABLE_ROOT_1\"))\n)";
        assert_eq!(policy.text(), format!("{BASELINE_POLICY}{expected_tail}"));
    }

    #[test]
    fn define_arg_binds_name_to_canonical_path() {
        let dir = tempdir().unwrap();
        let policy = compile(&[dir.path()], NO_ROOTS).unwrap();
        let canonical = std::fs::canonicalize(dir.path()).unwrap();

        let mut expected = OsString::from("-DWRITABLE_ROOT_0=");
        expected.push(canonical.as_os_str());
        assert_eq!(policy.params()[0].to_define_arg(), expected);
    }

    #[test]
    fn baseline_is_deny_by_default_and_read_only() {
        assert!(BASELINE_POLICY.starts_with("(version 1)"));
        assert!(BASELINE_POLICY.contains("(deny default)"));
        assert!(BASELINE_POLICY.contains("(allow file-read*)"));
        assert!(BASELINE_POLICY.contains("(allow signal (target self))"));
        assert!(BASELINE_POLICY.contains("(sysctl-name-prefix \"hw.perflevel\")"));
        assert!(!BASELINE_POLICY.contains("file-write*"));
        assert!(!BASELINE_POLICY.contains("network"));
    }
}
