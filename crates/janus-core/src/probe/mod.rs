//! Path identity probing.
//!
//! A bundler can end up treating one file as two modules when different
//! resolution calls disagree about its canonical form: drive-letter casing,
//! `\\?\` extended-length prefixes, or symlinked directories. The probe
//! compares a working directory and a list of candidate paths across the
//! portable and platform-native calls and reports every divergence.
//!
//! Nothing in here fails: each resolution attempt is individually guarded
//! and failures become text in the report.

mod resolve;

pub use resolve::{
    drive_prefix, has_extended_length_prefix, is_symlink, native_realpath, portable_realpath,
    portable_resolve, EXTENDED_LENGTH_PREFIX,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Report schema version. Bump when changing JSON structure.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Warning severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
}

/// A diagnostic warning with a stable code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code (e.g., `DRIVE_PREFIX_MISMATCH`).
    pub code: String,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warn(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Warn,
            message: message.into(),
        }
    }
}

/// Stable warning codes. These are part of the public API and must not
/// change; new codes may be added in future versions.
pub mod codes {
    pub const DRIVE_PREFIX_MISMATCH: &str = "DRIVE_PREFIX_MISMATCH";
    pub const EXTENDED_LENGTH_PREFIX: &str = "EXTENDED_LENGTH_PREFIX";
    pub const UNKNOWN_OS_VERSION: &str = "UNKNOWN_OS_VERSION";
}

/// Outcome of a single resolution attempt.
///
/// Failures never abort the probe; they are carried as text and rendered
/// inline next to the values that did resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Attempt {
    Ok(String),
    Error(String),
}

impl Attempt {
    fn from_io(result: io::Result<PathBuf>) -> Self {
        match result {
            Ok(path) => Self::Ok(path.to_string_lossy().into_owned()),
            Err(err) => Self::Error(err.to_string()),
        }
    }

    /// The resolved string, if the attempt succeeded.
    #[must_use]
    pub fn ok(&self) -> Option<&str> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Error(_) => None,
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(value) => f.write_str(value),
            Self::Error(message) => write!(f, "ERROR: {message}"),
        }
    }
}

/// The working directory seen through each resolution call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CwdReport {
    /// The raw working directory string.
    pub raw: String,
    /// Absolute form, symlinks untouched.
    pub resolved: Attempt,
    /// Symlink-following canonical form, portable call.
    pub real: Attempt,
    /// Symlink-following canonical form, platform-native call.
    pub native_real: Attempt,
}

impl CwdReport {
    fn collect(cwd: &Path) -> Self {
        Self {
            raw: cwd.to_string_lossy().into_owned(),
            resolved: Attempt::from_io(portable_resolve(cwd)),
            real: Attempt::from_io(portable_realpath(cwd)),
            native_real: Attempt::from_io(native_realpath(cwd)),
        }
    }

    /// Whether the raw cwd matches `attempt` exactly as a string.
    /// `None` when the attempt failed.
    #[must_use]
    pub fn matches(&self, attempt: &Attempt) -> Option<bool> {
        attempt.ok().map(|value| value == self.raw)
    }
}

/// Verdict for a single candidate path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PathVerdict {
    /// Every view agrees and the path is not a symlink.
    Ok,
    /// At least one view disagrees, or the path is a symlink.
    Mismatch {
        real: String,
        native_real: String,
        symlink: bool,
    },
    /// A resolution call failed for this path.
    Error { message: String },
}

/// One candidate path and its verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathCheck {
    pub path: String,
    pub verdict: PathVerdict,
}

impl PathCheck {
    /// Check a single path. Any failing call yields the `Error` verdict for
    /// the whole path; otherwise the values decide between `Ok` and
    /// `Mismatch`.
    fn collect(path: &Path) -> Self {
        let display = path.to_string_lossy().into_owned();
        let verdict = match Self::inspect(path, &display) {
            Ok(verdict) => verdict,
            Err(err) => PathVerdict::Error {
                message: err.to_string(),
            },
        };
        Self {
            path: display,
            verdict,
        }
    }

    fn inspect(path: &Path, display: &str) -> io::Result<PathVerdict> {
        let real = portable_realpath(path)?.to_string_lossy().into_owned();
        let native_real = native_realpath(path)?.to_string_lossy().into_owned();
        let symlink = is_symlink(path)?;

        if display != real || display != native_real || symlink {
            Ok(PathVerdict::Mismatch {
                real,
                native_real,
                symlink,
            })
        } else {
            Ok(PathVerdict::Ok)
        }
    }
}

/// Host environment, collected via file reads only (no subprocesses).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub os: String,
    pub arch: String,
    pub version: Option<String>,
}

fn collect_host(warnings: &mut Vec<Warning>) -> HostInfo {
    let version = os_version();

    if version.is_none() {
        warnings.push(Warning::info(
            codes::UNKNOWN_OS_VERSION,
            "Could not determine OS version",
        ));
    }

    HostInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        version,
    }
}

#[cfg(target_os = "linux")]
fn os_version() -> Option<String> {
    std::fs::read_to_string("/etc/os-release")
        .ok()
        .and_then(|content| {
            content.lines().find_map(|line| {
                line.strip_prefix("PRETTY_NAME=")
                    .map(|value| value.trim_matches('"').to_string())
            })
        })
}

#[cfg(not(target_os = "linux"))]
fn os_version() -> Option<String> {
    None
}

/// Complete probe report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Schema version for this report format.
    pub report_schema_version: u32,
    pub host: HostInfo,
    pub cwd: CwdReport,
    pub checks: Vec<PathCheck>,
    pub warnings: Vec<Warning>,
}

impl ProbeReport {
    /// Probe `cwd` and the default candidate list underneath it.
    #[must_use]
    pub fn collect(cwd: &Path) -> Self {
        let candidates: Vec<PathBuf> = crate::config::TraceConfig::default()
            .probe_paths
            .iter()
            .map(|candidate| cwd.join(candidate))
            .collect();
        Self::collect_with(cwd, &candidates)
    }

    /// Probe `cwd` plus an explicit candidate list. The cwd itself is always
    /// the first check.
    #[must_use]
    pub fn collect_with(cwd: &Path, candidates: &[PathBuf]) -> Self {
        let mut warnings = Vec::new();
        let host = collect_host(&mut warnings);
        let cwd_report = CwdReport::collect(cwd);

        let mut checks = Vec::with_capacity(candidates.len() + 1);
        checks.push(PathCheck::collect(cwd));
        for candidate in candidates {
            checks.push(PathCheck::collect(candidate));
        }

        prefix_heuristics(&cwd_report, &mut warnings);

        Self {
            report_schema_version: REPORT_SCHEMA_VERSION,
            host,
            cwd: cwd_report,
            checks,
            warnings,
        }
    }
}

/// Drive-letter and extended-length prefix heuristics over the cwd views.
/// Both point at a known class of Windows path-identity bug; neither is
/// fatal.
fn prefix_heuristics(cwd: &CwdReport, warnings: &mut Vec<Warning>) {
    let Some(native) = cwd.native_real.ok() else {
        return;
    };

    if drive_prefix(&cwd.raw) != drive_prefix(native) {
        warnings.push(Warning::warn(
            codes::DRIVE_PREFIX_MISMATCH,
            format!(
                "cwd prefix {:?} differs from native realpath prefix {:?}; the same file can \
                 resolve under two module ids",
                drive_prefix(&cwd.raw),
                drive_prefix(native)
            ),
        ));
    }

    if has_extended_length_prefix(native) {
        warnings.push(Warning::warn(
            codes::EXTENDED_LENGTH_PREFIX,
            format!("native realpath uses the \\\\?\\ prefix: {native}"),
        ));
    }
}
