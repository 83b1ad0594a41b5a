//! Module identity: module paths, versions, and the rule binding a path's
//! `/vN` suffix to the major component of the versions it may carry.
//!
//! A path such as `rsc.io/quote/v2` only corresponds to `v2.x.y` versions,
//! while `rsc.io/quote` only corresponds to `v0.x.y` and `v1.x.y`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{ModselError, ModselResult};
use crate::version::{self, Version};

/// A module path paired with a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersion {
    pub path: String,
    #[serde(default)]
    pub version: Version,
}

impl ModuleVersion {
    pub fn new(path: impl Into<String>, version: impl Into<Version>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    /// The unversioned module for `path`, used for build targets.
    pub fn unversioned(path: impl Into<String>) -> Self {
        Self::new(path, Version::Unversioned)
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Version::Unversioned => f.write_str(&self.path),
            v => write!(f, "{}@{}", self.path, v),
        }
    }
}

/// The specific rule a malformed module path breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathViolation {
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("empty string")]
    Empty,
    #[error("leading slash")]
    LeadingSlash,
    #[error("missing dot in first path element")]
    MissingDot,
    #[error("trailing dot in first path element")]
    TrailingDot,
    #[error("leading dot in first path element")]
    LeadingDot,
    #[error("leading dash in first path element")]
    LeadingDash,
    #[error("double dot")]
    DoubleDot,
    #[error("double slash")]
    DoubleSlash,
    #[error("invalid char {0:?} in first path element")]
    InvalidFirstElementChar(char),
    #[error("trailing slash")]
    TrailingSlash,
    #[error("invalid char {0:?}")]
    InvalidChar(char),
    #[error("invalid version {0}")]
    InvalidMajorSuffix(String),
}

/// Whether `c` may appear in the first path element, a domain name.
fn first_element_char_ok(c: char) -> bool {
    c == '-' || c == '.' || c.is_ascii_alphanumeric()
}

/// Whether `c` may appear anywhere in a module path.
///
/// ASCII is limited to a safe punctuation set; other code points must be
/// printable.
fn path_char_ok(c: char) -> bool {
    if c.is_ascii() {
        return matches!(c, '+' | ',' | '-' | '.' | '/' | '_' | '~') || c.is_ascii_alphanumeric();
    }
    !c.is_control() && !c.is_whitespace() && !is_format_char(c)
}

/// Invisible formatting code points that are never printable.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
    )
}

fn violation(path: &str, violation: PathViolation) -> ModselError {
    ModselError::InvalidPath {
        path: path.to_string(),
        violation,
    }
}

/// Check that a module path is valid.
pub fn check_path(path: &str) -> ModselResult<()> {
    if path.is_empty() {
        return Err(violation(path, PathViolation::Empty));
    }

    let first = path.split('/').next().unwrap_or(path);
    if first.is_empty() {
        return Err(violation(path, PathViolation::LeadingSlash));
    }
    if !first.contains('.') {
        return Err(violation(path, PathViolation::MissingDot));
    }
    if first.ends_with('.') {
        return Err(violation(path, PathViolation::TrailingDot));
    }
    if path.starts_with('.') {
        return Err(violation(path, PathViolation::LeadingDot));
    }
    if path.starts_with('-') {
        return Err(violation(path, PathViolation::LeadingDash));
    }
    if path.contains("..") {
        return Err(violation(path, PathViolation::DoubleDot));
    }
    if path.contains("//") {
        return Err(violation(path, PathViolation::DoubleSlash));
    }
    if let Some(c) = first.chars().find(|&c| !first_element_char_ok(c)) {
        return Err(violation(path, PathViolation::InvalidFirstElementChar(c)));
    }
    if path.ends_with('/') {
        return Err(violation(path, PathViolation::TrailingSlash));
    }
    if let Some(c) = path.chars().find(|&c| !path_char_ok(c)) {
        return Err(violation(path, PathViolation::InvalidChar(c)));
    }
    if split_path_version(path).is_none() {
        let last = path.rsplit('/').next().unwrap_or(path);
        return Err(violation(
            path,
            PathViolation::InvalidMajorSuffix(last.to_string()),
        ));
    }
    Ok(())
}

/// Check raw path bytes, rejecting anything that is not UTF-8.
pub fn check_path_bytes(path: &[u8]) -> ModselResult<()> {
    match std::str::from_utf8(path) {
        Ok(path) => check_path(path),
        Err(_) => Err(violation(
            &String::from_utf8_lossy(path),
            PathViolation::InvalidUtf8,
        )),
    }
}

/// Split a path into its prefix and its `/vN` major suffix.
///
/// The suffix is empty when the path does not end in a version-like element.
/// Returns `None` when the trailing element looks like a version but is not a
/// valid major suffix (`/v0`, `/v1`, `/v01`, `/v2.0`).
pub fn split_path_version(path: &str) -> Option<(&str, &str)> {
    let bytes = path.as_bytes();
    let mut i = bytes.len();
    let mut dot = false;
    while i > 0 && (bytes[i - 1].is_ascii_digit() || bytes[i - 1] == b'.') {
        if bytes[i - 1] == b'.' {
            dot = true;
        }
        i -= 1;
    }
    if i <= 1 || bytes[i - 1] != b'v' || bytes[i - 2] != b'/' {
        return Some((path, ""));
    }
    let (prefix, major) = path.split_at(i - 2);
    if dot || major.len() <= 2 || major.as_bytes()[2] == b'0' || major == "/v1" {
        return None;
    }
    Some((prefix, major))
}

/// Check that a path and version are each valid and correspond.
pub fn check(path: &str, version: &str) -> ModselResult<()> {
    check_path(path)?;
    if !version::is_valid(version) {
        return Err(ModselError::InvalidVersion {
            version: version.to_string(),
        });
    }
    let path_major = split_path_version(path)
        .map(|(_, major)| major)
        .unwrap_or_default();
    if !matches_path_major(version, path_major) {
        let want = match path_major.strip_prefix('/') {
            Some(major) => major,
            None => "v0 or v1",
        };
        return Err(ModselError::MismatchedMajor {
            path: path.to_string(),
            version: version.to_string(),
            want: want.to_string(),
        });
    }
    Ok(())
}

/// Whether `version` belongs to the major family named by `path_major`.
pub fn matches_path_major(version: &str, path_major: &str) -> bool {
    let Some(major) = version::major(version) else {
        return false;
    };
    match path_major.strip_prefix('/') {
        None if path_major.is_empty() => major == "v0" || major == "v1",
        None => false,
        Some(suffix) => major == suffix,
    }
}
