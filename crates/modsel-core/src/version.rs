//! Semantic version syntax and the join order over versions.
//!
//! Versions take the form `vMAJOR[.MINOR[.PATCH[-prerelease][+build]]]`:
//! - The `v` prefix is mandatory
//! - `vN` and `vN.M` are shorthands for `vN.0.0` and `vN.M.0` and carry no
//!   pre-release or build suffix
//! - Precedence follows semantic versioning, build metadata is ignored
//!
//! Two sentinels sit below every real version: [`Version::None`] (nothing
//! selected) and [`Version::Unversioned`] (the root being built).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// String form of the [`Version::None`] sentinel.
pub const NONE: &str = "none";

/// A module version, or one of the two sentinels below all real versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Version {
    /// No version selected or known.
    None,
    /// The unversioned root of a build.
    #[default]
    Unversioned,
    /// A version string as declared, for example `v1.2.3`.
    Tagged(String),
}

impl Version {
    pub fn as_str(&self) -> &str {
        match self {
            Version::None => NONE,
            Version::Unversioned => "",
            Version::Tagged(v) => v,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Version::None)
    }

    pub fn is_unversioned(&self) -> bool {
        matches!(self, Version::Unversioned)
    }

    /// Rank of the variant in the join order.
    fn rank(&self) -> u8 {
        match self {
            Version::None => 0,
            Version::Unversioned => 1,
            Version::Tagged(_) => 2,
        }
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        match s {
            NONE => Version::None,
            "" => Version::Unversioned,
            v => Version::Tagged(v.to_string()),
        }
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        match s.as_str() {
            NONE => Version::None,
            "" => Version::Unversioned,
            _ => Version::Tagged(s),
        }
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        match v {
            Version::Tagged(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Version::Tagged(a), Version::Tagged(b)) => compare(a, b).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The later of two versions.
///
/// Commutative: versions of equal precedence that differ only in build
/// metadata are ordered by their raw text.
pub fn join(v1: &Version, v2: &Version) -> Version {
    if v1 >= v2 {
        v1.clone()
    } else {
        v2.clone()
    }
}

/// Parse a `v`-prefixed version into a full semantic version.
fn parse(v: &str) -> Option<semver::Version> {
    let rest = v.strip_prefix('v')?;
    let core_end = rest.find(['-', '+']).unwrap_or(rest.len());
    let expanded = match rest[..core_end].matches('.').count() {
        2 => rest.to_string(),
        1 if core_end == rest.len() => format!("{rest}.0"),
        0 if core_end == rest.len() => format!("{rest}.0.0"),
        _ => return None,
    };
    semver::Version::parse(&expanded).ok()
}

/// Whether `v` is a syntactically valid semantic version.
pub fn is_valid(v: &str) -> bool {
    parse(v).is_some()
}

/// The major version prefix of `v`, such as `v2`, or `None` if invalid.
pub fn major(v: &str) -> Option<String> {
    parse(v).map(|p| format!("v{}", p.major))
}

/// Compare two version strings by semantic-version precedence.
///
/// Invalid versions compare equal to each other and below every valid one.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => (a.major, a.minor, a.patch)
            .cmp(&(b.major, b.minor, b.patch))
            .then_with(|| a.pre.cmp(&b.pre)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_versions() {
        assert!(is_valid("v1"));
        assert!(is_valid("v1.2"));
        assert!(!is_valid("v1-pre"));
        assert!(!is_valid("v1.2+meta"));
        assert_eq!(compare("v1", "v1.0.0"), Ordering::Equal);
        assert_eq!(compare("v1.2", "v1.2.0"), Ordering::Equal);
    }

    #[test]
    fn rejects_malformed() {
        assert!(!is_valid(""));
        assert!(!is_valid("1.0.0"));
        assert!(!is_valid("v01.0.0"));
        assert!(!is_valid("v1.0.0.0"));
        assert!(!is_valid("v1."));
        assert!(!is_valid("vx.y.z"));
    }

    #[test]
    fn precedence_ordering() {
        assert_eq!(compare("v1.0.0", "v1.0.1"), Ordering::Less);
        assert_eq!(compare("v1.10.0", "v1.9.0"), Ordering::Greater);
        assert_eq!(compare("v1.0.0-alpha", "v1.0.0"), Ordering::Less);
        assert_eq!(compare("v1.0.0-alpha", "v1.0.0-alpha.1"), Ordering::Less);
        assert_eq!(compare("v1.0.0-beta.2", "v1.0.0-beta.11"), Ordering::Less);
        assert_eq!(compare("v1.0.0+a", "v1.0.0+b"), Ordering::Equal);
        assert_eq!(compare("bogus", "v0.0.1"), Ordering::Less);
    }

    #[test]
    fn sentinels_below_everything() {
        let tagged = Version::from("v0.0.1");
        assert!(Version::None < Version::Unversioned);
        assert!(Version::Unversioned < tagged);
        assert_eq!(join(&Version::None, &tagged), tagged);
        assert_eq!(join(&tagged, &Version::Unversioned), tagged);
    }

    #[test]
    fn join_is_commutative_on_build_metadata() {
        let a = Version::from("v1.0.0+a");
        let b = Version::from("v1.0.0+b");
        assert_eq!(join(&a, &b), join(&b, &a));
    }

    #[test]
    fn string_forms() {
        assert_eq!(Version::from("none"), Version::None);
        assert_eq!(Version::from(""), Version::Unversioned);
        assert_eq!(Version::from("v1.2.3").to_string(), "v1.2.3");
        assert_eq!(String::from(Version::None), "none");
    }

    #[test]
    fn major_component() {
        assert_eq!(major("v2.1.0").as_deref(), Some("v2"));
        assert_eq!(major("v0.3").as_deref(), Some("v0"));
        assert_eq!(major("junk"), None);
    }
}
