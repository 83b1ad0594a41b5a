//! Build list computation: plain minimal version selection, upgrade-all, and
//! selective upgrade.
//!
//! Every module version reachable from the target is explored exactly once,
//! and each path's selected version is the join of every version of it seen
//! along the way. Selected versions only move upward through a finite set, so
//! the walk terminates on cyclic graphs without any cycle detection beyond the
//! set of explored modules.

use std::collections::{HashMap, HashSet, VecDeque};

use modsel_core::errors::{ModselError, ModselResult};
use modsel_core::module::{self, ModuleVersion};
use modsel_core::version::Version;

use crate::cache::CachedReqs;
use crate::reqs::{Override, Reqs};

/// The build list for `target`: the target itself, then the selected version
/// of every module it needs, sorted by path.
pub fn build_list<R: Reqs + ?Sized>(
    target: &ModuleVersion,
    reqs: &R,
) -> ModselResult<Vec<ModuleVersion>> {
    let reqs = CachedReqs::new(reqs);
    build_list_with(target, &reqs, |r| Ok(r.clone()))
}

/// The build list for `target` with every required module raised to at least
/// its latest known version.
pub fn upgrade_all<R: Reqs + ?Sized>(
    target: &ModuleVersion,
    reqs: &R,
) -> ModselResult<Vec<ModuleVersion>> {
    let reqs = CachedReqs::new(reqs);
    build_list_with(target, &reqs, |r| {
        let latest = reqs.latest(&r.path)?;
        Ok(ModuleVersion::new(
            r.path.clone(),
            reqs.max(&r.version, &latest.version),
        ))
    })
}

/// The build list for `target` as if it additionally required each module
/// version in `upgrades`.
///
/// The target's own requirements stay in force, so requirements of the
/// versions being replaced still contribute to the result.
pub fn upgrade<R: Reqs + ?Sized>(
    target: &ModuleVersion,
    reqs: &R,
    upgrades: &[ModuleVersion],
) -> ModselResult<Vec<ModuleVersion>> {
    check_target(target)?;
    let mut list = reqs.required(target)?;
    list.extend(upgrades.iter().cloned());
    let overridden = Override::new(target.clone(), list, reqs);
    build_list(target, &overridden)
}

/// Like [`upgrade`], raising each named path to its latest known version.
pub fn upgrade_to_latest<R: Reqs + ?Sized>(
    target: &ModuleVersion,
    reqs: &R,
    paths: &[&str],
) -> ModselResult<Vec<ModuleVersion>> {
    check_target(target)?;
    let upgrades = paths
        .iter()
        .map(|path| reqs.latest(path))
        .collect::<ModselResult<Vec<_>>>()?;
    upgrade(target, reqs, &upgrades)
}

/// Reject targets whose identity is malformed before any traversal.
pub(crate) fn check_target(target: &ModuleVersion) -> ModselResult<()> {
    match &target.version {
        Version::None => Err(ModselError::InvalidVersion {
            version: target.version.to_string(),
        }),
        Version::Unversioned => module::check_path(&target.path),
        Version::Tagged(v) => module::check(&target.path, v),
    }
}

/// Whether a requirement of some module in `target`'s graph is followed.
/// Requirements at `none` and requirements on the target's own path are not:
/// the target always wins.
pub(crate) fn follows(target: &ModuleVersion, r: &ModuleVersion) -> bool {
    !r.version.is_none() && r.path != target.path
}

/// The shared traversal. `upgrade` maps each requirement edge to the module
/// version actually explored for it.
fn build_list_with<R, F>(
    target: &ModuleVersion,
    reqs: &CachedReqs<'_, R>,
    upgrade: F,
) -> ModselResult<Vec<ModuleVersion>>
where
    R: Reqs + ?Sized,
    F: Fn(&ModuleVersion) -> ModselResult<ModuleVersion>,
{
    check_target(target)?;

    let mut selected: HashMap<String, Version> = HashMap::new();
    let mut edges: HashMap<ModuleVersion, Vec<ModuleVersion>> = HashMap::new();
    let mut explored: HashSet<ModuleVersion> = HashSet::from([target.clone()]);
    let mut queue: VecDeque<ModuleVersion> = VecDeque::from([target.clone()]);

    while let Some(m) = queue.pop_front() {
        let required = reqs.required(&m)?;
        let mut next = Vec::with_capacity(required.len());
        for r in &required {
            if !follows(target, r) {
                tracing::trace!("{m} requires {r}; not followed from {target}");
                continue;
            }
            let r = upgrade(r)?;
            let version = match selected.get(&r.path) {
                Some(current) => reqs.max(current, &r.version),
                None => r.version.clone(),
            };
            if selected.get(&r.path) != Some(&version) {
                tracing::trace!("selecting {}@{version} (required by {m})", r.path);
                selected.insert(r.path.clone(), version);
            }
            if explored.insert(r.clone()) {
                queue.push_back(r.clone());
            }
            next.push(r);
        }
        edges.insert(m, next);
    }

    // Keep only paths still reachable through the selected versions.
    let mut list = vec![target.clone()];
    let mut listed: HashSet<&str> = HashSet::from([target.path.as_str()]);
    let mut i = 0;
    while i < list.len() {
        if let Some(required) = edges.get(&list[i]) {
            for r in required {
                if listed.insert(r.path.as_str()) {
                    let version = selected
                        .get(&r.path)
                        .cloned()
                        .unwrap_or_else(|| r.version.clone());
                    list.push(ModuleVersion::new(r.path.clone(), version));
                }
            }
        }
        i += 1;
    }
    list[1..].sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        "build list for {target}: {} modules from {} explored ({} requirement queries)",
        list.len(),
        explored.len(),
        reqs.len()
    );
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_target_rejected() {
        let target = ModuleVersion::new("example.com/app", Version::None);
        assert!(matches!(
            check_target(&target),
            Err(ModselError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn tagged_target_checked_against_path() {
        assert!(check_target(&ModuleVersion::new("example.com/app/v2", "v2.1.0")).is_ok());
        assert!(matches!(
            check_target(&ModuleVersion::new("example.com/app/v2", "v1.1.0")),
            Err(ModselError::MismatchedMajor { .. })
        ));
    }

    #[test]
    fn followed_requirements() {
        let target = ModuleVersion::unversioned("example.com/app");
        assert!(follows(&target, &ModuleVersion::new("example.com/lib", "v1.0.0")));
        assert!(!follows(&target, &ModuleVersion::new("example.com/lib", Version::None)));
        assert!(!follows(&target, &ModuleVersion::new("example.com/app", "v1.3.0")));
    }

    #[test]
    fn unversioned_target_needs_valid_path() {
        assert!(check_target(&ModuleVersion::unversioned("example.com/app")).is_ok());
        assert!(check_target(&ModuleVersion::unversioned("app")).is_err());
    }
}
