//! Downgrading a target's requirements under per-path version caps.

use std::collections::{HashMap, HashSet};

use modsel_core::errors::ModselResult;
use modsel_core::module::ModuleVersion;
use modsel_core::version::Version;

use crate::cache::CachedReqs;
use crate::reqs::{Override, Reqs};
use crate::resolver::{build_list, check_target, follows};

/// The build list for `target` with no module above the version given for
/// its path in `caps`.
///
/// Paths whose every version exceeds its cap are absent from the result.
/// Every requirement of every listed module is still met by the list.
pub fn downgrade<R: Reqs + ?Sized>(
    target: &ModuleVersion,
    reqs: &R,
    caps: &[ModuleVersion],
) -> ModselResult<Vec<ModuleVersion>> {
    let reqs = CachedReqs::new(reqs);
    let list = downgrade_requirements(target, &reqs, caps)?;
    let overridden = Override::new(target.clone(), list[1..].to_vec(), &reqs);
    build_list(target, &overridden)
}

/// Compute a new requirement list for `target` under which no module
/// exceeds the version given for its path in `caps`.
///
/// Returns the target followed by its downgraded direct requirements. Each
/// direct requirement that exceeds a cap, or transitively requires a module
/// that does, is stepped back through [`Reqs::previous`] until it fits, and
/// dropped when no earlier version remains. [`downgrade`] resolves this list
/// into a build list.
pub fn downgrade_requirements<R: Reqs + ?Sized>(
    target: &ModuleVersion,
    reqs: &R,
    caps: &[ModuleVersion],
) -> ModselResult<Vec<ModuleVersion>> {
    check_target(target)?;
    let reqs = CachedReqs::new(reqs);
    let list: Vec<ModuleVersion> = reqs
        .required(target)?
        .into_iter()
        .filter(|r| follows(target, r))
        .collect();

    let mut max: HashMap<String, Version> = list
        .iter()
        .map(|r| (r.path.clone(), r.version.clone()))
        .collect();
    for cap in caps {
        let lowers = match max.get(&cap.path) {
            Some(v) => reqs.max(v, &cap.version) != cap.version,
            None => true,
        };
        if lowers {
            max.insert(cap.path.clone(), cap.version.clone());
        }
    }

    let mut walk = Downgrader {
        target,
        reqs: &reqs,
        max,
        added: HashSet::new(),
        excluded: HashSet::new(),
        rdeps: HashMap::new(),
    };

    let mut out = vec![target.clone()];
    'list: for mut r in list {
        walk.add(&r)?;
        while walk.excluded.contains(&r) {
            let p = reqs.previous(&r)?;
            if p.version.is_none() {
                tracing::debug!("dropping {} from {target}: no earlier version fits", r.path);
                continue 'list;
            }
            tracing::debug!("stepping {r} back to {}", p.version);
            walk.add(&p)?;
            r = p;
        }
        out.push(r);
    }
    Ok(out)
}

/// A module being explored and the index of its next requirement.
struct Frame {
    module: ModuleVersion,
    required: Vec<ModuleVersion>,
    next: usize,
}

struct Downgrader<'a, R: Reqs + ?Sized> {
    target: &'a ModuleVersion,
    reqs: &'a R,
    max: HashMap<String, Version>,
    added: HashSet<ModuleVersion>,
    excluded: HashSet<ModuleVersion>,
    /// Reverse requirement edges among added modules.
    rdeps: HashMap<ModuleVersion, Vec<ModuleVersion>>,
}

impl<R: Reqs + ?Sized> Downgrader<'_, R> {
    /// Explore `m`, excluding it if it or anything it requires exceeds a cap.
    ///
    /// A module is excluded as soon as one of its requirements turns out to
    /// be excluded, and its remaining requirements are not explored.
    fn add(&mut self, m: &ModuleVersion) -> ModselResult<()> {
        let mut stack = Vec::new();
        self.enter(m, &mut stack)?;
        while let Some(frame) = stack.last_mut() {
            let Some(r) = frame.required.get(frame.next) else {
                stack.pop();
                continue;
            };
            if !self.added.contains(r) {
                let r = r.clone();
                self.enter(&r, &mut stack)?;
                continue;
            }
            if self.excluded.contains(r) {
                let module = frame.module.clone();
                stack.pop();
                self.exclude(&module);
            } else {
                self.rdeps
                    .entry(r.clone())
                    .or_default()
                    .push(frame.module.clone());
                frame.next += 1;
            }
        }
        Ok(())
    }

    /// Mark `m` as added and either exclude it for exceeding its cap or
    /// push it for exploration.
    fn enter(&mut self, m: &ModuleVersion, stack: &mut Vec<Frame>) -> ModselResult<()> {
        if !self.added.insert(m.clone()) {
            return Ok(());
        }
        if let Some(cap) = self.max.get(&m.path) {
            if self.reqs.max(&m.version, cap) != *cap {
                self.exclude(m);
                return Ok(());
            }
        }
        let required = self
            .reqs
            .required(m)?
            .into_iter()
            .filter(|r| follows(self.target, r))
            .collect();
        stack.push(Frame {
            module: m.clone(),
            required,
            next: 0,
        });
        Ok(())
    }

    /// Exclude `m` and every added module that requires it.
    fn exclude(&mut self, m: &ModuleVersion) {
        let mut stack = vec![m.clone()];
        while let Some(m) = stack.pop() {
            if !self.excluded.insert(m.clone()) {
                continue;
            }
            tracing::trace!("excluding {m}");
            if let Some(parents) = self.rdeps.get(&m) {
                stack.extend(parents.iter().cloned());
            }
        }
    }
}
