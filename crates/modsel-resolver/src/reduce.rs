//! Reduction of a build list to the minimal requirement set that reproduces it.

use std::collections::{HashMap, HashSet};

use modsel_core::errors::ModselResult;
use modsel_core::module::ModuleVersion;
use modsel_core::version::Version;

use crate::cache::CachedReqs;
use crate::reqs::Reqs;
use crate::resolver::{check_target, follows};

/// The minimal list of requirements for `target` whose build list is `list`.
///
/// Modules are considered in reverse post-order of the requirement graph, so
/// in an acyclic graph a module is always considered before the modules it
/// requires. A module is kept only if it is at its selected version in `list`
/// and the closure of the modules kept so far does not already select that
/// version. The result is sorted by path.
pub fn req<R: Reqs + ?Sized>(
    target: &ModuleVersion,
    list: &[ModuleVersion],
    reqs: &R,
) -> ModselResult<Vec<ModuleVersion>> {
    check_target(target)?;
    let reqs = CachedReqs::new(reqs);
    let mut order = PostOrder {
        target,
        reqs: &reqs,
        required: HashMap::from([(target.clone(), Vec::new())]),
        postorder: Vec::new(),
    };
    for m in list {
        order.walk(m)?;
    }

    let mut selected: HashMap<&str, &Version> = HashMap::new();
    for m in list {
        let version = match selected.get(m.path.as_str()) {
            Some(v) if reqs.max(&m.version, v) == **v => *v,
            _ => &m.version,
        };
        selected.insert(&m.path, version);
    }

    let mut have: HashMap<String, Version> = HashMap::new();
    let mut implied: HashSet<&ModuleVersion> = HashSet::new();
    let mut min = Vec::new();
    for m in order.postorder.iter().rev() {
        if selected.get(m.path.as_str()) != Some(&&m.version) {
            continue;
        }
        if have.get(&m.path) != Some(&m.version) {
            min.push(m.clone());
            imply(m, &order.required, &reqs, &mut have, &mut implied);
        }
    }
    min.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        "reduced {} modules to {} requirements for {target}",
        list.len().saturating_sub(1),
        min.len()
    );
    Ok(min)
}

/// Requirement lists of every module reachable from the build list, and the
/// order in which their walks finished. Only requirements the build list
/// follows are recorded.
struct PostOrder<'a, R: Reqs + ?Sized> {
    target: &'a ModuleVersion,
    reqs: &'a R,
    required: HashMap<ModuleVersion, Vec<ModuleVersion>>,
    postorder: Vec<ModuleVersion>,
}

impl<R: Reqs + ?Sized> PostOrder<'_, R> {
    fn walk(&mut self, root: &ModuleVersion) -> ModselResult<()> {
        if self.required.contains_key(root) {
            return Ok(());
        }
        self.visit(root)?;
        // Each frame is a module and the index of its next requirement.
        let mut stack = vec![(root.clone(), 0)];
        while let Some((m, i)) = stack.last_mut() {
            let next = self.required.get(&*m).and_then(|rs| rs.get(*i)).cloned();
            match next {
                Some(r) => {
                    *i += 1;
                    if !self.required.contains_key(&r) {
                        self.visit(&r)?;
                        stack.push((r, 0));
                    }
                }
                None => {
                    self.postorder.push(m.clone());
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    fn visit(&mut self, m: &ModuleVersion) -> ModselResult<()> {
        let required = self
            .reqs
            .required(m)?
            .into_iter()
            .filter(|r| follows(self.target, r))
            .collect();
        self.required.insert(m.clone(), required);
        Ok(())
    }
}

/// Record `m` and everything it transitively requires as implied, joining
/// versions per path the way a build list would.
fn imply<'a, R: Reqs + ?Sized>(
    m: &'a ModuleVersion,
    required: &'a HashMap<ModuleVersion, Vec<ModuleVersion>>,
    reqs: &R,
    have: &mut HashMap<String, Version>,
    implied: &mut HashSet<&'a ModuleVersion>,
) {
    let mut stack = vec![m];
    while let Some(m) = stack.pop() {
        if !implied.insert(m) {
            continue;
        }
        let version = match have.get(&m.path) {
            Some(v) => reqs.max(v, &m.version),
            None => m.version.clone(),
        };
        have.insert(m.path.clone(), version);
        if let Some(rs) = required.get(m) {
            stack.extend(rs);
        }
    }
}
