//! Per-resolution memoization of requirement graph queries.
//!
//! The fixpoint can revisit the same module many times in cyclic graphs, and
//! the reduction and downgrade passes query modules the build pass already
//! saw. Every resolver entry point wraps the caller's [`Reqs`] in a
//! [`CachedReqs`] so each distinct query reaches the underlying graph once.
//! Failed queries are not cached; they abort the resolution anyway.

use std::cell::RefCell;
use std::collections::HashMap;

use modsel_core::errors::ModselResult;
use modsel_core::module::ModuleVersion;
use modsel_core::version::Version;

use crate::reqs::Reqs;

/// A [`Reqs`] adapter that remembers every successful answer.
pub struct CachedReqs<'a, R: Reqs + ?Sized> {
    inner: &'a R,
    required: RefCell<HashMap<ModuleVersion, Vec<ModuleVersion>>>,
    latest: RefCell<HashMap<String, ModuleVersion>>,
    previous: RefCell<HashMap<ModuleVersion, ModuleVersion>>,
}

impl<'a, R: Reqs + ?Sized> CachedReqs<'a, R> {
    pub fn new(inner: &'a R) -> Self {
        Self {
            inner,
            required: RefCell::new(HashMap::new()),
            latest: RefCell::new(HashMap::new()),
            previous: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct modules whose requirements have been fetched.
    pub(crate) fn len(&self) -> usize {
        self.required.borrow().len()
    }
}

impl<R: Reqs + ?Sized> Reqs for CachedReqs<'_, R> {
    fn required(&self, m: &ModuleVersion) -> ModselResult<Vec<ModuleVersion>> {
        if let Some(list) = self.required.borrow().get(m) {
            return Ok(list.clone());
        }
        tracing::trace!("fetching requirements of {m}");
        let list = self.inner.required(m)?;
        self.required.borrow_mut().insert(m.clone(), list.clone());
        Ok(list)
    }

    fn latest(&self, path: &str) -> ModselResult<ModuleVersion> {
        if let Some(m) = self.latest.borrow().get(path) {
            return Ok(m.clone());
        }
        let m = self.inner.latest(path)?;
        self.latest.borrow_mut().insert(path.to_string(), m.clone());
        Ok(m)
    }

    fn previous(&self, m: &ModuleVersion) -> ModselResult<ModuleVersion> {
        if let Some(p) = self.previous.borrow().get(m) {
            return Ok(p.clone());
        }
        let p = self.inner.previous(m)?;
        self.previous.borrow_mut().insert(m.clone(), p.clone());
        Ok(p)
    }

    fn max(&self, v1: &Version, v2: &Version) -> Version {
        self.inner.max(v1, v2)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use modsel_core::errors::ModselError;

    use super::*;

    /// Answers every module with one fixed requirement and counts queries.
    struct Counting {
        calls: Cell<usize>,
    }

    impl Reqs for Counting {
        fn required(&self, m: &ModuleVersion) -> ModselResult<Vec<ModuleVersion>> {
            self.calls.set(self.calls.get() + 1);
            if m.path == "example.com/gone" {
                return Err(ModselError::MissingModule { module: m.clone() });
            }
            Ok(vec![ModuleVersion::new("example.com/dep", "v1.0.0")])
        }

        fn latest(&self, path: &str) -> ModselResult<ModuleVersion> {
            self.calls.set(self.calls.get() + 1);
            Ok(ModuleVersion::new(path, "v1.9.0"))
        }

        fn previous(&self, m: &ModuleVersion) -> ModselResult<ModuleVersion> {
            self.calls.set(self.calls.get() + 1);
            Ok(ModuleVersion::new(m.path.clone(), Version::None))
        }
    }

    #[test]
    fn repeated_queries_hit_inner_once() {
        let inner = Counting { calls: Cell::new(0) };
        let cached = CachedReqs::new(&inner);
        let m = ModuleVersion::new("example.com/a", "v1.0.0");

        for _ in 0..3 {
            assert_eq!(cached.required(&m).unwrap().len(), 1);
            assert_eq!(cached.latest("example.com/a").unwrap().version, Version::from("v1.9.0"));
            assert!(cached.previous(&m).unwrap().version.is_none());
        }
        assert_eq!(inner.calls.get(), 3);
        assert_eq!(cached.len(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let inner = Counting { calls: Cell::new(0) };
        let cached = CachedReqs::new(&inner);
        let gone = ModuleVersion::new("example.com/gone", "v1.0.0");

        assert!(cached.required(&gone).is_err());
        assert!(cached.required(&gone).is_err());
        assert_eq!(inner.calls.get(), 2);
        assert_eq!(cached.len(), 0);
    }
}
