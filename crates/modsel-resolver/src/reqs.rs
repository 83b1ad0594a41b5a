//! The requirement graph interface the resolver queries.

use modsel_core::errors::ModselResult;
use modsel_core::module::ModuleVersion;
use modsel_core::version::{self, Version};

/// Access to the virtual requirement graph.
///
/// Implementations decide where requirement data comes from (an in-memory
/// map, a module cache, a network fetcher) and whether a missing module
/// deserves a retry before it is reported.
pub trait Reqs {
    /// Direct requirements declared by `m`.
    ///
    /// Fails with a missing-module error if `m` itself is unknown.
    fn required(&self, m: &ModuleVersion) -> ModselResult<Vec<ModuleVersion>>;

    /// The highest known version of `path`.
    ///
    /// Fails with a missing-module error if `path` has no known versions.
    fn latest(&self, path: &str) -> ModselResult<ModuleVersion>;

    /// The highest known version of `m.path` strictly below `m.version`, or
    /// `m.path` at [`Version::None`] when there is none.
    fn previous(&self, m: &ModuleVersion) -> ModselResult<ModuleVersion>;

    /// The later of two versions.
    fn max(&self, v1: &Version, v2: &Version) -> Version {
        version::join(v1, v2)
    }
}

/// A requirement graph in which `target` declares `list` as its requirements
/// instead of whatever the underlying graph says.
///
/// Used to resolve a build list from an edited requirement set, for example
/// the output of [`crate::reduce::req`] or [`crate::downgrade::downgrade`].
pub struct Override<'a, R: Reqs + ?Sized> {
    target: ModuleVersion,
    list: Vec<ModuleVersion>,
    reqs: &'a R,
}

impl<'a, R: Reqs + ?Sized> Override<'a, R> {
    pub fn new(target: ModuleVersion, list: Vec<ModuleVersion>, reqs: &'a R) -> Self {
        Self { target, list, reqs }
    }
}

impl<R: Reqs + ?Sized> Reqs for Override<'_, R> {
    fn required(&self, m: &ModuleVersion) -> ModselResult<Vec<ModuleVersion>> {
        if *m == self.target {
            return Ok(self.list.clone());
        }
        self.reqs.required(m)
    }

    fn latest(&self, path: &str) -> ModselResult<ModuleVersion> {
        self.reqs.latest(path)
    }

    fn previous(&self, m: &ModuleVersion) -> ModselResult<ModuleVersion> {
        self.reqs.previous(m)
    }

    fn max(&self, v1: &Version, v2: &Version) -> Version {
        self.reqs.max(v1, v2)
    }
}
