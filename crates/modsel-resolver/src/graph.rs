//! An in-memory requirement graph backed by petgraph.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use modsel_core::errors::{ModselError, ModselResult};
use modsel_core::module::{self, ModuleVersion};
use modsel_core::version::Version;

use crate::reqs::Reqs;

/// A fully materialized requirement graph.
///
/// Nodes are module versions; an edge `a -> b` means `a` requires `b`. Only
/// declared modules are known: a module that is merely required by another
/// one, but never declared itself, answers queries with a missing-module
/// error.
#[derive(Debug, Default)]
pub struct RequirementGraph {
    /// Edge weights record declaration order so requirements come back in the
    /// order they were added.
    graph: DiGraph<ModuleVersion, usize>,
    index: HashMap<ModuleVersion, NodeIndex>,
    declared: HashSet<NodeIndex>,
    versions: HashMap<String, BTreeSet<Version>>,
}

impl RequirementGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, m: &ModuleVersion) -> NodeIndex {
        if let Some(&idx) = self.index.get(m) {
            return idx;
        }
        let idx = self.graph.add_node(m.clone());
        self.index.insert(m.clone(), idx);
        idx
    }

    /// Declare `m` as a known module, with no requirements yet.
    pub fn add_module(&mut self, m: &ModuleVersion) -> NodeIndex {
        let idx = self.node(m);
        if self.declared.insert(idx) {
            self.versions
                .entry(m.path.clone())
                .or_default()
                .insert(m.version.clone());
        }
        idx
    }

    /// Declare that `from` requires `to`. `from` becomes a known module.
    pub fn add_requirement(&mut self, from: &ModuleVersion, to: &ModuleVersion) {
        let from = self.add_module(from);
        let to = self.node(to);
        let ordinal = self.graph.edge_count();
        self.graph.add_edge(from, to, ordinal);
    }

    /// Whether `m` has been declared.
    pub fn contains(&self, m: &ModuleVersion) -> bool {
        self.index
            .get(m)
            .is_some_and(|idx| self.declared.contains(idx))
    }

    /// Number of declared modules.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Build a graph from a TOML document of `[[module]]` entries.
    ///
    /// Every declared and required module must have a valid identity.
    ///
    /// ```toml
    /// [[module]]
    /// path = "example.com/app"
    ///
    /// [module.require]
    /// "rsc.io/quote" = "v1.5.2"
    ///
    /// [[module]]
    /// path = "rsc.io/quote"
    /// version = "v1.5.2"
    /// ```
    pub fn from_toml(content: &str) -> ModselResult<Self> {
        let doc: GraphDocument = toml::from_str(content).map_err(|e| ModselError::Graph {
            message: format!("Failed to parse requirement graph: {e}"),
        })?;
        let mut graph = Self::new();
        for entry in &doc.module {
            let m = ModuleVersion::new(entry.path.clone(), entry.version.clone());
            check_identity(&m)?;
            graph.add_module(&m);
            for (path, version) in &entry.require {
                let r = ModuleVersion::new(path.clone(), version.clone());
                check_identity(&r)?;
                graph.add_requirement(&m, &r);
            }
        }
        Ok(graph)
    }

    /// Load a graph document from disk.
    pub fn from_path(path: &Path) -> ModselResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ModselError::Graph {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml(&content)
    }
}

fn check_identity(m: &ModuleVersion) -> ModselResult<()> {
    match &m.version {
        Version::Tagged(v) => module::check(&m.path, v),
        _ => module::check_path(&m.path),
    }
}

/// On-disk form of a [`RequirementGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    module: Vec<GraphEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphEntry {
    path: String,
    #[serde(default)]
    version: Version,
    #[serde(default)]
    require: BTreeMap<String, Version>,
}

impl Reqs for RequirementGraph {
    fn required(&self, m: &ModuleVersion) -> ModselResult<Vec<ModuleVersion>> {
        let idx = match self.index.get(m) {
            Some(idx) if self.declared.contains(idx) => *idx,
            _ => return Err(ModselError::MissingModule { module: m.clone() }),
        };
        let mut edges: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (*e.weight(), e.target()))
            .collect();
        edges.sort_unstable();
        Ok(edges
            .into_iter()
            .map(|(_, target)| self.graph[target].clone())
            .collect())
    }

    fn latest(&self, path: &str) -> ModselResult<ModuleVersion> {
        self.versions
            .get(path)
            .and_then(|vs| vs.last())
            .map(|v| ModuleVersion::new(path, v.clone()))
            .ok_or_else(|| ModselError::MissingModule {
                module: ModuleVersion::unversioned(path),
            })
    }

    fn previous(&self, m: &ModuleVersion) -> ModselResult<ModuleVersion> {
        let prev = self
            .versions
            .get(&m.path)
            .and_then(|vs| vs.range(..&m.version).next_back())
            .cloned()
            .unwrap_or(Version::None);
        Ok(ModuleVersion::new(m.path.clone(), prev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(path: &str, version: &str) -> ModuleVersion {
        ModuleVersion::new(path, version)
    }

    #[test]
    fn requirements_keep_declaration_order() {
        let mut g = RequirementGraph::new();
        let app = mv("example.com/app", "v1.0.0");
        g.add_requirement(&app, &mv("example.com/z", "v1.0.0"));
        g.add_requirement(&app, &mv("example.com/a", "v1.0.0"));
        g.add_requirement(&app, &mv("example.com/m", "v1.0.0"));

        let paths: Vec<String> = g.required(&app).unwrap().into_iter().map(|m| m.path).collect();
        assert_eq!(paths, ["example.com/z", "example.com/a", "example.com/m"]);
    }

    #[test]
    fn undeclared_module_is_missing() {
        let mut g = RequirementGraph::new();
        let app = mv("example.com/app", "v1.0.0");
        let dep = mv("example.com/dep", "v1.0.0");
        g.add_requirement(&app, &dep);

        assert!(g.contains(&app));
        assert!(!g.contains(&dep));
        let err = g.required(&dep).unwrap_err();
        assert_eq!(err.missing_module(), Some(&dep));
        assert!(g.latest("example.com/dep").is_err());
    }

    #[test]
    fn latest_and_previous() {
        let mut g = RequirementGraph::new();
        for v in ["v1.2.0", "v1.10.0", "v1.9.0"] {
            g.add_module(&mv("example.com/lib", v));
        }
        assert_eq!(g.latest("example.com/lib").unwrap(), mv("example.com/lib", "v1.10.0"));
        assert_eq!(
            g.previous(&mv("example.com/lib", "v1.10.0")).unwrap(),
            mv("example.com/lib", "v1.9.0")
        );
        assert_eq!(
            g.previous(&mv("example.com/lib", "v1.5.0")).unwrap(),
            mv("example.com/lib", "v1.2.0")
        );
        assert!(g
            .previous(&mv("example.com/lib", "v1.2.0"))
            .unwrap()
            .version
            .is_none());
    }

    #[test]
    fn parse_document() {
        let g = RequirementGraph::from_toml(
            r#"
[[module]]
path = "example.com/app"

[module.require]
"rsc.io/quote" = "v1.5.2"

[[module]]
path = "rsc.io/quote"
version = "v1.5.2"
"#,
        )
        .unwrap();
        assert_eq!(g.len(), 2);
        let app = ModuleVersion::unversioned("example.com/app");
        assert_eq!(g.required(&app).unwrap(), vec![mv("rsc.io/quote", "v1.5.2")]);
    }

    #[test]
    fn document_identities_are_checked() {
        let err = RequirementGraph::from_toml(
            r#"
[[module]]
path = "rsc.io/quote/v2"
version = "v1.0.0"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModselError::MismatchedMajor { .. }));
    }

    #[test]
    fn malformed_document() {
        let err = RequirementGraph::from_toml("[[module]]\nversion = 3\n").unwrap_err();
        assert!(matches!(err, ModselError::Graph { .. }));
    }
}
