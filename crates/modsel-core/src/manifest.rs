use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::{ModselError, ModselResult};
use crate::module::{self, ModuleVersion};
use crate::version::Version;

/// A module's identity and its direct requirement set.
///
/// ```toml
/// [module]
/// path = "example.com/hello"
///
/// [require]
/// "rsc.io/quote" = "v1.5.2"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub module: ModuleDecl,

    #[serde(default)]
    pub require: BTreeMap<String, Version>,
}

/// The `[module]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub path: String,
}

impl Manifest {
    /// An empty manifest declaring only the module path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            module: ModuleDecl { path: path.into() },
            require: BTreeMap::new(),
        }
    }

    /// Parse and validate a manifest from TOML text.
    pub fn parse_toml(content: &str) -> ModselResult<Self> {
        let manifest: Manifest = toml::from_str(content).map_err(|e| ModselError::Manifest {
            message: format!("Failed to parse manifest: {e}"),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load and validate a manifest file.
    pub fn from_path(path: &Path) -> ModselResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ModselError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Check the module path and every requirement's path/version pair.
    pub fn validate(&self) -> ModselResult<()> {
        module::check_path(&self.module.path)?;
        for (path, version) in &self.require {
            if *path == self.module.path {
                return Err(ModselError::Manifest {
                    message: format!("module {path} cannot require itself"),
                });
            }
            module::check(path, version.as_str())?;
        }
        Ok(())
    }

    /// The unversioned root module this manifest describes.
    pub fn target(&self) -> ModuleVersion {
        ModuleVersion::unversioned(self.module.path.clone())
    }

    /// Direct requirements, sorted by path.
    pub fn requirements(&self) -> Vec<ModuleVersion> {
        self.require
            .iter()
            .map(|(path, version)| ModuleVersion::new(path.clone(), version.clone()))
            .collect()
    }

    /// Replace the requirement set, for example with a reduced one.
    ///
    /// The target's own path is skipped if it appears in `reqs`.
    pub fn set_requirements(&mut self, reqs: &[ModuleVersion]) {
        self.require = reqs
            .iter()
            .filter(|m| m.path != self.module.path)
            .map(|m| (m.path.clone(), m.version.clone()))
            .collect();
    }

    /// Serialize the manifest to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> ModselResult<String> {
        toml::to_string_pretty(self).map_err(|e| ModselError::Manifest {
            message: format!("Failed to serialize manifest: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_are_sorted_by_path() {
        let manifest = Manifest::parse_toml(
            r#"
[module]
path = "example.com/hello"

[require]
"rsc.io/sampler" = "v1.3.0"
"golang.org/x/text" = "v0.3.0"
"#,
        )
        .unwrap();
        let reqs = manifest.requirements();
        assert_eq!(reqs[0].path, "golang.org/x/text");
        assert_eq!(reqs[1].path, "rsc.io/sampler");
    }

    #[test]
    fn self_requirement_rejected() {
        let err = Manifest::parse_toml(
            r#"
[module]
path = "example.com/hello"

[require]
"example.com/hello" = "v1.0.0"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModselError::Manifest { .. }));
    }
}
