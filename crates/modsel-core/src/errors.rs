use miette::Diagnostic;
use thiserror::Error;

use crate::module::{ModuleVersion, PathViolation};

/// Unified error type for all modsel operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ModselError {
    /// A module path broke one of the path syntax rules.
    #[error("malformed module path {path:?}: {violation}")]
    #[diagnostic(code(modsel::invalid_path))]
    InvalidPath {
        path: String,
        violation: PathViolation,
    },

    /// A version string is not a valid semantic version.
    #[error("malformed semantic version {version}")]
    #[diagnostic(code(modsel::invalid_version))]
    InvalidVersion { version: String },

    /// The major version does not agree with the path's `/vN` suffix.
    #[error("mismatched module path {path} and version {version} (want {want})")]
    #[diagnostic(
        code(modsel::mismatched_major),
        help("paths without a /vN suffix take v0 or v1 versions; /vN paths take vN versions")
    )]
    MismatchedMajor {
        path: String,
        version: String,
        want: String,
    },

    /// The requirement graph has no data for a module path or exact version.
    #[error("missing module: {module}")]
    #[diagnostic(code(modsel::missing_module))]
    MissingModule { module: ModuleVersion },

    /// Invalid or malformed requirement manifest.
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check the [module] and [require] tables of the manifest"))]
    Manifest { message: String },

    /// Invalid or malformed requirement graph document.
    #[error("Requirement graph error: {message}")]
    Graph { message: String },
}

impl ModselError {
    /// The module a missing-module error refers to, if this is one.
    pub fn missing_module(&self) -> Option<&ModuleVersion> {
        match self {
            ModselError::MissingModule { module } => Some(module),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the modsel crates.
pub type ModselResult<T> = Result<T, ModselError>;
