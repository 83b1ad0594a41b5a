//! Core data types for modsel.
//!
//! This crate defines the identity model shared by every resolver operation:
//! module paths and their major-version suffixes, semantic versions and the
//! join order over them, the unified error type, and the textual requirement
//! manifest.
//!
//! This crate is intentionally free of resolution logic and network I/O.

pub mod errors;
pub mod manifest;
pub mod module;
pub mod version;
