//! Minimal version selection over a lazily queried requirement graph:
//! build lists, upgrade-all, selective upgrade, downgrade, and reduction of a
//! build list to its minimal requirement set.

pub mod cache;
pub mod downgrade;
pub mod graph;
pub mod reduce;
pub mod reqs;
pub mod resolver;
