//! # tacs import client
//!
//! Authenticates against the tacs token endpoint with client credentials, walks the
//! hypermedia catalog API from its navigation root and hands every collection it finds
//! to a pluggable sink, either as a full import or as an incremental one driven by a
//! `changesSince` watermark.
//!
//! Modules:
//! - `config`: YAML service configuration, loading and validation
//! - `cache`: bearer token with a single-flight refresh
//! - `sources`: token endpoint, link resolution and resource fetching
//! - `model`: resource shapes, collections and partition keys
//! - `traversal`: the import operations and their report
//! - `sinks`: persistence collaborators

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod model;
pub mod observability;
pub mod sinks;
pub mod sources;
pub mod traversal;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::error::{ImportError, ImportResult};
pub use crate::sinks::{Sink, SinkOp};
pub use crate::traversal::{build_engine, ImportMode, SyncReport, TraversalEngine};
