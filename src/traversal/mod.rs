//! Traversal of the resource graph and the three import operations built on it.

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::config::service::ServiceConfig;
use crate::sinks::Sink;
use crate::sources::{build_client, build_fetcher};

pub mod engine;
pub mod extensions;
pub mod report;

pub use engine::TraversalEngine;
pub use extensions::{ExtensionOutcome, ExtensionPoint};
pub use report::{BranchError, DispatchCount, ImportMode, SyncReport};

/// Wires client, token cache and fetcher from the config around `sink`.
pub fn build_engine<S: Sink>(
    config: &ServiceConfig,
    sink: Arc<S>,
    cancel: CancellationToken,
) -> Result<TraversalEngine<S>> {
    let client = build_client(config)?;
    let fetcher = build_fetcher(config, client, cancel)?;
    Ok(TraversalEngine::new(
        fetcher,
        sink,
        config.api.root_path.clone(),
        config.settings.max_concurrency(),
    ))
}
