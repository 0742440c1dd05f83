use anyhow::Result;
use tracing::info;

use crate::model::Batch;
use crate::sinks::Sink;

/// Discards every collection after logging what it would have stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Sink for LogSink {
    async fn save(&self, batch: &Batch) -> Result<()> {
        info!(
            collection = %batch.collection.kind(),
            owner = %batch.owner,
            records = batch.collection.len(),
            "save"
        );
        Ok(())
    }

    async fn delete_and_save(&self, batch: &Batch) -> Result<()> {
        info!(
            collection = %batch.collection.kind(),
            owner = %batch.owner,
            records = batch.collection.len(),
            "delete and save"
        );
        Ok(())
    }
}
