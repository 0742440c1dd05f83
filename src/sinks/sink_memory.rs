use anyhow::Result;
use tokio::sync::Mutex;

use crate::model::{Batch, CollectionKind, OwnerKey};
use crate::sinks::{Sink, SinkOp};

/// One recorded sink invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SinkCall {
    pub op: SinkOp,
    pub batch: Batch,
}

impl SinkCall {
    pub fn kind(&self) -> CollectionKind {
        self.batch.collection.kind()
    }

    pub fn owner(&self) -> &OwnerKey {
        &self.batch.owner
    }
}

/// Keeps every call in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    calls: Mutex<Vec<SinkCall>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().await.clone()
    }

    pub async fn calls_for(&self, owner: &OwnerKey) -> Vec<SinkCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| &call.batch.owner == owner)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, op: SinkOp, batch: &Batch) {
        self.calls.lock().await.push(SinkCall { op, batch: batch.clone() });
    }
}

impl Sink for MemorySink {
    async fn save(&self, batch: &Batch) -> Result<()> {
        self.record(SinkOp::Save, batch).await;
        Ok(())
    }

    async fn delete_and_save(&self, batch: &Batch) -> Result<()> {
        self.record(SinkOp::DeleteAndSave, batch).await;
        Ok(())
    }
}
