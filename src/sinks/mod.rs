use std::future::Future;

use anyhow::Result;

use crate::config::service::{SinkConfig, SinkType};
use crate::model::Batch;

pub mod sink_file;
pub mod sink_log;
pub mod sink_memory;

use sink_file::FileSink;
use sink_log::LogSink;
use sink_memory::MemorySink;

/// Persistence collaborator.
///
/// Partition keys (`OwnerKey`) are disjoint, so implementations see concurrent calls
/// for different keys and must tolerate them.
pub trait Sink: Send + Sync + 'static {
    /// Full import: append the collection.
    fn save(&self, batch: &Batch) -> impl Future<Output = Result<()>> + Send;

    /// Incremental import: the batch holds everything changed since the watermark
    /// and replaces whatever the sink stored for the same codes under the same key.
    fn delete_and_save(&self, batch: &Batch) -> impl Future<Output = Result<()>> + Send;
}

/// Which sink operation a traversal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkOp {
    Save,
    DeleteAndSave,
}

impl SinkOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkOp::Save => "save",
            SinkOp::DeleteAndSave => "delete_and_save",
        }
    }

    pub async fn apply<S: Sink>(&self, sink: &S, batch: &Batch) -> Result<()> {
        match self {
            SinkOp::Save => sink.save(batch).await,
            SinkOp::DeleteAndSave => sink.delete_and_save(batch).await,
        }
    }
}

#[derive(Debug)]
pub enum SinkKind {
    Log(LogSink),
    File(FileSink),
    Memory(MemorySink),
}

impl Sink for SinkKind {
    async fn save(&self, batch: &Batch) -> Result<()> {
        match self {
            SinkKind::Log(s) => s.save(batch).await,
            SinkKind::File(s) => s.save(batch).await,
            SinkKind::Memory(s) => s.save(batch).await,
        }
    }

    async fn delete_and_save(&self, batch: &Batch) -> Result<()> {
        match self {
            SinkKind::Log(s) => s.delete_and_save(batch).await,
            SinkKind::File(s) => s.delete_and_save(batch).await,
            SinkKind::Memory(s) => s.delete_and_save(batch).await,
        }
    }
}

pub fn build_sink(cfg: &SinkConfig) -> Result<SinkKind> {
    match cfg.sink_type {
        SinkType::Log => Ok(SinkKind::Log(LogSink)),
        SinkType::File => {
            let path = cfg
                .path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("sink.path is required for sink type 'file'"))?;
            Ok(SinkKind::File(FileSink::new(path)))
        }
    }
}
