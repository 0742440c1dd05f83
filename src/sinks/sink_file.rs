use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::model::{Batch, OwnerKey};
use crate::sinks::Sink;

/// Line of a stored collection file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub code: String,
    pub record: Value,
}

/// JSON-lines files, one per collection kind and owner key:
/// `<root>/<collection>/<owner>.jsonl`
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, batch: &Batch) -> PathBuf {
        self.root
            .join(batch.collection.kind().as_str())
            .join(format!("{}.jsonl", owner_file_stem(&batch.owner)))
    }

    /// Everything stored under the batch's kind and owner.
    pub async fn read(&self, batch: &Batch) -> Result<Vec<StoredRecord>> {
        read_records(&self.path_for(batch)).await
    }
}

impl Sink for FileSink {
    async fn save(&self, batch: &Batch) -> Result<()> {
        let path = self.path_for(batch);
        ensure_parent(&path).await?;

        let mut lines = String::new();
        for (code, record) in batch.collection.records()? {
            lines.push_str(&serde_json::to_string(&StoredRecord { code, record })?);
            lines.push('\n');
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("open {}", path.display()))?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %path.display(), records = batch.collection.len(), "appended");
        Ok(())
    }

    async fn delete_and_save(&self, batch: &Batch) -> Result<()> {
        let path = self.path_for(batch);
        ensure_parent(&path).await?;

        let incoming = batch.collection.records()?;
        let replaced: HashSet<&str> = incoming.iter().map(|(code, _)| code.as_str()).collect();

        let existing = read_records(&path).await?;
        let retracted = existing.iter().filter(|r| replaced.contains(r.code.as_str())).count();

        let mut content = String::new();
        for record in existing.iter().filter(|r| !replaced.contains(r.code.as_str())) {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }
        for (code, record) in incoming {
            content.push_str(&serde_json::to_string(&StoredRecord { code, record })?);
            content.push('\n');
        }

        write_atomic(&path, content.as_bytes()).await?;
        info!(
            path = %path.display(),
            retracted,
            written = batch.collection.len(),
            "replaced changed records"
        );
        Ok(())
    }
}

fn owner_file_stem(owner: &OwnerKey) -> String {
    match owner {
        OwnerKey::Tenant => "tenant".to_string(),
        OwnerKey::Organisation(id) => format!("organisation_{}", sanitize(id)),
        OwnerKey::OrganisationPersonalkategorie { organisation, personalkategorie } => format!(
            "organisation_{}__personalkategorie_{}",
            sanitize(organisation),
            sanitize(personalkategorie)
        ),
        OwnerKey::Anstellung(id) => format!("anstellung_{}", sanitize(id)),
    }
}

/// Percent-encodes an id into a file name component. `_` is encoded too, so the
/// separators of `owner_file_stem` stay unambiguous and distinct ids never share a file.
fn sanitize(id: &str) -> String {
    urlencoding::encode(id).replace('_', "%5F")
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

async fn read_records(path: &Path) -> Result<Vec<StoredRecord>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).with_context(|| format!("corrupt line in {}", path.display()))
        })
        .collect()
}

/// tmp file + rename, readers never see a partial file
async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let tmp = path.with_extension("jsonl.tmp");
    fs::write(&tmp, content)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
