use anyhow::Result;
use prometheus::{Encoder, TextEncoder};
use tracing::info;

use crate::config::settings::MetricsConfig;
use crate::observability::metrics::get_metrics;

/// Renders the registry in the text exposition format.
pub async fn render() -> Result<String> {
    let metrics = get_metrics().await;
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Writes the exposition next to the configured path and renames it in place,
/// so a textfile collector never reads a half-written file.
pub async fn write_textfile(config: &MetricsConfig) -> Result<()> {
    if !config.is_enabled {
        return Ok(());
    }
    let body = render().await?;
    let tmp = format!("{}.tmp", config.path);
    tokio::fs::write(&tmp, body.as_bytes()).await?;
    tokio::fs::rename(&tmp, &config.path).await?;
    info!(path = %config.path, "metrics written");
    Ok(())
}
