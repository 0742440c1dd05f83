use std::{fs, path::Path};

use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::proc_validator;
use crate::config::service::ServiceConfig;
use crate::config::settings::{LogFormat, LoggingConfig};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_MAX_CONCURRENCY, DEFAULT_SAFETY_MARGIN_SECS};

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = fs::read_to_string(path)?;

    let expanded = expand_env_vars(&content);
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| {
            error!("parse config error: {}", e);
            metrics.config_parse_failures.inc();
        })?;

    // Apply defaults
    let settings = &mut service_config.settings;
    if settings.logging.is_none() {
        settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::Compact));
    }
    if settings.safety_margin_seconds.is_none() {
        settings.safety_margin_seconds = Some(DEFAULT_SAFETY_MARGIN_SECS);
    }
    if settings.max_concurrency.is_none() {
        settings.max_concurrency = Some(DEFAULT_MAX_CONCURRENCY);
    }
    if settings.timeout_ms.is_none() {
        settings.timeout_ms = Some(DEFAULT_HTTP_TIMEOUT_MS);
    }

    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)
        .await
        .map_err(|errors| {
            anyhow!(
                "config is not valid, total errors: {}\n{}",
                errors.len(),
                errors.join("\n")
            )
        })?;

    Ok(service_config)
}

/// `${VAR}` and `${VAR:default}`; unknown variables without a default become empty
pub fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}
