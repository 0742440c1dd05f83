use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_MAX_CONCURRENCY, DEFAULT_SAFETY_MARGIN_SECS,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// refresh the token this many seconds before it expires
    pub safety_margin_seconds: Option<u64>,
    /// upper bound for in-flight requests and for concurrently walked branches
    pub max_concurrency: Option<usize>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: Option<LoggingConfig>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            safety_margin_seconds: Some(DEFAULT_SAFETY_MARGIN_SECS),
            max_concurrency: Some(DEFAULT_MAX_CONCURRENCY),
            timeout_ms: Some(DEFAULT_HTTP_TIMEOUT_MS),
            metrics: MetricsConfig::default(),
            logging: None,
        }
    }
}

impl SettingsConfig {
    pub fn safety_margin_seconds(&self) -> u64 {
        self.safety_margin_seconds.unwrap_or(DEFAULT_SAFETY_MARGIN_SECS)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY).max(1)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    /// textfile the exposition is written to after each run
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "./tacs-import.prom".to_string()
}
