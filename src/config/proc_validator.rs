//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * settings bounds (safety margin, concurrency, timeout, logging level)
//!   * token endpoint and API base URLs
//!   * credential value sources
//!   * sink requirements

use reqwest::Url;
use tracing::{error, info};

use crate::config::service::{ApiConfig, AuthConfig, SecretValue, ServiceConfig, SinkConfig, SinkType};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_auth(&cfg.auth, &mut errors);
    validate_api(&cfg.api, &mut errors);
    validate_sink(&cfg.sink, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    // safety margin sane bounds
    if let Some(s) = settings.safety_margin_seconds {
        if s > 60 * 60 * 24 {
            errors.push(format!(
                "settings.safety_margin_seconds ({}) is unreasonably large",
                s
            ));
        }
    }

    if settings.max_concurrency == Some(0) {
        errors.push("settings.max_concurrency must be > 0".to_string());
    }

    if settings.timeout_ms == Some(0) {
        errors.push("settings.timeout_ms must be > 0".to_string());
    }

    if settings.metrics.is_enabled && settings.metrics.path.trim().is_empty() {
        errors.push("settings.metrics.path must be set when metrics are enabled".to_string());
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

/// TOKEN ENDPOINT & CREDENTIALS
fn validate_auth(auth: &AuthConfig, errors: &mut Vec<String>) {
    validate_absolute_url("auth.token_url", &auth.token_url, errors);

    if auth.scope.trim().is_empty() {
        errors.push("auth.scope must not be empty".to_string());
    }

    validate_secret_value("auth.client_id", &auth.client_id, errors);
    validate_secret_value("auth.client_secret", &auth.client_secret, errors);
    validate_secret_value("auth.resource", &auth.resource, errors);
}

fn validate_secret_value(path: &str, v: &SecretValue, errors: &mut Vec<String>) {
    match v {
        SecretValue::Literal { value } => {
            if value.trim().is_empty() {
                errors.push(format!("{}: literal value is empty", path));
            }
        }
        SecretValue::FromEnv { from_env } => {
            if from_env.trim().is_empty() {
                errors.push(format!("{}: from_env must name a variable", path));
            }
        }
        SecretValue::FromFile { path: file } => {
            if file.trim().is_empty() {
                errors.push(format!("{}: path must not be empty", path));
            }
        }
    }
}

/// RESOURCE API
fn validate_api(api: &ApiConfig, errors: &mut Vec<String>) {
    validate_absolute_url("api.base_url", &api.base_url, errors);
    if api.root_path.trim().is_empty() {
        errors.push("api.root_path must not be empty".to_string());
    }
}

fn validate_absolute_url(path: &str, raw: &str, errors: &mut Vec<String>) {
    match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "{} '{}' must use http or https, got '{}'",
            path,
            raw,
            url.scheme()
        )),
        Err(e) => errors.push(format!("{} '{}' is not an absolute URL: {}", path, raw, e)),
    }
}

/// SINK
fn validate_sink(sink: &SinkConfig, errors: &mut Vec<String>) {
    if let SinkType::File = sink.sink_type {
        if sink.path.as_deref().map_or(true, |p| p.trim().is_empty()) {
            errors.push("sink.path is required for sink type 'file'".to_string());
        }
    }
}
