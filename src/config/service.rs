use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::{DEFAULT_ROOT_PATH, DEFAULT_SCOPE};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// ================================
/// Credentials & token endpoint
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// absolute URL of the token endpoint, e.g. `https://auth.example/connect/token`
    pub token_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    pub client_id: SecretValue,
    pub client_secret: SecretValue,
    /// resource identifier the token is issued for
    pub resource: SecretValue,
}

/// Where a credential value comes from
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretValue {
    Literal { value: String },
    FromEnv { from_env: String },
    FromFile { path: String },
}

/// ================================
/// Resource API
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// base every relative link is resolved against
    pub base_url: String,
    #[serde(default = "default_root_path")]
    pub root_path: String,
}

/// ================================
/// Sink
/// ================================
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    Log,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SinkConfig {
    #[serde(rename = "type")]
    pub sink_type: SinkType,
    /// output directory, required for `file`
    pub path: Option<String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self { sink_type: SinkType::Log, path: None }
    }
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_root_path() -> String {
    DEFAULT_ROOT_PATH.to_string()
}
