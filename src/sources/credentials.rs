use std::{env, fs};

use anyhow::{anyhow, Result};

use crate::config::service::{AuthConfig, SecretValue};

/// Client credentials as sent to the token endpoint
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub resource: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("resource", &self.resource)
            .finish()
    }
}

/// Resolved on every token request so rotated files and env values are picked up.
pub fn resolve_credentials(auth: &AuthConfig) -> Result<Credentials> {
    Ok(Credentials {
        client_id: resolve_secret_value(&auth.client_id)
            .map_err(|e| anyhow!("auth.client_id: {}", e))?,
        client_secret: resolve_secret_value(&auth.client_secret)
            .map_err(|e| anyhow!("auth.client_secret: {}", e))?,
        resource: resolve_secret_value(&auth.resource)
            .map_err(|e| anyhow!("auth.resource: {}", e))?,
    })
}

pub fn resolve_secret_value(value: &SecretValue) -> Result<String> {
    match value {
        SecretValue::Literal { value } => Ok(value.to_owned()),
        SecretValue::FromEnv { from_env } => {
            env::var(from_env).map_err(|err| anyhow!("env '{}': {}", from_env, err))
        }
        SecretValue::FromFile { path } => fs::read_to_string(path)
            .map_err(|err| anyhow!("file '{}': {}", path, err))
            .map(|res| res.trim().to_string()),
    }
}
