/// Sources module
///
/// Everything that talks to the remote side: credentials, the token endpoint and the
/// resource API.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::cache::token_cache::TokenCache;
use crate::config::service::ServiceConfig;

pub mod credentials;
pub mod fetch;
pub mod link;
pub mod oauth2;

use fetch::ResourceFetcher;
use oauth2::OAuth2Source;

/// One pooled client shared by the token source and the fetcher.
pub fn build_client(config: &ServiceConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_millis(config.settings.timeout_ms()))
        .build()?)
}

pub fn build_fetcher(
    config: &ServiceConfig,
    client: Client,
    cancel: CancellationToken,
) -> Result<ResourceFetcher> {
    let source = OAuth2Source::new(config.auth.clone(), client.clone());
    let tokens = Arc::new(TokenCache::new(source, config.settings.safety_margin_seconds()));
    Ok(ResourceFetcher::new(
        client,
        &config.api.base_url,
        tokens,
        config.settings.max_concurrency(),
        cancel,
    )?)
}
