use chrono::TimeDelta;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::token::Token;
use crate::error::ImportResult;
use crate::helpers::time::now;
use crate::sources::oauth2::OAuth2Source;

/// Single-slot token cache.
///
/// Readers take the fast path under the read lock. A stale token sends callers
/// through `refresh`, which only one of them enters at a time; the others find the
/// fresh token on the second check and never hit the token endpoint.
#[derive(Debug)]
pub struct TokenCache {
    source: OAuth2Source,
    safety_margin: TimeDelta,
    slot: RwLock<Option<Token>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new(source: OAuth2Source, safety_margin_seconds: u64) -> Self {
        Self {
            source,
            safety_margin: i64::try_from(safety_margin_seconds)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX),
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub async fn get_token(&self) -> ImportResult<Token> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        // someone else may have refreshed while we waited
        if let Some(token) = self.cached().await {
            debug!("token refreshed by a concurrent caller");
            return Ok(token);
        }

        info!("fetching new token");
        let token = self.source.fetch_token().await?;
        *self.slot.write().await = Some(token.clone());
        Ok(token)
    }

    /// Drops the cached token, e.g. after the API rejected it.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    async fn cached(&self) -> Option<Token> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now(), self.safety_margin))
            .cloned()
    }
}
