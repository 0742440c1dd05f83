use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::token_cache::TokenCache;
use crate::error::{ImportError, ImportResult};
use crate::helpers::time::get_instant;
use crate::model::{
    Anstellung, NavigationRoot, Nutzniesser, NutzniesserRef, Organisation, Personalkategorie,
    PersonalkategorieNav, StatistikCodeImport, StatistikCodeRef, Variable, VariablenRef,
};
use crate::observability::metrics::get_metrics;
use crate::sources::link;

/// A resource shape the API serves; `NAME` labels logs and metrics.
pub trait Resource: DeserializeOwned + Send + 'static {
    const NAME: &'static str;
}

macro_rules! resource {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(impl Resource for $ty {
            const NAME: &'static str = $name;
        })*
    };
}

resource!(
    NavigationRoot => "root",
    StatistikCodeImport => "statistik_codes",
    Nutzniesser => "nutzniesser",
    Variable => "variablen",
    Organisation => "organisationen",
    Personalkategorie => "personalkategorien",
    PersonalkategorieNav => "personalkategorie_nav",
    Anstellung => "anstellungen",
    VariablenRef => "variablen_refs",
    NutzniesserRef => "nutzniesser_refs",
    StatistikCodeRef => "statistik_code_refs",
);

static DECODE_MSG: &str = "decode";
static STATUS_MSG: &str = "status";
static TRANSPORT_MSG: &str = "transport";

/// Authenticated GETs against the resource API.
///
/// Every request holds a permit of a shared semaphore, so the number of open
/// connections stays bounded however wide the traversal fans out.
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    client: Client,
    base_url: Url,
    tokens: Arc<TokenCache>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl ResourceFetcher {
    pub fn new(
        client: Client,
        base_url: &str,
        tokens: Arc<TokenCache>,
        max_concurrency: usize,
        cancel: CancellationToken,
    ) -> ImportResult<Self> {
        Ok(Self {
            client,
            base_url: link::normalize_base(base_url)?,
            tokens,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            cancel,
        })
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Single JSON document, e.g. the navigation root. An empty body is a decode error.
    pub async fn fetch_document<T: Resource>(&self, link: &str) -> ImportResult<T> {
        let url = link::resolve(&self.base_url, link)?;
        // a document without a body cannot be navigated
        let body = self.get(url.clone(), T::NAME).await?.unwrap_or_default();
        decode(&url, &body, T::NAME).await
    }

    /// JSON array behind `link`; a missing link or 204 yields an empty vec.
    pub async fn fetch_collection<T: Resource>(&self, link: Option<&str>) -> ImportResult<Vec<T>> {
        self.fetch_collection_since(link, None).await
    }

    /// Like `fetch_collection`, filtered with `changesSince` when a watermark is given.
    /// The filter is never applied to a missing link.
    pub async fn fetch_collection_since<T: Resource>(
        &self,
        link: Option<&str>,
        since: Option<NaiveDate>,
    ) -> ImportResult<Vec<T>> {
        let link = match link {
            Some(l) if !link::is_missing(Some(l)) => l,
            _ => {
                debug!(resource = T::NAME, "link not populated, nothing to fetch");
                get_metrics().await.fetch_skipped_links.inc();
                return Ok(Vec::new());
            }
        };

        let mut url = link::resolve(&self.base_url, link)?;
        if let Some(since) = since {
            url = link::with_changes_since(url, since);
        }

        match self.get(url.clone(), T::NAME).await? {
            Some(body) => decode(&url, &body, T::NAME).await,
            None => Ok(Vec::new()),
        }
    }

    /// `Ok(None)` for 204 and for success responses without a body.
    async fn get(&self, url: Url, resource: &str) -> ImportResult<Option<String>> {
        let metrics = get_metrics().await;

        let _permit = tokio::select! {
            _ = self.cancel.cancelled() => return Err(ImportError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| ImportError::Cancelled)?,
        };
        if self.cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        let token = self.tokens.get_token().await?;
        let start = get_instant();
        metrics.fetch_requests.with_label_values(&[resource]).inc();
        debug!(%url, resource, "GET");

        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, token.bearer())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| {
                metrics.fetch_failures.with_label_values(&[resource, TRANSPORT_MSG]).inc();
                ImportError::Transport { url: url.to_string(), source }
            })?;

        let status = response.status();
        let result = if status == StatusCode::NO_CONTENT {
            Ok(None)
        } else if status.is_success() {
            let body = response.text().await.map_err(|source| {
                metrics.fetch_failures.with_label_values(&[resource, TRANSPORT_MSG]).inc();
                ImportError::Transport { url: url.to_string(), source }
            })?;
            Ok(Some(body).filter(|b| !b.trim().is_empty()))
        } else {
            if status == StatusCode::UNAUTHORIZED {
                // next request starts with a fresh token
                self.tokens.invalidate().await;
            }
            warn!(%url, resource, status = status.as_u16(), "GET failed");
            metrics.fetch_failures.with_label_values(&[resource, STATUS_MSG]).inc();
            Err(ImportError::Fetch { url: url.to_string(), status: status.as_u16() })
        };

        metrics.fetch_duration.with_label_values(&[resource]).observe(start.elapsed().as_secs_f64());
        result
    }
}

async fn decode<T: DeserializeOwned>(url: &Url, body: &str, resource: &str) -> ImportResult<T> {
    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(source) => {
            warn!(%url, resource, error = %source, "response does not match the expected shape");
            get_metrics()
                .await
                .fetch_failures
                .with_label_values(&[resource, DECODE_MSG])
                .inc();
            Err(ImportError::Decode { url: url.to_string(), source })
        }
    }
}
