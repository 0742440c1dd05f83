// src/tests/common/mod.rs
pub use serde_json::json;

use std::sync::Arc;

use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::cache::token_cache::TokenCache;
use crate::config::proc_loader::parse_config;
use crate::config::service::ServiceConfig;
use crate::sinks::Sink;
use crate::sources::fetch::ResourceFetcher;
use crate::sources::oauth2::OAuth2Source;
use crate::sources::{build_client, build_fetcher};
use crate::traversal::{build_engine, TraversalEngine};

pub const TOKEN_PATH: &str = "/connect/token";
pub const ROOT_PATH: &str = "/api/v1";
pub const SINCE: &str = "2016-05-15";

/// Config pointing token endpoint and API at the mock server.
pub async fn service_config(server: &MockServer, safety_margin_seconds: u64) -> ServiceConfig {
    let yaml = format!(
        r#"
settings:
  safety_margin_seconds: {margin}
  max_concurrency: 4
  timeout_ms: 5000
auth:
  token_url: "{base}{token}"
  client_id: {{ value: "import-client" }}
  client_secret: {{ value: "s3cret" }}
  resource: {{ value: "tacs-api" }}
api:
  base_url: "{base}"
"#,
        margin = safety_margin_seconds,
        base = server.base_url(),
        token = TOKEN_PATH,
    );
    parse_config(yaml).await.expect("test config must be valid")
}

pub fn token_cache(config: &ServiceConfig) -> TokenCache {
    let client = build_client(config).expect("client");
    TokenCache::new(
        OAuth2Source::new(config.auth.clone(), client),
        config.settings.safety_margin_seconds(),
    )
}

pub fn fetcher(config: &ServiceConfig, cancel: CancellationToken) -> ResourceFetcher {
    let client = build_client(config).expect("client");
    build_fetcher(config, client, cancel).expect("fetcher")
}

pub fn engine<S: Sink>(config: &ServiceConfig, sink: Arc<S>, cancel: CancellationToken) -> TraversalEngine<S> {
    build_engine(config, sink, cancel).expect("engine")
}

pub async fn mock_token(server: &MockServer, expires_in: i64) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST).path(TOKEN_PATH);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "access_token": "tacs-token",
                    "expires_in": expires_in,
                    "token_type": "Bearer"
                }));
        })
        .await
}

pub async fn mock_get<'a>(server: &'a MockServer, path: &str, body: Value) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body);
        })
        .await
}

/// Only answers when `changesSince` carries the expected date.
pub async fn mock_get_since<'a>(server: &'a MockServer, path: &str, since: &str, body: Value) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path).query_param("changesSince", since);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body);
        })
        .await
}

pub async fn mock_leaf<'a>(server: &'a MockServer, path: &str, since: Option<&str>, body: Value) -> Mock<'a> {
    match since {
        Some(since) => mock_get_since(server, path, since, body).await,
        None => mock_get(server, path, body).await,
    }
}

pub async fn mock_status<'a>(server: &'a MockServer, path: &str, status: u16) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(status);
        })
        .await
}

// -------------------------------
// Fixtures
// -------------------------------

pub fn root_body() -> Value {
    json!({
        "statistikCodeUrl": "/api/v1/statistikcodes",
        "nutzniesserUrl": "/api/v1/nutzniesser",
        "variablenUrl": "/api/v1/variablen",
        "organisationUrl": "/api/v1/organisationen",
        "personalkategorieUrl": null,
        "anstellungLink": "/api/v1/anstellungen",
        "mappingsUrl": null,
        "massnahmenUrl": null
    })
}

pub fn organisation(id: &str) -> Value {
    json!({
        "organisationId": id,
        "bezeichnung": format!("Organisation {}", id),
        "variablenSetUrl": format!("/api/v1/organisationen/{}/variablen", id),
        "nutzniesserUrl": format!("/api/v1/organisationen/{}/nutzniesser", id),
        "statistikCodeUrl": format!("/api/v1/organisationen/{}/statistikcodes", id),
        "personalkategorieUrl": format!("/api/v1/organisationen/{}/personalkategorien", id)
    })
}

pub fn personalkategorie(organisation: &str, id: &str) -> Value {
    let base = format!("/api/v1/organisationen/{}/personalkategorien/{}", organisation, id);
    json!({
        "personalkategorieId": id,
        "variablenUrl": format!("{}/variablen", base),
        "nutzniesserUrl": format!("{}/nutzniesser", base),
        "statistikCodeUrl": format!("{}/statistikcodes", base)
    })
}

pub fn anstellung(id: &str) -> Value {
    json!({
        "anstellungsId": id,
        "variablenUrl": format!("/api/v1/anstellungen/{}/variablen", id),
        "nutzniesserUrl": format!("/api/v1/anstellungen/{}/nutzniesser", id),
        "statistikCodeUrl": format!("/api/v1/anstellungen/{}/statistikcodes", id)
    })
}

pub fn variablen_refs(codes: &[&str]) -> Value {
    Value::Array(
        codes
            .iter()
            .map(|c| json!({ "tacsCode": c, "gueltigAb": "2016-01-01", "gueltigBis": null }))
            .collect(),
    )
}

pub fn nutzniesser_refs(codes: &[&str]) -> Value {
    Value::Array(
        codes
            .iter()
            .map(|c| json!({ "nutzniesserCode": c, "gueltigAb": "2016-01-01" }))
            .collect(),
    )
}

pub fn statistik_code_refs(codes: &[&str]) -> Value {
    Value::Array(
        codes
            .iter()
            .map(|c| json!({ "statistikCode": c, "gueltigAb": "2016-01-01", "gueltigBis": "2030-12-31" }))
            .collect(),
    )
}

/// The three ref collections below `base`, codes prefixed with `prefix`.
pub async fn mock_refs<'a>(server: &'a MockServer, base: &str, prefix: &str, since: Option<&str>) -> Vec<Mock<'a>> {
    let (v1, v2) = (format!("{}-V1", prefix), format!("{}-V2", prefix));
    let n1 = format!("{}-N1", prefix);
    let s1 = format!("{}-S1", prefix);
    vec![
        mock_leaf(server, &format!("{}/variablen", base), since, variablen_refs(&[v1.as_str(), v2.as_str()])).await,
        mock_leaf(server, &format!("{}/nutzniesser", base), since, nutzniesser_refs(&[n1.as_str()])).await,
        mock_leaf(server, &format!("{}/statistikcodes", base), since, statistik_code_refs(&[s1.as_str()])).await,
    ]
}

/// Shape of the mocked resource graph
pub struct Graph {
    pub root: Value,
    pub variablen: Value,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            root: root_body(),
            variablen: json!([
                { "tacsCode": "V1", "bezeichung": "Pflege", "beschreibungMethodisch": "direkt", "sortierNummer": 1 },
                { "tacsCode": "V2", "bezeichung": "Betreuung", "sortierNummer": 2 }
            ]),
        }
    }
}

/// Root, four catalogs, organisation O1 with categories P1 and P2, employment E1.
/// With `since`, catalog and leaf mocks only answer filtered requests.
pub async fn mock_graph<'a>(server: &'a MockServer, graph: Graph, since: Option<&str>) -> Vec<Mock<'a>> {
    let mut mocks = vec![
        mock_get(server, ROOT_PATH, graph.root).await,
        mock_leaf(
            server,
            "/api/v1/statistikcodes",
            since,
            json!([{ "statistikCode": "S1", "bezeichnung": "Stationär", "gueltigAb": "2016-01-01" }]),
        )
        .await,
        mock_leaf(
            server,
            "/api/v1/nutzniesser",
            since,
            json!([{ "nutzniesserCode": "N1", "bezeichnung": "Bewohner", "gueltigAb": "2016-01-01", "gueltigBis": null }]),
        )
        .await,
        mock_leaf(server, "/api/v1/variablen", since, graph.variablen).await,
        // filtered for the catalog, unfiltered for the descent; same answer either way
        mock_get(server, "/api/v1/organisationen", json!([organisation("O1")])).await,
        mock_get(
            server,
            "/api/v1/organisationen/O1/personalkategorien",
            json!([personalkategorie("O1", "P1"), personalkategorie("O1", "P2")]),
        )
        .await,
        mock_get(server, "/api/v1/anstellungen", json!([anstellung("E1")])).await,
    ];
    mocks.extend(mock_refs(server, "/api/v1/organisationen/O1", "O1", since).await);
    mocks.extend(mock_refs(server, "/api/v1/organisationen/O1/personalkategorien/P1", "P1", since).await);
    mocks.extend(mock_refs(server, "/api/v1/organisationen/O1/personalkategorien/P2", "P2", since).await);
    mocks.extend(mock_refs(server, "/api/v1/anstellungen/E1", "E1", since).await);
    mocks
}
