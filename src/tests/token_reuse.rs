#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use httpmock::Method::POST;
    use httpmock::MockServer;
    use tokio::task::JoinSet;

    use crate::error::ImportError;
    use crate::tests::common::{mock_token, service_config, token_cache, TOKEN_PATH};

    #[tokio::test]
    async fn token_is_reused_within_its_lifetime() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, 3600).await;
        let config = service_config(&server, 30).await;
        let cache = token_cache(&config);

        let first = cache.get_token().await.expect("first token");
        let second = cache.get_token().await.expect("second token");

        assert_eq!(first.value, "tacs-token");
        assert_eq!(first.value, second.value);
        token_mock.assert_calls_async(1).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_token_request() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, 3600).await;
        let config = service_config(&server, 30).await;
        let cache = Arc::new(token_cache(&config));

        let mut set = JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            set.spawn(async move { cache.get_token().await });
        }
        while let Some(res) = set.join_next().await {
            let token = res.expect("join").expect("token");
            assert_eq!(token.bearer(), "Bearer tacs-token");
        }

        token_mock.assert_calls_async(1).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn expired_token_is_refreshed_once_for_concurrent_callers() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, 1).await;
        let config = service_config(&server, 0).await;
        let cache = Arc::new(token_cache(&config));

        cache.get_token().await.expect("initial token");
        token_mock.assert_calls_async(1).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let mut set = JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            set.spawn(async move { cache.get_token().await });
        }
        while let Some(res) = set.join_next().await {
            res.expect("join").expect("token");
        }

        // one initial request, one refresh
        token_mock.assert_calls_async(2).await;
    }

    #[tokio::test]
    async fn token_living_no_longer_than_the_margin_is_still_reused() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, 30).await;
        let config = service_config(&server, 30).await;
        let cache = token_cache(&config);

        for _ in 0..5 {
            cache.get_token().await.expect("token");
        }

        token_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn oversized_margin_is_capped_by_the_token_lifetime() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, 60).await;
        let config = service_config(&server, 120).await;
        let cache = token_cache(&config);

        cache.get_token().await.expect("first");
        cache.get_token().await.expect("second");

        token_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn default_margin_reuses_token_until_expiry() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, 2).await;
        let config = service_config(&server, 0).await;
        let cache = token_cache(&config);

        cache.get_token().await.expect("first");
        tokio::time::sleep(Duration::from_millis(1200)).await;
        cache.get_token().await.expect("still valid");

        token_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn out_of_range_expires_in_is_an_auth_error() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, i64::MAX).await;
        let config = service_config(&server, 0).await;
        let cache = token_cache(&config);

        let err = cache.get_token().await.expect_err("must fail");
        assert!(matches!(err, ImportError::Auth(_)), "unexpected error: {err}");
        assert!(err.to_string().contains("expires_in out of range"));

        // nothing was cached, the next caller asks again
        cache.get_token().await.expect_err("must fail again");
        token_mock.assert_calls_async(2).await;
    }

    #[tokio::test]
    async fn invalidated_token_is_fetched_again() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token(&server, 3600).await;
        let config = service_config(&server, 30).await;
        let cache = token_cache(&config);

        cache.get_token().await.expect("first");
        cache.invalidate().await;
        cache.get_token().await.expect("second");

        token_mock.assert_calls_async(2).await;
    }

    #[tokio::test]
    async fn rejected_token_request_is_an_auth_error() {
        let server = MockServer::start_async().await;
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN_PATH);
                then.status(400).body(r#"{"error":"invalid_client"}"#);
            })
            .await;
        let config = service_config(&server, 30).await;
        let cache = token_cache(&config);

        let err = cache.get_token().await.expect_err("must fail");
        assert!(matches!(err, ImportError::Auth(_)), "unexpected error: {err}");
        assert!(err.is_fatal());
        token_mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn token_response_without_access_token_is_an_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN_PATH);
                then.status(200)
                    .header("Content-Type", "application/json")
                    .body(r#"{"token_type":"Bearer"}"#);
            })
            .await;
        let config = service_config(&server, 30).await;
        let cache = token_cache(&config);

        let err = cache.get_token().await.expect_err("must fail");
        assert!(matches!(err, ImportError::Auth(_)));
    }
}
