#[cfg(test)]
mod test {

    use std::sync::Arc;
    use std::time::Duration;

    use futures::future::join_all;
    use httpmock::Method::POST;
    use httpmock::MockServer;

    use crate::cache::token_manager::TokenManager;
    use crate::errors::AuthError;
    use crate::sources::PlatformTokenSource;
    use crate::tests::common::{credentials_for, json, ScriptedSource};

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let manager = TokenManager::new(ScriptedSource::new().with_delay(Duration::from_millis(200)));

        let results = join_all((0..5).map(|_| manager.get_valid_token())).await;

        assert_eq!(manager.source().calls(), 1);
        for result in results {
            assert_eq!(result.unwrap(), "tok-1");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_hit_identity_provider_once() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.method(POST).path("/oauth2/platformtoken");
            then.status(200)
                .header("Content-Type", "application/json")
                .delay(Duration::from_millis(300))
                .json_body(json!({"access_token": "shared-token", "expires_in": 900}));
        }).await;

        let source = PlatformTokenSource::new(&credentials_for(&server.base_url())).unwrap();
        let manager = Arc::new(TokenManager::new(source));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_valid_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared-token");
        }
        assert_eq!(mock.calls_async().await, 1);
    }

    #[tokio::test]
    async fn failure_is_not_shared_with_queued_callers() {
        let source = ScriptedSource::new()
            .with_delay(Duration::from_millis(50))
            .then(Err(AuthError::MissingAccessToken));
        let manager = TokenManager::new(source);

        let results = join_all((0..5).map(|_| manager.get_valid_token())).await;

        let failures = results.iter().filter(|r| r.is_err()).count();
        let tokens: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(failures, 1);
        assert_eq!(tokens.len(), 4);
        assert!(tokens.iter().all(|t| t == "tok-2"));
        assert_eq!(manager.source().calls(), 2);
    }

    #[tokio::test]
    async fn cancelled_fetch_releases_lock() {
        let manager = Arc::new(TokenManager::new(
            ScriptedSource::new().with_delay(Duration::from_millis(500)),
        ));

        let pending = tokio::spawn({
            let manager = manager.clone();
            async move { manager.get_valid_token().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        pending.abort();
        let _ = pending.await;

        assert!(manager.cached_expiry().await.is_none());
        let token = tokio::time::timeout(Duration::from_secs(5), manager.get_valid_token())
            .await
            .expect("lock was not released")
            .unwrap();
        assert_eq!(token, "tok-2");
        assert_eq!(manager.source().calls(), 2);
    }
}
