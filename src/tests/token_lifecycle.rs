#[cfg(test)]
mod test {

    use chrono::TimeDelta;
    use httpmock::Method::POST;
    use httpmock::MockServer;

    use crate::cache::token_manager::TokenManager;
    use crate::errors::AuthError;
    use crate::helpers::time::{Clock, ManualClock};
    use crate::observability::metrics::get_metrics;
    use crate::sources::PlatformTokenSource;
    use crate::tests::common::{credentials_for, fetched, json, ScriptedSource};

    #[tokio::test]
    async fn fresh_manager_has_no_token_and_fetches_once() {
        let manager = TokenManager::new(ScriptedSource::new());
        assert!(!manager.has_valid_token().await);
        assert!(manager.cached_expiry().await.is_none());

        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "tok-1");
        assert_eq!(manager.source().calls(), 1);
        assert!(manager.has_valid_token().await);
    }

    #[tokio::test]
    async fn sequential_calls_reuse_cached_token() {
        let manager = TokenManager::new(ScriptedSource::new());

        let first = manager.get_valid_token().await.unwrap();
        let second = manager.get_valid_token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.source().calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refresh_of_unexpired_token() {
        let manager = TokenManager::new(ScriptedSource::new());
        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-1");

        manager.invalidate().await;
        assert!(!manager.has_valid_token().await);

        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-2");
        assert_eq!(manager.source().calls(), 2);
    }

    #[tokio::test]
    async fn conditional_invalidate_spares_a_replaced_token() {
        let manager = TokenManager::new(ScriptedSource::new());
        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-1");

        assert!(manager.invalidate_if_current("tok-1").await);
        assert!(!manager.invalidate_if_current("tok-1").await);
        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-2");

        // a late rejection of tok-1 must not evict tok-2
        assert!(!manager.invalidate_if_current("tok-1").await);
        assert!(manager.has_valid_token().await);
        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-2");
        assert_eq!(manager.source().calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_clears_expiry_gauge() {
        let start = chrono::DateTime::from_timestamp(1_000_000_000, 0).unwrap();
        let manager = TokenManager::new(ScriptedSource::new().with_expires_in(Some(7)))
            .with_clock(ManualClock::starting_at(start));
        manager.get_valid_token().await.unwrap();

        manager.invalidate().await;

        // other tests share the registry, so only check that this expiry is gone
        let gauge = get_metrics().await.token_expiry_unix.get();
        assert_ne!(gauge, 1_000_000_007);
    }

    #[tokio::test]
    async fn missing_access_token_leaves_cache_empty() {
        let manager = TokenManager::new(ScriptedSource::new().then(Err(AuthError::MissingAccessToken)));

        let err = manager.get_valid_token().await.unwrap_err();
        assert_eq!(err.kind(), "missing access token");
        assert!(manager.cached_expiry().await.is_none());
    }

    #[tokio::test]
    async fn omitted_expires_in_defaults_to_fifteen_minutes() {
        let clock = ManualClock::new();
        let manager = TokenManager::new(ScriptedSource::new().with_expires_in(None)).with_clock(clock.clone());

        manager.get_valid_token().await.unwrap();

        let expected = clock.now() + TimeDelta::seconds(900);
        assert_eq!(manager.cached_expiry().await, Some(expected));
    }

    #[tokio::test]
    async fn safety_margin_decides_when_to_refresh() {
        let clock = ManualClock::new();
        let manager = TokenManager::new(ScriptedSource::new().with_expires_in(Some(120))).with_clock(clock.clone());
        manager.get_valid_token().await.unwrap();

        // 61s left: still served from cache
        clock.advance(TimeDelta::seconds(59));
        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-1");
        assert_eq!(manager.source().calls(), 1);

        // 59s left: inside the 60s margin
        clock.advance(TimeDelta::seconds(2));
        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-2");
        assert_eq!(manager.source().calls(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_token_untouched() {
        let clock = ManualClock::new();
        let source = ScriptedSource::new()
            .then(Ok(fetched("tok-a", Some(100))))
            .then(Err(AuthError::InvalidResponseFormat { reason: "truncated".into() }))
            .then(Ok(fetched("tok-b", Some(3600))));
        let manager = TokenManager::new(source).with_clock(clock.clone());

        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-a");
        let first_expiry = manager.cached_expiry().await;

        clock.advance(TimeDelta::seconds(50));
        let err = manager.get_valid_token().await.unwrap_err();
        assert_eq!(err.kind(), "invalid response format");
        assert_eq!(manager.cached_expiry().await, first_expiry);

        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-b");
        assert_eq!(manager.source().calls(), 3);
    }

    #[tokio::test]
    async fn custom_safety_margin_is_honoured() {
        let clock = ManualClock::new();
        let manager = TokenManager::new(ScriptedSource::new().with_expires_in(Some(10)))
            .with_clock(clock.clone())
            .with_safety_margin_seconds(0);

        manager.get_valid_token().await.unwrap();
        clock.advance(TimeDelta::seconds(9));
        assert!(manager.has_valid_token().await);
        clock.advance(TimeDelta::seconds(1));
        assert!(!manager.has_valid_token().await);
    }

    #[tokio::test]
    async fn auth_header_carries_bearer_token() {
        let manager = TokenManager::new(ScriptedSource::new());

        let headers = manager.get_auth_header().await.unwrap();
        let value = headers.get(http::header::AUTHORIZATION).unwrap();

        assert_eq!(value.to_str().unwrap(), "Bearer tok-1");
        assert!(value.is_sensitive());
    }

    #[tokio::test]
    async fn short_lived_token_is_refetched_after_virtual_time_passes() {
        let server = MockServer::start_async().await;
        let first = server.mock_async(|when, then| {
            when.method(POST).path("/oauth2/platformtoken");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"access_token": "tok-1", "expires_in": 2}));
        }).await;

        let clock = ManualClock::new();
        let source = PlatformTokenSource::new(&credentials_for(&server.base_url())).unwrap();
        let manager = TokenManager::new(source).with_clock(clock.clone());

        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-1");
        assert_eq!(first.calls_async().await, 1);

        first.delete_async().await;
        let second = server.mock_async(|when, then| {
            when.method(POST).path("/oauth2/platformtoken");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"access_token": "tok-2", "expires_in": 2}));
        }).await;

        clock.advance(TimeDelta::seconds(3));
        assert_eq!(manager.get_valid_token().await.unwrap(), "tok-2");
        assert_eq!(second.calls_async().await, 1);
    }
}
