#[cfg(test)]
mod test {

    use std::sync::Arc;

    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::Value;

    use crate::cache::token_manager::TokenManager;
    use crate::config::settings::SettingsConfig;
    use crate::server::server::router;
    use crate::tests::common::{credentials_for, json, spawn_axum};

    async fn manager_against(server: &MockServer) -> Arc<TokenManager> {
        Arc::new(TokenManager::from_credentials(&credentials_for(&server.base_url())).unwrap())
    }

    #[tokio::test]
    async fn healthz_reports_token_expiry() {
        let identity = MockServer::start_async().await;
        let mock = identity.mock_async(|when, then| {
            when.method(POST).path("/oauth2/platformtoken");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"access_token": "health-token", "expires_in": 900}));
        }).await;

        let mut settings = SettingsConfig::default();
        settings.metrics.is_enabled = true;
        let app = router(&settings, manager_against(&identity).await).await;
        let (handle, addr) = spawn_axum(app).await;
        let client = reqwest::Client::new();

        for _ in 0..2 {
            let response = client.get(format!("http://{}/healthz", addr)).send().await.unwrap();
            assert_eq!(response.status(), http::StatusCode::OK);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["status"], "ok");
            assert!(body["token_expires_at"].is_string());
        }
        assert_eq!(mock.calls_async().await, 1);

        let metrics = client.get(format!("http://{}/metrics", addr)).send().await.unwrap().text().await.unwrap();
        assert!(metrics.contains("cyberarkauth_token_requests_total"));
        assert!(!metrics.contains("health-token"));

        handle.abort();
    }

    #[tokio::test]
    async fn healthz_is_unavailable_when_identity_rejects() {
        let identity = MockServer::start_async().await;
        identity.mock_async(|when, then| {
            when.method(POST).path("/oauth2/platformtoken");
            then.status(403).body("forbidden");
        }).await;

        let app = router(&SettingsConfig::default(), manager_against(&identity).await).await;
        let (handle, addr) = spawn_axum(app).await;

        let response = reqwest::get(format!("http://{}/healthz", addr)).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "failed to authenticate");

        // metrics endpoint stays off unless enabled
        let metrics = reqwest::get(format!("http://{}/metrics", addr)).await.unwrap();
        assert_eq!(metrics.status(), http::StatusCode::NOT_FOUND);

        handle.abort();
    }
}
