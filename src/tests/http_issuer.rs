#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use http::Method;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    use crate::config::service::{GenericSourceValue, IssuerConfig};
    use crate::error::PoolError;
    use crate::issuer::adapter::TokenSourceAdapter;
    use crate::issuer::http::HttpTokenIssuer;
    use crate::issuer::IssueToken;
    use crate::tests::common::APP_ID;

    fn issuer_config(url: String) -> IssuerConfig {
        let mut headers = HashMap::new();
        headers.insert(
            "authorization".to_string(),
            GenericSourceValue::Literal { value: "Bearer issuer-secret".into() },
        );
        IssuerConfig {
            url,
            method: Method::POST,
            app_id: APP_ID.into(),
            project_id: "demo".into(),
            headers: Some(headers),
            timeout_ms: 2000,
            min_ttl_seconds: 1800,
            max_ttl_seconds: 604800,
        }
    }

    #[tokio::test]
    async fn issues_token_with_configured_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/issue")
                    .header("authorization", "Bearer issuer-secret")
                    .json_body(json!({ "appId": APP_ID, "ttlMillis": 1_800_000 }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "token": "signed.jwt.value", "ttlMillis": 1_800_000 }));
            })
            .await;

        let issuer = HttpTokenIssuer::new(&issuer_config(server.url("/issue"))).unwrap();
        let issued = issuer.issue(APP_ID, 1_800_000).await.unwrap();

        assert_eq!(issued.token, "signed.jwt.value");
        assert_eq!(issued.ttl_millis, Some(1_800_000));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn vendor_rejection_carries_code() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/issue");
                then.status(400).json_body(json!({
                    "code": "app-check/invalid-app-resource-name",
                    "message": "bad app id"
                }));
            })
            .await;

        let issuer = HttpTokenIssuer::new(&issuer_config(server.url("/issue"))).unwrap();
        let err = issuer.issue(APP_ID, 1_800_000).await.unwrap_err();

        assert_eq!(
            err,
            PoolError::issuance("app-check/invalid-app-resource-name", "bad app id")
        );
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_issuance_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/issue");
                then.status(200).body("not json");
            })
            .await;

        let issuer = HttpTokenIssuer::new(&issuer_config(server.url("/issue"))).unwrap();
        let err = issuer.issue(APP_ID, 1_800_000).await.unwrap_err();

        assert_eq!(err.code(), Some("invalid-response"));
    }

    #[tokio::test]
    async fn adapter_rejects_bad_arguments_without_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200).json_body(json!({ "token": "t" }));
            })
            .await;

        let issuer = HttpTokenIssuer::new(&issuer_config(server.url("/issue"))).unwrap();
        let adapter = TokenSourceAdapter::new(issuer, 1800, 604800);

        assert!(matches!(adapter.issue("", 1800).await, Err(PoolError::InvalidArgument(_))));
        assert!(matches!(adapter.issue(APP_ID, 60).await, Err(PoolError::InvalidArgument(_))));
        assert!(matches!(adapter.issue(APP_ID, 604801).await, Err(PoolError::InvalidArgument(_))));
        assert_eq!(mock.hits(), 0);

        let record = adapter.issue(APP_ID, 1800).await.unwrap();
        assert_eq!(record.token, "t");
        assert_eq!(record.ttl, 1800);
        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn adapter_rejects_ttl_beyond_millisecond_range() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200).json_body(json!({ "token": "t" }));
            })
            .await;

        let issuer = HttpTokenIssuer::new(&issuer_config(server.url("/issue"))).unwrap();
        let adapter = TokenSourceAdapter::new(issuer, 1, u64::MAX);

        let err = adapter.issue(APP_ID, u64::MAX / 2).await.unwrap_err();
        assert!(matches!(err, PoolError::InvalidArgument(_)));
        assert!(adapter.check_ttl(u64::MAX / 2).is_err());
        assert_eq!(mock.hits(), 0);
    }
}
