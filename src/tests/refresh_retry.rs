#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Json;
    use serde_json::Value;

    use crate::auth::GcpToken;
    use crate::error::Error;
    use crate::resilience::retry::RetrySettings;
    use crate::tests::common::{bare_environment, build_reqwest_client, json, spawn_axum, Router};

    fn fast_retry(attempts: u32) -> RetrySettings {
        RetrySettings { attempts, base_delay_ms: 10, max_delay_ms: 40 }
    }

    /// Metadata server answering `failures` times with `status` before handing out a token.
    async fn flaky_metadata(failures: usize, status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/token",
                get(|State((hits, failures, status)): State<(Arc<AtomicUsize>, usize, StatusCode)>| async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        (status, Json(json!({"error": "try again"})))
                    } else {
                        (StatusCode::OK, Json(json!({"access_token": format!("token-{n}"), "expires_in": 3600})))
                    }
                }),
            )
            .with_state((hits.clone(), failures, status));

        let (_handle, addr) = spawn_axum(router).await;
        (format!("http://{addr}/token"), hits)
    }

    #[tokio::test]
    async fn retry_decorator_recovers_from_transient_failures() {
        let (url, hits) = flaky_metadata(2, StatusCode::SERVICE_UNAVAILABLE).await;

        let session = GcpToken::builder(build_reqwest_client())
            .environment(bare_environment())
            .metadata_endpoint(url)
            .retry(fast_retry(3).decorator())
            .build()
            .unwrap();

        assert_eq!(session.get_token().await.unwrap(), "token-2");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_decorator_gives_up_after_attempts() {
        let (url, hits) = flaky_metadata(3, StatusCode::SERVICE_UNAVAILABLE).await;

        let session = GcpToken::builder(build_reqwest_client())
            .environment(bare_environment())
            .metadata_endpoint(url)
            .retry(fast_retry(2).decorator())
            .build()
            .unwrap();

        assert!(matches!(session.get_token().await, Err(Error::Status { status: 503, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // the session stays usable: the next call starts a fresh, retried refresh
        assert_eq!(session.get_token().await.unwrap(), "token-3");
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn without_decorator_a_failure_is_final() {
        let (url, hits) = flaky_metadata(1, StatusCode::SERVICE_UNAVAILABLE).await;

        let session = GcpToken::builder(build_reqwest_client())
            .environment(bare_environment())
            .metadata_endpoint(url)
            .build()
            .unwrap();

        let err = session.get_token().await.unwrap_err();
        match err {
            Error::Status { status, body } => {
                assert_eq!(status, 503);
                let body: Value = serde_json::from_str(&body).unwrap();
                assert_eq!(body["error"], "try again");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
