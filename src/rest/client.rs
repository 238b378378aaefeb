use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::StatusCode;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::TokenSource;
use crate::error::{Error, Result};
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::rest::errors::ErrorResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }
}

/// Authorized JSON requests against one Google Cloud API root.
///
/// Every request carries a bearer token taken from the shared token source.
/// With retry settings, calls failing with a retryable error are repeated.
#[derive(Debug)]
pub struct RestClient<S> {
    token_source: Arc<S>,
    http_client: Client,
    api_root: String,
    retry: Option<RetrySettings>,
}

impl<S: TokenSource> RestClient<S> {
    pub fn new(token_source: Arc<S>, http_client: Client, api_root: impl Into<String>, retry: Option<RetrySettings>) -> Self {
        Self { token_source, http_client, api_root: api_root.into(), retry }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn token_source(&self) -> &S {
        &self.token_source
    }

    pub async fn get_headers(&self) -> Result<HeaderMap> {
        let token = self.token_source.get_token().await?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| Error::InvalidArgument(format!("access token is not a valid header value: {err}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send `payload` with `method` and decode the 2xx response body as `T`.
    pub async fn send_request<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &[u8],
        timeout: Option<Duration>,
        method: RequestMethod,
    ) -> Result<T> {
        match &self.retry {
            Some(retry) => retry.run_with_retry(|| self.send_once(url, payload, timeout, method)).await,
            None => self.send_once(url, payload, timeout, method).await,
        }
    }

    pub async fn get_request<T: DeserializeOwned>(&self, url: &str, timeout: Option<Duration>) -> Result<T> {
        match &self.retry {
            Some(retry) => retry.run_with_retry(|| self.get_once(url, timeout)).await,
            None => self.get_once(url, timeout).await,
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &[u8],
        timeout: Option<Duration>,
        method: RequestMethod,
    ) -> Result<T> {
        let headers = self.get_headers().await?;
        let request = match method {
            RequestMethod::Post => self.http_client.post(url),
            RequestMethod::Put => self.http_client.put(url),
            RequestMethod::Patch => self.http_client.patch(url),
            RequestMethod::Delete => self.http_client.delete(url),
        };
        let request = request.headers(headers).body(payload.to_vec());
        execute(request, timeout, method.as_str()).await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str, timeout: Option<Duration>) -> Result<T> {
        let headers = self.get_headers().await?;
        let request = self.http_client.get(url).headers(headers);
        execute(request, timeout, "GET").await
    }
}

async fn execute<T: DeserializeOwned>(request: RequestBuilder, timeout: Option<Duration>, method: &str) -> Result<T> {
    // without a timeout the client default applies
    let request = match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    };

    let response = request.send().await?;
    let status = response.status();
    get_metrics().await.rest_requests.with_label_values(&[method, status.as_str()]).inc();

    let body = response.text().await?;
    if status.is_success() {
        debug!(method, status = status.as_u16(), "google cloud request succeeded");
        return Ok(serde_json::from_str(&body)?);
    }

    let err = error_for_status(status, &body);
    warn!(method, status = status.as_u16(), error = %err, "google cloud request failed");
    Err(err)
}

/// Map a non-2xx response onto the retryable / non-retryable error split.
///
/// <https://cloud.google.com/bigquery/docs/error-messages>
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> Error {
    let status_code = status.as_u16();

    if matches!(status_code, 500 | 502 | 503 | 504) {
        let rpc_status = if status_code == 500 { "INTERNAL" } else { "UNAVAILABLE" };
        return Error::ServiceUnavailable {
            status_code,
            error: ErrorResponse::new(status_code, "Request to Google Cloud failed", rpc_status),
        };
    }

    let error = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|mut value| value.get_mut("error").map(serde_json::Value::take))
        .filter(|details| !details.is_null())
        .and_then(|details| serde_json::from_value::<ErrorResponse>(details).ok())
        .unwrap_or_else(|| ErrorResponse::new(status_code, "Bad response from Google Cloud", "UNKNOWN"));

    Error::Request { status_code, error }
}
