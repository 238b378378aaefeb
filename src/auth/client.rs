use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::auth::{normalize_scopes, RefreshFn, RetryDecorator, TokenSource};
use crate::cache::token::Token;
use crate::cache::token_state::TokenState;
use crate::credentials::{load_descriptor, CredentialSource, CredentialType, Environment};
use crate::error::{Error, Result};
use crate::helpers::time::{get_instant, now};
use crate::observability::metrics::get_metrics;
use crate::sources::{build_source, SourceOptions};
use crate::utils::constants::{
    DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_TOKEN_TTL_LEEWAY_SECS, DEFAULT_TOKEN_TTL_SECS, GCE_ENDPOINT_TOKEN,
};

type SharedRefresh = Shared<BoxFuture<'static, Result<()>>>;

/// GCP OAuth 2.0 access token session.
///
/// Cheap to clone; clones share the cached token and the in-flight refresh.
/// Concurrent callers that find the token missing or stale all wait on a single
/// refresh and observe its outcome, success or failure.
#[derive(Clone)]
pub struct GcpToken {
    inner: Arc<Inner>,
}

struct Inner {
    credential_type: CredentialType,
    token_uri: String,
    scopes: Vec<String>,
    token_ttl_leeway: i64,
    timeout: Duration,
    refresh: RefreshFn,
    slot: Mutex<TokenSlot>,
}

#[derive(Default)]
struct TokenSlot {
    state: TokenState,
    in_flight: Option<InFlight>,
    generation: u64,
}

struct InFlight {
    generation: u64,
    task: SharedRefresh,
}

enum Next {
    Cached,
    Wait(SharedRefresh),
}

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, TokenSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, token: Token) {
        self.lock_slot().state.replace(token, now());
    }
}

/// Clears the in-flight marker of its own refresh, however that refresh ends.
struct InFlightGuard {
    inner: Weak<Inner>,
    generation: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut slot = inner.lock_slot();
            if slot.in_flight.as_ref().is_some_and(|f| f.generation == self.generation) {
                slot.in_flight = None;
            }
        }
    }
}

impl GcpToken {
    pub fn builder(http_client: Client) -> GcpTokenBuilder {
        GcpTokenBuilder::new(http_client)
    }

    /// Discover credentials with every setting at its default.
    pub fn new(http_client: Client) -> Result<Self> {
        GcpTokenBuilder::new(http_client).build()
    }

    pub fn credential_type(&self) -> CredentialType {
        self.inner.credential_type
    }

    pub fn token_uri(&self) -> &str {
        &self.inner.token_uri
    }

    pub fn scopes(&self) -> &[String] {
        &self.inner.scopes
    }

    /// Get a currently valid token, refreshing it first when needed.
    ///
    /// The string is empty only if the token endpoint itself returned an empty token.
    pub async fn get_token(&self) -> Result<String> {
        self.ensure_token().await?;
        Ok(self.inner.lock_slot().state.access_token().to_owned())
    }

    /// Make sure the token is available and up to date.
    pub async fn ensure_token(&self) -> Result<()> {
        let next = {
            let mut slot = self.inner.lock_slot();
            let pending = slot
                .in_flight
                .as_ref()
                .filter(|f| f.task.peek().is_none())
                .map(|f| f.task.clone());

            if let Some(task) = pending {
                debug!("token refresh already in flight, waiting for it");
                Next::Wait(task)
            } else if slot.state.is_fresh_at(now(), self.inner.token_ttl_leeway) {
                Next::Cached
            } else {
                slot.generation += 1;
                let generation = slot.generation;
                let task = self.refresh_task(generation);
                slot.in_flight = Some(InFlight { generation, task: task.clone() });
                Next::Wait(task)
            }
        };

        match next {
            Next::Cached => {
                debug!("cached token is fresh");
                get_metrics()
                    .await
                    .token_cache_hits
                    .with_label_values(&[self.inner.credential_type.as_str()])
                    .inc();
                Ok(())
            }
            Next::Wait(task) => task.await,
        }
    }

    /// Fetch a new token right away and cache it, bypassing the in-flight bookkeeping.
    ///
    /// Failures leave the cached token untouched.
    pub async fn acquire_access_token(&self, timeout: Duration) -> Result<()> {
        let token = timed_refresh(&self.inner.refresh, timeout, self.inner.credential_type).await?;
        self.inner.store(token);
        Ok(())
    }

    fn refresh_task(&self, generation: u64) -> SharedRefresh {
        // the task must not keep the session alive, it is stored inside it
        let weak = Arc::downgrade(&self.inner);
        let refresh = self.inner.refresh.clone();
        let timeout = self.inner.timeout;
        let credential_type = self.inner.credential_type;

        async move {
            let _clear = InFlightGuard { inner: weak.clone(), generation };
            let token = timed_refresh(&refresh, timeout, credential_type).await?;
            if let Some(inner) = weak.upgrade() {
                inner.store(token);
            }
            Ok(())
        }
        .boxed()
        .shared()
    }
}

async fn timed_refresh(refresh: &RefreshFn, timeout: Duration, credential_type: CredentialType) -> Result<Token> {
    let metrics = get_metrics().await;
    let label = [credential_type.as_str()];
    let start = get_instant();
    metrics.token_refresh_requests.with_label_values(&label).inc();

    let result = refresh(timeout).await;
    metrics.token_refresh_duration.with_label_values(&label).observe(start.elapsed().as_secs_f64());

    match &result {
        Ok(token) => info!(%credential_type, expires_in = token.expires_in, "access token refreshed"),
        Err(err) => {
            metrics.token_refresh_failures.with_label_values(&label).inc();
            warn!(%credential_type, error = %err, "access token refresh failed");
        }
    }
    result
}

impl TokenSource for GcpToken {
    fn get_token(&self) -> impl Future<Output = Result<String>> + Send {
        GcpToken::get_token(self)
    }

    fn scopes(&self) -> &[String] {
        &self.inner.scopes
    }
}

impl fmt::Debug for GcpToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcpToken")
            .field("credential_type", &self.inner.credential_type)
            .field("token_uri", &self.inner.token_uri)
            .field("scopes", &self.inner.scopes)
            .finish_non_exhaustive()
    }
}

/// Construction parameters for [`GcpToken`].
pub struct GcpTokenBuilder {
    http_client: Client,
    credentials: Option<CredentialSource>,
    scopes: Vec<String>,
    retry: Option<RetryDecorator>,
    default_token_ttl: i64,
    token_ttl_leeway: i64,
    timeout: Duration,
    metadata_endpoint: String,
    environment: Option<Environment>,
}

impl GcpTokenBuilder {
    pub fn new(http_client: Client) -> Self {
        Self {
            http_client,
            credentials: None,
            scopes: Vec::new(),
            retry: None,
            default_token_ttl: DEFAULT_TOKEN_TTL_SECS,
            token_ttl_leeway: DEFAULT_TOKEN_TTL_LEEWAY_SECS,
            timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            metadata_endpoint: GCE_ENDPOINT_TOKEN.to_owned(),
            environment: None,
        }
    }

    /// Explicit credentials file or in-memory descriptor
    pub fn credentials(mut self, source: impl Into<CredentialSource>) -> Self {
        self.credentials = Some(source.into());
        self
    }

    /// Merge the scopes of every client that will share this session.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = normalize_scopes(scopes);
        self
    }

    pub fn retry(mut self, decorator: RetryDecorator) -> Self {
        self.retry = Some(decorator);
        self
    }

    /// Assertion lifetime for service accounts, limited to 65 minutes by GCP.
    pub fn default_token_ttl(mut self, seconds: i64) -> Self {
        self.default_token_ttl = seconds;
        self
    }

    /// Refresh the token this many seconds before it expires.
    pub fn token_ttl_leeway(mut self, seconds: i64) -> Self {
        self.token_ttl_leeway = seconds;
        self
    }

    /// Timeout of a single refresh request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn metadata_endpoint(mut self, url: impl Into<String>) -> Self {
        self.metadata_endpoint = url.into();
        self
    }

    /// Use these environment values instead of reading the process environment.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn build(self) -> Result<GcpToken> {
        let environment = self.environment.unwrap_or_else(Environment::from_process);
        let descriptor = load_descriptor(self.credentials, &environment)?;
        let credential_type = descriptor.credential_type()?;

        // an unscoped service account request is always rejected remotely
        if credential_type == CredentialType::ServiceAccount && self.scopes.is_empty() {
            return Err(Error::Config(
                "Scopes must be provided when token type is service account".to_string(),
            ));
        }

        let options = SourceOptions {
            scopes: self.scopes.join(" "),
            default_token_ttl: self.default_token_ttl,
            metadata_endpoint: self.metadata_endpoint,
        };
        let source = Arc::new(build_source(&descriptor, &options)?);
        let token_uri = source.token_uri().to_owned();

        let http_client = self.http_client;
        let fetch: RefreshFn = Arc::new(move |timeout: Duration| {
            let source = source.clone();
            let http_client = http_client.clone();
            async move { source.fetch_token(&http_client, timeout).await }.boxed()
        });
        let refresh = match self.retry {
            Some(decorate) => decorate(fetch),
            None => fetch,
        };

        info!(%credential_type, token_uri = %token_uri, scopes = self.scopes.len(), "token session ready");

        Ok(GcpToken {
            inner: Arc::new(Inner {
                credential_type,
                token_uri,
                scopes: self.scopes,
                token_ttl_leeway: self.token_ttl_leeway,
                timeout: self.timeout,
                refresh,
                slot: Mutex::new(TokenSlot::default()),
            }),
        })
    }
}
