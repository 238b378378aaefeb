//! # Token sessions
//!
//! [`GcpToken`] hands out a currently valid OAuth 2.0 access token, refreshing it
//! through the source matching the discovered credentials. [`AnonymousToken`] is
//! the offline stand-in used by tests and emulators.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::cache::token::Token;
use crate::error::Result;

pub mod anonymous;
pub mod client;

pub use anonymous::{AnonymousToken, ANONYMOUS_TOKEN};
pub use client::{GcpToken, GcpTokenBuilder};

/// One refresh attempt against the token endpoint, bounded by the given timeout.
pub type RefreshFuture = BoxFuture<'static, Result<Token>>;
pub type RefreshFn = Arc<dyn Fn(Duration) -> RefreshFuture + Send + Sync>;

/// Caller-supplied resilience layer, applied once to the refresh operation.
pub type RetryDecorator = Arc<dyn Fn(RefreshFn) -> RefreshFn + Send + Sync>;

/// Anything able to produce a bearer token for outgoing requests.
pub trait TokenSource: Send + Sync {
    fn get_token(&self) -> impl Future<Output = Result<String>> + Send;

    /// Scopes the tokens are requested for.
    fn scopes(&self) -> &[String];
}

/// Trim, drop blanks and duplicates, keep order.
pub(crate) fn normalize_scopes<I, S>(scopes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut normalized: Vec<String> = Vec::new();
    for scope in scopes {
        let scope = scope.into().trim().to_owned();
        if !scope.is_empty() && !normalized.contains(&scope) {
            normalized.push(scope);
        }
    }
    normalized
}
