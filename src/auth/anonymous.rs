use std::future::Future;

use crate::auth::{normalize_scopes, TokenSource};
use crate::error::Result;

pub const ANONYMOUS_TOKEN: &str = "fake";

/// Fake token generator: no network, no refresh bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct AnonymousToken {
    scopes: Vec<String>,
}

impl AnonymousToken {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { scopes: normalize_scopes(scopes) }
    }

    pub async fn get_token(&self) -> Result<String> {
        Ok(ANONYMOUS_TOKEN.to_owned())
    }
}

impl TokenSource for AnonymousToken {
    fn get_token(&self) -> impl Future<Output = Result<String>> + Send {
        AnonymousToken::get_token(self)
    }

    fn scopes(&self) -> &[String] {
        &self.scopes
    }
}
