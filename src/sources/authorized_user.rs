use std::fmt;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use reqwest::Client;

use crate::cache::token::Token;
use crate::credentials::CredentialDescriptor;
use crate::error::Result;
use crate::sources::parse_token_response;
use crate::utils::constants::{DEFAULT_TOKEN_URI, FORM_CONTENT_TYPE, GRANT_TYPE_REFRESH_TOKEN};

/// End-user credentials (`gcloud auth application-default login`), exchanged
/// through the OAuth 2.0 refresh-token grant.
#[derive(Clone)]
pub struct AuthorizedUserSource {
    pub token_uri: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl AuthorizedUserSource {
    pub fn new(descriptor: &CredentialDescriptor) -> Result<Self> {
        Ok(Self {
            token_uri: descriptor.get_str("token_uri").unwrap_or(DEFAULT_TOKEN_URI).to_owned(),
            client_id: descriptor.require_str("client_id")?.to_owned(),
            client_secret: descriptor.require_str("client_secret")?.to_owned(),
            refresh_token: descriptor.require_str("refresh_token")?.to_owned(),
        })
    }

    pub async fn fetch_token(&self, client: &Client, timeout: Duration) -> Result<Token> {
        let form = [
            ("grant_type", GRANT_TYPE_REFRESH_TOKEN),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = client
            .post(&self.token_uri)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .form(&form)
            .timeout(timeout)
            .send()
            .await?;
        parse_token_response(response).await
    }
}

impl fmt::Debug for AuthorizedUserSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedUserSource")
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
