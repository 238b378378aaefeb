use std::fmt;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::cache::token::Token;
use crate::credentials::CredentialDescriptor;
use crate::error::{Error, Result};
use crate::helpers::time::now_i64;
use crate::sources::{parse_token_response, SourceOptions};
use crate::utils::constants::{DEFAULT_TOKEN_URI, FORM_CONTENT_TYPE, GRANT_TYPE_JWT_BEARER};

/// Claims of the self-signed assertion exchanged for an access token
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub scope: String,
}

/// Service account key, exchanged through the JWT-bearer grant.
#[derive(Clone)]
pub struct ServiceAccountSource {
    pub token_uri: String,
    pub client_email: String,
    scopes: String,
    default_token_ttl: i64,
    key_id: Option<String>,
    key: EncodingKey,
}

impl ServiceAccountSource {
    pub fn new(descriptor: &CredentialDescriptor, options: &SourceOptions) -> Result<Self> {
        let private_key = descriptor.require_str("private_key")?;
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|err| Error::Config(format!("service account private key is not a valid RSA PEM: {err}")))?;

        Ok(Self {
            token_uri: descriptor.get_str("token_uri").unwrap_or(DEFAULT_TOKEN_URI).to_owned(),
            client_email: descriptor.require_str("client_email")?.to_owned(),
            scopes: options.scopes.clone(),
            default_token_ttl: options.default_token_ttl,
            key_id: descriptor.get_str("private_key_id").map(str::to_owned),
            key,
        })
    }

    pub fn claims(&self, now: i64) -> AssertionClaims {
        AssertionClaims {
            aud: self.token_uri.clone(),
            exp: now + self.default_token_ttl,
            iat: now,
            iss: self.client_email.clone(),
            scope: self.scopes.clone(),
        }
    }

    /// RS256-signed assertion for the current time
    pub fn assertion(&self) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        let claims = self.claims(now_i64());
        Ok(jsonwebtoken::encode(&header, &claims, &self.key)?)
    }

    pub async fn fetch_token(&self, client: &Client, timeout: Duration) -> Result<Token> {
        let assertion = self.assertion()?;
        let form = [("assertion", assertion.as_str()), ("grant_type", GRANT_TYPE_JWT_BEARER)];

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

impl fmt::Debug for ServiceAccountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountSource")
            .field("token_uri", &self.token_uri)
            .field("client_email", &self.client_email)
            .field("scopes", &self.scopes)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
