//! Token sources
//!
//! One variant per credential type, chosen once when the token facade is built.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;

use crate::cache::token::Token;
use crate::credentials::{CredentialDescriptor, CredentialType};
use crate::error::{Error, Result};

pub mod authorized_user;
pub mod metadata;
pub mod service_account;

use authorized_user::AuthorizedUserSource;
use metadata::MetadataSource;
use service_account::ServiceAccountSource;

/// Inputs every source may need besides the descriptor itself.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Space-joined scopes
    pub scopes: String,
    pub default_token_ttl: i64,
    pub metadata_endpoint: String,
}

#[derive(Debug, Clone)]
pub enum SourceKind {
    AuthorizedUser(AuthorizedUserSource),
    Metadata(MetadataSource),
    ServiceAccount(ServiceAccountSource),
}

impl SourceKind {
    pub fn credential_type(&self) -> CredentialType {
        match self {
            SourceKind::AuthorizedUser(_) => CredentialType::AuthorizedUser,
            SourceKind::Metadata(_) => CredentialType::GceMetadata,
            SourceKind::ServiceAccount(_) => CredentialType::ServiceAccount,
        }
    }

    pub fn token_uri(&self) -> &str {
        match self {
            SourceKind::AuthorizedUser(s) => &s.token_uri,
            SourceKind::Metadata(s) => &s.endpoint,
            SourceKind::ServiceAccount(s) => &s.token_uri,
        }
    }

    pub async fn fetch_token(&self, client: &Client, timeout: Duration) -> Result<Token> {
        match self {
            SourceKind::AuthorizedUser(s) => s.fetch_token(client, timeout).await,
            SourceKind::Metadata(s) => s.fetch_token(client, timeout).await,
            SourceKind::ServiceAccount(s) => s.fetch_token(client, timeout).await,
        }
    }
}

pub fn build_source(descriptor: &CredentialDescriptor, options: &SourceOptions) -> Result<SourceKind> {
    let source = match descriptor.credential_type()? {
        CredentialType::AuthorizedUser => SourceKind::AuthorizedUser(AuthorizedUserSource::new(descriptor)?),
        CredentialType::GceMetadata => SourceKind::Metadata(MetadataSource::new(options.metadata_endpoint.clone())),
        CredentialType::ServiceAccount => {
            SourceKind::ServiceAccount(ServiceAccountSource::new(descriptor, options)?)
        }
    };
    Ok(source)
}

/// Turn a token endpoint response into a [`Token`].
pub(crate) async fn parse_token_response(response: Response) -> Result<Token> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        debug!(%status, "token endpoint rejected the request");
        return Err(Error::Status { status: status.as_u16(), body });
    }
    Ok(serde_json::from_str(&body)?)
}
