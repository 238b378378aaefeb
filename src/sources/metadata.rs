use std::time::Duration;

use reqwest::Client;

use crate::cache::token::Token;
use crate::error::Result;
use crate::sources::parse_token_response;
use crate::utils::constants::{GCE_METADATA_FLAVOR, GCE_METADATA_FLAVOR_HEADER};

/// Ambient identity from the compute metadata server. Sends no credentials.
#[derive(Debug, Clone)]
pub struct MetadataSource {
    pub endpoint: String,
}

impl MetadataSource {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    pub async fn fetch_token(&self, client: &Client, timeout: Duration) -> Result<Token> {
        let response = client
            .get(&self.endpoint)
            .header(GCE_METADATA_FLAVOR_HEADER, GCE_METADATA_FLAVOR)
            .timeout(timeout)
            .send()
            .await?;
        parse_token_response(response).await
    }
}
