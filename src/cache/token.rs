use serde::Deserialize;

/// Access token as returned by every token endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    /// Lifetime in seconds from issuance
    pub expires_in: i64,
}

impl Token {
    pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self { access_token: access_token.into(), expires_in }
    }
}
