use chrono::{DateTime, Utc};

use crate::cache::token::Token;

/// Most recent token with its issuance time and validity window.
///
/// The three fields only ever change together, through [`TokenState::replace`].
#[derive(Debug, Clone)]
pub struct TokenState {
    access_token: String,
    acquired_at: DateTime<Utc>,
    duration_secs: i64,
}

impl Default for TokenState {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            acquired_at: DateTime::<Utc>::UNIX_EPOCH,
            duration_secs: 0,
        }
    }
}

impl TokenState {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn duration_secs(&self) -> i64 {
        self.duration_secs
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    /// Check if the token can still be handed out at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, leeway_secs: i64) -> bool {
        if self.is_empty() {
            return false;
        }
        let window_ms = self.duration_secs.saturating_sub(leeway_secs).saturating_mul(1000);
        (now - self.acquired_at).num_milliseconds() <= window_ms
    }

    pub fn replace(&mut self, token: Token, acquired_at: DateTime<Utc>) {
        self.access_token = token.access_token;
        self.duration_secs = token.expires_in;
        self.acquired_at = acquired_at;
    }
}
