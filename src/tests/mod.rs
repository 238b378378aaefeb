pub mod common;

mod credential_discovery;
mod refresh_retry;
