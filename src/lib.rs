//! # GCloud REST Library
//!
//! Acquires OAuth 2.0 access tokens for Google Cloud APIs and keeps them fresh,
//! then uses them to talk to Google Cloud REST services.
//!
//! Modules:
//! - `credentials` — locating and classifying the credentials descriptor
//! - `auth` — token sessions shared by concurrent callers
//! - `sources` — metadata server, authorized user and service account token protocols
//! - `cache` — the cached token and its freshness rule
//! - `rest` — authorized JSON requests and Google error mapping
//! - `bigquery` — datasets, tables and streaming inserts

pub mod auth;
pub mod bigquery;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod rest;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::auth::{AnonymousToken, GcpToken, GcpTokenBuilder, TokenSource};
pub use crate::credentials::{CredentialSource, CredentialType, Environment};
pub use crate::error::{Error, Result};
