//! # BigQuery
//!
//! Dataset and table management plus streaming inserts over the REST API.

pub mod client;
pub mod constants;
pub mod schemas;

pub use client::{BigQueryClient, BigQueryOptions, InsertAllOptions};
pub use constants::BIGQUERY_SCOPES;
