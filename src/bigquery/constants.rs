use crate::utils::constants::GCP_GENERIC_SCOPE;

pub const BIGQUERY_API_ROOT: &str = "https://bigquery.googleapis.com";
pub const BIGQUERY_API_PATH: &str = "/bigquery/v2";

// Access scopes
pub const BIGQUERY_MANAGE_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";
pub const BIGQUERY_INSERT_DATA_SCOPE: &str = "https://www.googleapis.com/auth/bigquery.insertdata";
pub const BIGQUERY_SCOPES: [&str; 3] = [BIGQUERY_MANAGE_SCOPE, BIGQUERY_INSERT_DATA_SCOPE, GCP_GENERIC_SCOPE];

pub const INSERT_ALL_REQUEST_KIND: &str = "bigquery#tableDataInsertAllRequest";
pub const INSERT_ALL_RESPONSE_KIND: &str = "bigquery#tableDataInsertAllResponse";
