//! Shared error payloads of Google Cloud REST APIs.
//!
//! See <https://google.aip.dev/193#http11json-representation>.

use serde::{Deserialize, Serialize};

/// Generic error message used in GCP.
///
/// <https://cloud.google.com/bigquery/docs/reference/rest/v2/ErrorProto>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: String,
    pub location: Option<String>,
    pub message: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: Option<u16>,
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
    /// google.rpc.Code name, e.g. `ALREADY_EXISTS`
    pub status: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: u16, message: &str, status: &str) -> Self {
        Self {
            code: Some(code),
            message: Some(message.to_owned()),
            errors: Vec::new(),
            status: Some(status.to_owned()),
        }
    }
}
