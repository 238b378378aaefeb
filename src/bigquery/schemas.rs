//! BigQuery REST resources, camelCase on the wire.
//!
//! int64 values such as `creationTime` are encoded as JSON strings by the API.

use serde::{Deserialize, Deserializer, Serialize};

use crate::bigquery::constants::INSERT_ALL_RESPONSE_KIND;
use crate::rest::errors::ErrorProto;

/// Accepts an int64 encoded either as a JSON number or as a string.
fn int64_from_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(i64),
        Text(String),
    }

    match Option::<Int64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Int64::Number(n)) => Ok(Some(n)),
        Some(Int64::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInsertError {
    pub index: i64,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

/// <https://cloud.google.com/bigquery/docs/reference/rest/v2/TableReference>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableFieldType {
    String,
    Bytes,
    Integer,
    Int64,
    Float,
    Float64,
    Boolean,
    Timestamp,
    Date,
    Time,
    Datetime,
    Geography,
    Numeric,
    Bignumeric,
    Json,
    Range,
    // nested fields
    Record,
    Struct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableFieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

fn nullable_mode<'de, D>(deserializer: D) -> Result<TableFieldMode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TableFieldMode>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimePartitioningType {
    Day,
    Hour,
    Month,
    Year,
}

/// <https://cloud.google.com/bigquery/docs/reference/rest/v2/tables#TableFieldSchema>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: TableFieldType,
    #[serde(default, deserialize_with = "nullable_mode")]
    pub mode: TableFieldMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TableFieldSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TableFieldSchema {
    pub fn new(name: impl Into<String>, field_type: TableFieldType) -> Self {
        Self { name: name.into(), field_type, mode: TableFieldMode::Nullable, fields: None, description: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<TableFieldSchema>,
}

/// <https://cloud.google.com/bigquery/docs/reference/rest/v2/tables#TimePartitioning>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableTimePartitioning {
    #[serde(rename = "type")]
    pub partitioning_type: TimePartitioningType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_ms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInsertResponse {
    #[serde(default = "insert_response_kind")]
    pub kind: String,
    #[serde(default)]
    pub insert_errors: Vec<TableInsertError>,
}

fn insert_response_kind() -> String {
    INSERT_ALL_RESPONSE_KIND.to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_reference: TableReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "schema", skip_serializing_if = "Option::is_none")]
    pub table_schema: Option<TableSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_partitioning: Option<TableTimePartitioning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableResponse {
    #[serde(flatten)]
    pub table: Table,
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// <https://cloud.google.com/bigquery/docs/reference/rest/v2/datasets#Dataset>
///
/// Only the reference is required to create a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub dataset_reference: DatasetReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// GCP region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Dataset {
    pub fn new(project_id: Option<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_reference: DatasetReference { dataset_id: dataset_id.into(), project_id },
            friendly_name: None,
            description: None,
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetResponse {
    #[serde(flatten)]
    pub dataset: Dataset,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub self_link: Option<String>,
    /// Unix timestamp, milliseconds
    #[serde(default, deserialize_with = "int64_from_string")]
    pub creation_time: Option<i64>,
    #[serde(default, deserialize_with = "int64_from_string")]
    pub last_modified_time: Option<i64>,
}

impl DatasetResponse {
    pub fn to_dataset(&self) -> Dataset {
        self.dataset.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetListResponse {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub datasets: Vec<DatasetResponse>,
}
