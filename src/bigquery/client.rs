use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::auth::TokenSource;
use crate::bigquery::constants::{BIGQUERY_API_PATH, BIGQUERY_API_ROOT, BIGQUERY_SCOPES, INSERT_ALL_REQUEST_KIND};
use crate::bigquery::schemas::{
    Dataset, DatasetListResponse, DatasetResponse, Table, TableInsertError, TableInsertResponse, TableResponse,
};
use crate::error::{Error, Result};
use crate::resilience::retry::RetrySettings;
use crate::rest::{RequestMethod, RestClient};

/// Optional parts of a [`BigQueryClient`].
#[derive(Debug, Clone)]
pub struct BigQueryOptions {
    /// API root without the version path; point it at an emulator in tests.
    pub api_root: String,
    /// Dataset used by table operations that do not name one.
    pub default_dataset: Option<String>,
    pub retry: Option<RetrySettings>,
}

impl Default for BigQueryOptions {
    fn default() -> Self {
        Self { api_root: BIGQUERY_API_ROOT.to_owned(), default_dataset: None, retry: None }
    }
}

/// Flags of a streaming insert.
#[derive(Debug, Clone)]
pub struct InsertAllOptions {
    pub skip_invalid: bool,
    pub ignore_unknown: bool,
    pub template_suffix: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for InsertAllOptions {
    fn default() -> Self {
        Self { skip_invalid: false, ignore_unknown: true, template_suffix: None, timeout: None }
    }
}

/// Basic BigQuery operations. `prettyPrint=false` keeps responses compact.
#[derive(Debug)]
pub struct BigQueryClient<S> {
    project: String,
    default_dataset: Option<String>,
    rest: RestClient<S>,
}

impl<S: TokenSource> BigQueryClient<S> {
    /// The session must carry at least one BigQuery scope.
    pub fn new(project: impl Into<String>, token_source: Arc<S>, http_client: Client, options: BigQueryOptions) -> Result<Self> {
        let scopes = token_source.scopes();
        if !BIGQUERY_SCOPES.iter().any(|scope| scopes.iter().any(|s| s == scope)) {
            return Err(Error::Config("Current token session doesn't contain any BigQuery scopes!".to_string()));
        }

        let api_root = format!("{}{}", options.api_root.trim_end_matches('/'), BIGQUERY_API_PATH);
        Ok(Self {
            project: project.into(),
            default_dataset: options.default_dataset,
            rest: RestClient::new(token_source, http_client, api_root, options.retry),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn default_dataset(&self) -> Option<&str> {
        self.default_dataset.as_deref()
    }

    fn datasets_url(&self) -> String {
        format!("{}/projects/{}/datasets", self.rest.api_root(), self.project)
    }

    fn dataset_or_default<'a>(&'a self, dataset_name: Option<&'a str>) -> Result<&'a str> {
        dataset_name.or(self.default_dataset.as_deref()).ok_or_else(|| {
            Error::InvalidArgument("Dataset name is required when default name is not provided".to_string())
        })
    }

    /// <https://cloud.google.com/bigquery/docs/reference/rest/v2/datasets/list>
    pub async fn list_datasets(&self, timeout: Option<Duration>) -> Result<DatasetListResponse> {
        let url = format!("{}?prettyPrint=false", self.datasets_url());
        self.rest.get_request(&url, timeout).await
    }

    /// <https://cloud.google.com/bigquery/docs/reference/rest/v2/datasets/get>
    pub async fn get_dataset(&self, dataset_name: &str, timeout: Option<Duration>) -> Result<DatasetResponse> {
        let url = format!("{}/{dataset_name}?prettyPrint=false", self.datasets_url());
        self.rest.get_request(&url, timeout).await
    }

    /// <https://cloud.google.com/bigquery/docs/reference/rest/v2/datasets/insert>
    pub async fn create_dataset(&self, dataset: &Dataset, timeout: Option<Duration>) -> Result<DatasetResponse> {
        let url = format!("{}?prettyPrint=false", self.datasets_url());
        let payload = serde_json::to_vec(dataset)?;
        self.rest.send_request(&url, &payload, timeout, RequestMethod::Post).await
    }

    /// Update the fields set on `dataset`, leaving the others untouched.
    ///
    /// <https://cloud.google.com/bigquery/docs/reference/rest/v2/datasets/patch>
    pub async fn patch_dataset(
        &self,
        dataset_name: &str,
        dataset: &Dataset,
        timeout: Option<Duration>,
    ) -> Result<DatasetResponse> {
        let url = format!("{}/{dataset_name}?prettyPrint=false", self.datasets_url());
        let payload = serde_json::to_vec(dataset)?;
        self.rest.send_request(&url, &payload, timeout, RequestMethod::Patch).await
    }

    /// <https://cloud.google.com/bigquery/docs/reference/rest/v2/tables/get>
    pub async fn get_table(
        &self,
        table_name: &str,
        dataset_name: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<TableResponse> {
        let dataset_name = self.dataset_or_default(dataset_name)?;
        let url = format!("{}/{dataset_name}/tables/{table_name}?prettyPrint=false", self.datasets_url());
        self.rest.get_request(&url, timeout).await
    }

    /// <https://cloud.google.com/bigquery/docs/reference/rest/v2/tables/insert>
    pub async fn create_table(
        &self,
        table: &Table,
        dataset_name: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<TableResponse> {
        let dataset_name = self.dataset_or_default(dataset_name)?;
        let url = format!("{}/{dataset_name}/tables?prettyPrint=false", self.datasets_url());
        let payload = serde_json::to_vec(table)?;
        self.rest.send_request(&url, &payload, timeout, RequestMethod::Post).await
    }

    /// Stream rows into a table.
    ///
    /// Rows rejected by BigQuery come back as insert errors, the call itself
    /// still succeeds. Each row gets a random insert id unless `insert_id_fn`
    /// derives one from the row.
    ///
    /// <https://cloud.google.com/bigquery/docs/reference/rest/v2/tabledata/insertAll>
    pub async fn insert_all<T: Serialize + Sync>(
        &self,
        rows: &[T],
        table_name: &str,
        dataset_name: Option<&str>,
        options: &InsertAllOptions,
        insert_id_fn: Option<&(dyn Fn(&T) -> String + Sync)>,
    ) -> Result<Vec<TableInsertError>> {
        let dataset_name = self.dataset_or_default(dataset_name)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/{dataset_name}/tables/{table_name}/insertAll?prettyPrint=false",
            self.datasets_url()
        );
        let default_id = unique_insert_id::<T>;
        let payload = make_table_insert_body(rows, options, insert_id_fn.unwrap_or(&default_id))?;
        debug!(table = table_name, dataset = dataset_name, rows = rows.len(), "streaming rows into BigQuery");

        let result: TableInsertResponse =
            self.rest.send_request(&url, &payload, options.timeout, RequestMethod::Post).await?;
        Ok(result.insert_errors)
    }
}

/// Same id format as Google's own BigQuery clients.
fn unique_insert_id<T>(_: &T) -> String {
    Uuid::new_v4().to_string()
}

fn make_table_insert_body<T: Serialize>(
    rows: &[T],
    options: &InsertAllOptions,
    insert_id_fn: &dyn Fn(&T) -> String,
) -> Result<Vec<u8>> {
    let rows = rows
        .iter()
        .map(|row| -> Result<Value> { Ok(json!({ "insertId": insert_id_fn(row), "json": serde_json::to_value(row)? })) })
        .collect::<Result<Vec<Value>>>()?;

    let mut body = Map::new();
    body.insert("kind".into(), json!(INSERT_ALL_REQUEST_KIND));
    body.insert("skipInvalidRows".into(), json!(options.skip_invalid));
    body.insert("ignoreUnknownValues".into(), json!(options.ignore_unknown));
    body.insert("rows".into(), Value::Array(rows));
    if let Some(suffix) = &options.template_suffix {
        body.insert("templateSuffix".into(), json!(suffix));
    }

    Ok(serde_json::to_vec(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: u32,
        name: &'static str,
    }

    #[test]
    fn insert_body_shape() {
        let rows = [Row { id: 1, name: "a" }, Row { id: 2, name: "b" }];
        let options = InsertAllOptions { template_suffix: Some("_2024".into()), ..Default::default() };
        let id_fn = |row: &Row| format!("row-{}", row.id);

        let body = make_table_insert_body(&rows, &options, &id_fn).unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            json!({
                "kind": "bigquery#tableDataInsertAllRequest",
                "skipInvalidRows": false,
                "ignoreUnknownValues": true,
                "rows": [
                    {"insertId": "row-1", "json": {"id": 1, "name": "a"}},
                    {"insertId": "row-2", "json": {"id": 2, "name": "b"}}
                ],
                "templateSuffix": "_2024"
            })
        );
    }

    #[test]
    fn default_insert_ids_are_unique() {
        let rows = [Row { id: 1, name: "a" }, Row { id: 1, name: "a" }];
        let body = make_table_insert_body(&rows, &InsertAllOptions::default(), &unique_insert_id::<Row>).unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        let first = body["rows"][0]["insertId"].as_str().unwrap();
        let second = body["rows"][1]["insertId"].as_str().unwrap();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(first).is_ok());
        assert!(body.get("templateSuffix").is_none());
    }
}
