//! Notion REST client.

use std::future::Future;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::models::{DatabaseSchema, QueryPage, QueryRequest};
use crate::{Config, Error, Result};

/// Public Notion API endpoint.
pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";

/// Protocol version sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Operations the counter needs from Notion.
pub trait NotionApi {
    /// `POST /databases/{id}/query`
    fn query_database(
        &self,
        config: &Config,
        request: &QueryRequest,
    ) -> impl Future<Output = Result<QueryPage>> + Send;

    /// `GET /databases/{id}`
    fn retrieve_database(&self, config: &Config) -> impl Future<Output = Result<DatabaseSchema>> + Send;
}

/// Client for the Notion REST API.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    /// Create a new Notion client.
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: NOTION_API_BASE.to_string(),
        }
    }

    /// Point the client at another endpoint (e.g. a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn database_url(&self, database_id: &str) -> String {
        format!("{}/databases/{}", self.base_url, urlencoding::encode(database_id))
    }

    /// Send a request, turning non-success statuses into `Error::Remote` with
    /// the body left untouched.
    async fn send<T: DeserializeOwned>(&self, config: &Config, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&config.api_token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Notion API returned {}", status);
            return Err(Error::Remote {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl NotionApi for NotionClient {
    async fn query_database(&self, config: &Config, request: &QueryRequest) -> Result<QueryPage> {
        let url = format!("{}/query", self.database_url(&config.database_id));
        self.send(config, self.http_client.post(url).json(request)).await
    }

    async fn retrieve_database(&self, config: &Config) -> Result<DatabaseSchema> {
        let url = self.database_url(&config.database_id);
        self.send(config, self.http_client.get(url)).await
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted stand-in for the Notion API.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::models::Page;

    pub(crate) struct ScriptedNotion {
        pages: Mutex<VecDeque<Result<QueryPage>>>,
        requests: Mutex<Vec<QueryRequest>>,
        schema: Option<DatabaseSchema>,
        schema_calls: AtomicUsize,
    }

    impl ScriptedNotion {
        pub(crate) fn new(pages: Vec<Result<QueryPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                requests: Mutex::new(Vec::new()),
                schema: None,
                schema_calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_schema(mut self, properties: Value) -> Self {
            self.schema = serde_json::from_value(json!({ "properties": properties })).ok();
            self
        }

        pub(crate) fn requests(&self) -> Vec<QueryRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn cursors(&self) -> Vec<Option<String>> {
            self.requests().into_iter().map(|r| r.start_cursor).collect()
        }

        pub(crate) fn total_calls(&self) -> usize {
            self.requests.lock().unwrap().len() + self.schema_calls.load(Ordering::SeqCst)
        }
    }

    impl NotionApi for ScriptedNotion {
        async fn query_database(&self, _config: &Config, request: &QueryRequest) -> Result<QueryPage> {
            self.requests.lock().unwrap().push(request.clone());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Internal("no scripted page left".to_string())))
        }

        async fn retrieve_database(&self, _config: &Config) -> Result<DatabaseSchema> {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            self.schema
                .clone()
                .ok_or_else(|| Error::Remote {
                    status: 404,
                    body: r#"{"object":"error","code":"object_not_found"}"#.to_string(),
                })
        }
    }

    /// A record with a title, rich-text status and date-only end date.
    pub(crate) fn record(title: &str, status: &str, end_date: &str) -> Page {
        serde_json::from_value(json!({
            "id": format!("page-{}", title),
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": title }] },
                "Status": { "type": "rich_text", "rich_text": [{ "plain_text": status }] },
                "End Date": { "type": "date", "date": { "start": end_date, "end": null } }
            }
        }))
        .unwrap()
    }

    /// `count` finished records dated February 10th, 2026.
    pub(crate) fn finished_page(count: usize, next_cursor: Option<&str>) -> QueryPage {
        QueryPage {
            results: (0..count)
                .map(|i| record(&format!("Book {}", i), "📘", "2026-02-10"))
                .collect(),
            has_more: next_cursor.is_some(),
            next_cursor: next_cursor.map(String::from),
        }
    }

    pub(crate) fn config() -> Config {
        Config::from_lookup(|key| match key {
            "API_TOKEN" => Some("secret_test".to_string()),
            "DATABASE_ID" => Some("db-test".to_string()),
            _ => None,
        })
        .unwrap()
    }
}
