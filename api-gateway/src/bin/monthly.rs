//! Monthly Lambda - Handles GET /api/monthly.
//!
//! Counts finished records in the configured Notion database for one local
//! calendar month.
//!
//! Query parameters:
//! - `year`, `month` - month to count (defaults to the current local month)
//! - `tz` - offset override in minutes
//! - `debug` - `1` for diagnostics, `schema` to also list database properties

use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use shared::{Config, MonthlyParams, NotionClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    notion: NotionClient,
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let query = event.query_string_parameters();
    let params = MonthlyParams::from_lookup(|key| query.first(key).map(String::from));

    info!(
        "Received request: method={}, path={}",
        event.method(),
        event.uri().path()
    );

    let config = Config::from_env();

    shared::respond(&state.notion, config, &params, chrono::Utc::now()).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState {
        notion: NotionClient::new(reqwest::Client::new()),
    });

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
