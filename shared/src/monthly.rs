//! Monthly finished-record count: request parsing, orchestration and
//! response shaping.

use chrono::{DateTime, SecondsFormat, Utc};
use lambda_http::{Body, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::filter::FinishedFilter;
use crate::http::{cache_control, error_response, json_response, raw_json_response, NO_STORE};
use crate::models::MatchRecord;
use crate::notion::NotionApi;
use crate::pagination::{count_finished, Tally};
use crate::window::{MonthWindow, TzOffset};
use crate::{Config, Error, Result};

/// Matches reported in a debug response.
pub const SAMPLE_LIMIT: usize = 10;

/// Amount of diagnostics requested with `?debug=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebugLevel {
    #[default]
    Off,
    /// `debug=1`
    On,
    /// `debug=schema`, also lists the database properties
    Schema,
}

impl DebugLevel {
    pub fn is_on(self) -> bool {
        self != DebugLevel::Off
    }
}

/// Query string parameters of the monthly endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub tz_offset: Option<TzOffset>,
    pub debug: DebugLevel,
}

impl MonthlyParams {
    /// Parse parameters through `lookup`. Unparseable values are dropped;
    /// range checks on `year`/`month` happen when the window is resolved.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|value| value.trim().to_string());

        let tz_offset = get("tz").and_then(|raw| {
            let offset = raw.parse().ok().and_then(TzOffset::from_minutes);
            if offset.is_none() {
                warn!("Ignoring tz parameter '{}'", raw);
            }
            offset
        });

        let debug = match get("debug").as_deref() {
            Some("1") | Some("true") => DebugLevel::On,
            Some("schema") => DebugLevel::Schema,
            _ => DebugLevel::Off,
        };

        Self {
            year: get("year").and_then(|raw| raw.parse().ok()),
            month: get("month").and_then(|raw| raw.parse().ok()),
            tz_offset,
            debug,
        }
    }
}

/// Normal response.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
    pub month: String,
    pub range: DayRange,
}

/// Local first day of the month and of the following month.
#[derive(Debug, Serialize)]
pub struct DayRange {
    pub start: String,
    pub next: String,
}

impl DayRange {
    fn of(window: &MonthWindow) -> Self {
        Self {
            start: window.first_day().to_string(),
            next: window.next_first_day().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Range {
    pub start: String,
    pub end: String,
}

/// Debug response.
#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub count: usize,
    pub month: String,
    pub range: DayRange,
    /// UTC instants of the window
    pub instants: Range,
    pub tz_offset_minutes: i32,
    pub filter: Value,
    pub pages: usize,
    pub candidates: usize,
    pub matches: Vec<MatchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// Why the schema lookup failed; the count is still reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties_error: Option<String>,
}

/// Everything computed for one request.
#[derive(Debug)]
pub struct MonthlyReport {
    pub window: MonthWindow,
    pub tally: Tally,
    pub filter: Value,
    pub properties: Option<Map<String, Value>>,
    pub properties_error: Option<String>,
    pub debug: DebugLevel,
}

/// Count finished records for the requested month.
pub async fn monthly_count<C: NotionApi>(
    client: &C,
    config: &Config,
    params: &MonthlyParams,
    now: DateTime<Utc>,
) -> Result<MonthlyReport> {
    let offset = params.tz_offset.unwrap_or(config.timezone_offset);
    let window = MonthWindow::resolve(now, offset, params.year, params.month)?;
    let filter = FinishedFilter::from_config(config);

    info!(
        "Counting {} in database {} (offset {} min, date check {})",
        window.label(),
        config.database_id,
        offset.minutes(),
        filter.date_check
    );

    let sample_limit = if params.debug.is_on() { SAMPLE_LIMIT } else { 0 };
    let tally = count_finished(client, config, &filter, &window, sample_limit).await?;

    let (properties, properties_error) = if params.debug == DebugLevel::Schema {
        match client.retrieve_database(config).await {
            Ok(schema) => (Some(schema.property_types()), None),
            Err(e) => {
                warn!("Schema lookup failed: {}", e);
                (None, Some(e.to_string()))
            }
        }
    } else {
        (None, None)
    };

    Ok(MonthlyReport {
        filter: filter.describe(&window),
        window,
        tally,
        properties,
        properties_error,
        debug: params.debug,
    })
}

/// Build the HTTP response for a computed report.
pub fn shape_response(report: MonthlyReport, config: &Config) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let month = report.window.label();

    if !report.debug.is_on() {
        return json_response(
            200,
            &cache_control(config.cache_max_age_secs),
            &CountResponse {
                count: report.tally.count,
                month,
                range: DayRange::of(&report.window),
            },
        );
    }

    let window = report.window;
    let body = DebugResponse {
        count: report.tally.count,
        month,
        range: DayRange::of(&window),
        instants: Range {
            start: window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end: window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
        tz_offset_minutes: window.offset.minutes(),
        filter: report.filter,
        pages: report.tally.pages,
        candidates: report.tally.candidates,
        matches: report.tally.sample,
        properties: report.properties,
        properties_error: report.properties_error,
    };

    json_response(200, NO_STORE, &body)
}

/// Answer one request. `config` is the per-invocation configuration, or the
/// error loading it produced; in that case no Notion call is made.
pub async fn respond<C: NotionApi>(
    client: &C,
    config: Result<Config>,
    params: &MonthlyParams,
    now: DateTime<Utc>,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let config = match config {
        Ok(config) => config,
        Err(e) => return failure_response(e),
    };

    match monthly_count(client, &config, params, now).await {
        Ok(report) => shape_response(report, &config),
        Err(e) => failure_response(e),
    }
}

fn failure_response(err: Error) -> std::result::Result<Response<Body>, lambda_http::Error> {
    match err {
        Error::Config(message) => {
            error!("{}", message);
            error_response(500, message)
        }
        Error::Remote { status, body } => {
            warn!("Forwarding Notion error {}", status);
            raw_json_response(status, NO_STORE, body)
        }
        other => {
            error!("Monthly count failed: {}", other);
            error_response(other.status_code(), other.to_string())
        }
    }
}
