//! Configuration management for the monthly counter Lambda.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::filter::{DateCheck, StatusMatch};
use crate::window::{TzOffset, DEFAULT_OFFSET_MINUTES};
use crate::{Error, Result};

/// Message returned when credentials are missing.
pub const MISSING_CREDENTIALS: &str = "Missing Notion env vars";

/// Notion caps query pages at 100 records.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Per-invocation configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Notion integration token
    pub api_token: String,
    /// Database to count records in
    pub database_id: String,
    /// Offset of the local calendar from UTC
    pub timezone_offset: TzOffset,
    /// Date property holding the finish date
    pub end_date_property: String,
    /// Rich-text property holding the status marker
    pub status_property: String,
    /// Preferred title property for debug samples
    pub title_property: String,
    /// Marker of a finished record
    pub finished_marker: String,
    /// Prefix of a finished advance review copy
    pub arc_marker: Option<String>,
    /// Comparison applied to the finished marker
    pub status_match: StatusMatch,
    /// Where the end-date bound is enforced
    pub date_check: DateCheck,
    /// Records requested per query page
    pub page_size: u32,
    /// Normal-mode freshness; zero disables caching
    pub cache_max_age_secs: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_token = get("API_TOKEN").or_else(|| get("NOTION_TOKEN"));
        let database_id = get("DATABASE_ID").or_else(|| get("NOTION_DATABASE_ID"));
        let (Some(api_token), Some(database_id)) = (api_token, database_id) else {
            return Err(Error::Config(MISSING_CREDENTIALS.to_string()));
        };

        let offset_minutes = parse_or(get("TZ_OFFSET_MINUTES"), "TZ_OFFSET_MINUTES", DEFAULT_OFFSET_MINUTES);
        let timezone_offset = TzOffset::from_minutes(offset_minutes).unwrap_or_else(|| {
            warn!("TZ_OFFSET_MINUTES {} is out of range, using {}", offset_minutes, DEFAULT_OFFSET_MINUTES);
            TzOffset::default()
        });

        let page_size = parse_or(get("PAGE_SIZE"), "PAGE_SIZE", MAX_PAGE_SIZE);
        let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size
        } else {
            warn!("PAGE_SIZE {} is out of range, using {}", page_size, MAX_PAGE_SIZE);
            MAX_PAGE_SIZE
        };

        Ok(Self {
            api_token,
            database_id,
            timezone_offset,
            end_date_property: get("END_DATE_PROPERTY_NAME").unwrap_or_else(|| "End Date".to_string()),
            status_property: get("STATUS_PROPERTY_NAME").unwrap_or_else(|| "Status".to_string()),
            title_property: get("TITLE_PROPERTY_NAME").unwrap_or_else(|| "Name".to_string()),
            finished_marker: get("FINISHED_MARKER").unwrap_or_else(|| "📘".to_string()),
            // Explicitly empty disables the ARC rule
            arc_marker: match lookup("ARC_MARKER").map(|value| value.trim().to_string()) {
                Some(value) if value.is_empty() => None,
                Some(value) => Some(value),
                None => Some("📘✨ ARC".to_string()),
            },
            status_match: parse_or(get("STATUS_MATCH"), "STATUS_MATCH", StatusMatch::Equals),
            date_check: parse_or(get("DATE_CHECK"), "DATE_CHECK", DateCheck::RemoteOnly),
            page_size,
            cache_max_age_secs: parse_or(get("CACHE_MAX_AGE_SECONDS"), "CACHE_MAX_AGE_SECONDS", 60),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {} value '{}'", key, raw);
            default
        }),
        None => default,
    }
}
