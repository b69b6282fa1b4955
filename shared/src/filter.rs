//! Finished-record predicate, both as a Notion query filter and as a local
//! per-record check.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, Utc};
use serde_json::{json, Value};

use crate::models::Page;
use crate::window::{MonthWindow, TzOffset};
use crate::Config;

/// How a status text is compared with a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMatch {
    Equals,
    StartsWith,
    Contains,
}

impl StatusMatch {
    /// Notion `rich_text` filter operator.
    pub fn operator(self) -> &'static str {
        match self {
            StatusMatch::Equals => "equals",
            StatusMatch::StartsWith => "starts_with",
            StatusMatch::Contains => "contains",
        }
    }

    pub fn matches(self, text: &str, marker: &str) -> bool {
        match self {
            StatusMatch::Equals => text == marker,
            StatusMatch::StartsWith => text.starts_with(marker),
            StatusMatch::Contains => text.contains(marker),
        }
    }
}

impl FromStr for StatusMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" => Ok(StatusMatch::Equals),
            "starts_with" | "prefix" => Ok(StatusMatch::StartsWith),
            "contains" => Ok(StatusMatch::Contains),
            other => Err(format!("unknown status match '{}'", other)),
        }
    }
}

/// Where the end-date bound is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCheck {
    /// Notion applies the exact window bounds.
    RemoteOnly,
    /// Notion returns a slightly wider candidate set and each record's own
    /// date value is compared against the window here.
    LocalVerified,
}

impl fmt::Display for DateCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateCheck::RemoteOnly => write!(f, "remote"),
            DateCheck::LocalVerified => write!(f, "local"),
        }
    }
}

impl FromStr for DateCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(DateCheck::RemoteOnly),
            "local" => Ok(DateCheck::LocalVerified),
            other => Err(format!("unknown date check '{}'", other)),
        }
    }
}

/// One accepted status shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRule {
    pub kind: StatusMatch,
    pub marker: String,
}

impl StatusRule {
    pub fn new(kind: StatusMatch, marker: impl Into<String>) -> Self {
        Self {
            kind,
            marker: marker.into(),
        }
    }

    fn remote_clause(&self, property: &str) -> Value {
        json!({
            "property": property,
            "rich_text": { self.kind.operator(): self.marker }
        })
    }
}

/// Status rules (any may match) combined with the end-date window.
#[derive(Debug, Clone)]
pub struct FinishedFilter {
    pub status_property: String,
    pub end_date_property: String,
    pub rules: Vec<StatusRule>,
    pub date_check: DateCheck,
}

impl FinishedFilter {
    /// The finished marker under the configured match, plus the ARC marker by
    /// prefix when one is configured.
    pub fn from_config(config: &Config) -> Self {
        let mut rules = vec![StatusRule::new(config.status_match, config.finished_marker.as_str())];
        if let Some(arc) = &config.arc_marker {
            rules.push(StatusRule::new(StatusMatch::StartsWith, arc.as_str()));
        }

        Self {
            status_property: config.status_property.clone(),
            end_date_property: config.end_date_property.clone(),
            rules,
            date_check: config.date_check,
        }
    }

    pub fn status_matches(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.kind.matches(text, &rule.marker))
    }

    /// Filter body sent to Notion.
    pub fn remote_predicate(&self, window: &MonthWindow) -> Value {
        let status = match self.rules.as_slice() {
            [rule] => rule.remote_clause(&self.status_property),
            rules => json!({
                "or": rules
                    .iter()
                    .map(|rule| rule.remote_clause(&self.status_property))
                    .collect::<Vec<_>>()
            }),
        };

        let (on_or_after, before) = match self.date_check {
            DateCheck::RemoteOnly => (
                window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
                window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            // Offsets stay under a day, so one extra day each side keeps every
            // boundary record in the candidate set.
            DateCheck::LocalVerified => (
                (window.first_day() - TimeDelta::days(1)).format("%Y-%m-%d").to_string(),
                (window.next_first_day() + TimeDelta::days(1)).format("%Y-%m-%d").to_string(),
            ),
        };

        json!({
            "and": [
                status,
                { "property": self.end_date_property, "date": { "on_or_after": on_or_after } },
                { "property": self.end_date_property, "date": { "before": before } }
            ]
        })
    }

    /// Local acceptance of a record the remote filter returned.
    pub fn accepts(&self, page: &Page, window: &MonthWindow) -> bool {
        match self.date_check {
            DateCheck::RemoteOnly => true,
            DateCheck::LocalVerified => {
                let status_ok = page
                    .text(&self.status_property)
                    .is_some_and(|text| self.status_matches(&text));

                status_ok
                    && page
                        .date_start(&self.end_date_property)
                        .and_then(|raw| record_instant(raw, window.offset))
                        .is_some_and(|instant| window.contains(instant))
            }
        }
    }

    /// Human-readable summary for debug responses.
    pub fn describe(&self, window: &MonthWindow) -> Value {
        json!({
            "status_property": self.status_property,
            "status": self
                .rules
                .iter()
                .map(|rule| json!({ "match": rule.kind.operator(), "marker": rule.marker }))
                .collect::<Vec<_>>(),
            "end_date_property": self.end_date_property,
            "date_check": self.date_check.to_string(),
            "predicate": self.remote_predicate(window),
        })
    }
}

/// Instant of a Notion date value.
///
/// Timestamps carrying an offset are taken as-is. Date-only values and
/// timestamps without an offset are local wall-clock time under `offset`.
pub fn record_instant(raw: &str, offset: TzOffset) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(offset.to_utc(date.and_time(NaiveTime::MIN)));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|local| offset.to_utc(local))
}
