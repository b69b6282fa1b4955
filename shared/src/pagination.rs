//! Cursor pagination over a Notion database query.

use serde_json::Value;
use tracing::{debug, info};

use crate::filter::FinishedFilter;
use crate::models::{MatchRecord, Page, QueryRequest};
use crate::notion::NotionApi;
use crate::window::MonthWindow;
use crate::{Config, Error, Result};

/// Outcome of counting finished records across every page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    /// Records accepted by the filter
    pub count: usize,
    /// Records returned by Notion before local checks
    pub candidates: usize,
    /// Query requests issued
    pub pages: usize,
    /// First accepted records, up to the requested limit
    pub sample: Vec<MatchRecord>,
}

/// Request every page of `filter`, handing each batch of results to `visit`.
///
/// Pages are fetched one after another since each cursor comes from the
/// previous response. The first failing page aborts the walk. Returns the
/// number of requests made.
pub async fn walk_pages<C, F>(
    client: &C,
    config: &Config,
    filter: &Value,
    page_size: u32,
    mut visit: F,
) -> Result<usize>
where
    C: NotionApi,
    F: FnMut(&[Page]),
{
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        let request = QueryRequest {
            page_size,
            filter: filter.clone(),
            start_cursor: cursor.take(),
        };

        let page = client.query_database(config, &request).await?;
        pages += 1;
        debug!(
            "Fetched page {} with {} results (has_more={})",
            pages,
            page.results.len(),
            page.has_more
        );

        visit(&page.results);

        if !page.has_more {
            return Ok(pages);
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => {
                return Err(Error::Internal(
                    "Notion reported more results without a next_cursor".to_string(),
                ))
            }
        }
    }
}

/// Count the records `filter` accepts within `window`.
///
/// A `sample_limit` of zero collects no sample; the count is the same either
/// way.
pub async fn count_finished<C: NotionApi>(
    client: &C,
    config: &Config,
    filter: &FinishedFilter,
    window: &MonthWindow,
    sample_limit: usize,
) -> Result<Tally> {
    let predicate = filter.remote_predicate(window);
    let mut tally = Tally::default();

    let pages = walk_pages(client, config, &predicate, config.page_size, |results| {
        for page in results {
            tally.candidates += 1;
            if !filter.accepts(page, window) {
                continue;
            }

            tally.count += 1;
            if tally.sample.len() < sample_limit {
                tally.sample.push(page.to_match_record(
                    &config.title_property,
                    &filter.status_property,
                    &filter.end_date_property,
                ));
            }
        }
    })
    .await?;
    tally.pages = pages;

    info!(
        "Counted {} finished records for {} ({} candidates, {} pages)",
        tally.count,
        window.label(),
        tally.candidates,
        tally.pages
    );

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DateCheck;
    use crate::models::QueryPage;
    use crate::notion::fake::{config, finished_page, record, ScriptedNotion};
    use crate::window::TzOffset;

    fn february() -> MonthWindow {
        MonthWindow::for_month(2026, 2, TzOffset::from_minutes(-480).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_three_pages_follow_cursors() {
        let client = ScriptedNotion::new(vec![
            Ok(finished_page(100, Some("cursor-1"))),
            Ok(finished_page(100, Some("cursor-2"))),
            Ok(finished_page(37, None)),
        ]);
        let config = config();
        let filter = FinishedFilter::from_config(&config);

        let tally = count_finished(&client, &config, &filter, &february(), 0).await.unwrap();

        assert_eq!(tally.count, 237);
        assert_eq!(tally.pages, 3);
        assert!(tally.sample.is_empty());
        assert_eq!(
            client.cursors(),
            vec![None, Some("cursor-1".to_string()), Some("cursor-2".to_string())]
        );

        let requests = client.requests();
        assert!(requests.iter().all(|r| r.page_size == 100));
        assert!(requests.iter().all(|r| r.filter == requests[0].filter));
    }

    #[tokio::test]
    async fn test_failed_page_stops_walk() {
        let client = ScriptedNotion::new(vec![
            Ok(finished_page(100, Some("cursor-1"))),
            Err(Error::Remote {
                status: 400,
                body: r#"{"object":"error","code":"validation_error"}"#.to_string(),
            }),
            Ok(finished_page(5, None)),
        ]);
        let config = config();
        let filter = FinishedFilter::from_config(&config);

        let err = count_finished(&client, &config, &filter, &february(), 0).await.unwrap_err();

        match err {
            Error::Remote { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("validation_error"));
            }
            other => panic!("expected remote error, got {:?}", other),
        }
        assert_eq!(client.cursors().len(), 2);
    }

    #[tokio::test]
    async fn test_has_more_without_cursor_is_an_error() {
        let broken = QueryPage {
            results: Vec::new(),
            has_more: true,
            next_cursor: None,
        };
        let client = ScriptedNotion::new(vec![Ok(broken)]);
        let config = config();

        let result = walk_pages(&client, &config, &Value::Null, 100, |_| {}).await;

        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(client.cursors().len(), 1);
    }

    #[tokio::test]
    async fn test_sample_is_capped_and_count_unchanged() {
        let pages = || {
            vec![
                Ok(finished_page(100, Some("cursor-1"))),
                Ok(finished_page(20, None)),
            ]
        };
        let config = config();
        let filter = FinishedFilter::from_config(&config);

        let plain = count_finished(&ScriptedNotion::new(pages()), &config, &filter, &february(), 0)
            .await
            .unwrap();
        let sampled = count_finished(&ScriptedNotion::new(pages()), &config, &filter, &february(), 10)
            .await
            .unwrap();

        assert_eq!(plain.count, 120);
        assert_eq!(sampled.count, 120);
        assert_eq!(sampled.sample.len(), 10);
        assert_eq!(
            sampled.sample[0],
            MatchRecord {
                title: Some("Book 0".to_string()),
                status: Some("📘".to_string()),
                end_date: Some("2026-02-10".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_local_verification_drops_boundary_candidates() {
        let page = QueryPage {
            results: vec![
                record("Inside", "📘", "2026-02-28"),
                record("Arc", "📘✨ ARC — Due Dec 15", "2026-02-01"),
                record("Next month", "📘", "2026-03-01"),
                record("Last month", "📘", "2026-01-31"),
                record("Abandoned", "📘 abandoned", "2026-02-14"),
            ],
            has_more: false,
            next_cursor: None,
        };
        let client = ScriptedNotion::new(vec![Ok(page)]);
        let mut config = config();
        config.date_check = DateCheck::LocalVerified;
        let filter = FinishedFilter::from_config(&config);

        let tally = count_finished(&client, &config, &filter, &february(), 10).await.unwrap();

        assert_eq!(tally.candidates, 5);
        assert_eq!(tally.count, 2);
        let titles: Vec<_> = tally.sample.iter().filter_map(|m| m.title.clone()).collect();
        assert_eq!(titles, vec!["Inside", "Arc"]);
    }
}
