//! Exhaustive retrieval above the hard cap
//!
//! Results larger than the service cap are fetched in windows over
//! `mdf.scroll_id`. A window whose own match count exceeds what came back
//! is shrunk and retried; accepted windows advance the scroll position.
//!
//! Shrinking multiplies before dividing, `width * returned / window_total`,
//! because `returned / window_total` in integers is zero for every
//! overflowing window. A result of one or less falls back to halving the
//! width. The shrunk width is kept for the windows that follow instead of
//! being reset to the configured window size.
//!
//! Scroll ids are dense only within one dataset. A query spanning several
//! datasets gets overlapping ids in every window, so the window loop can
//! over- or under-collect for it. Use [`Aggregator::aggregate_source`] or an
//! equivalent single-dataset query.

use serde_json::Value;

use super::errors::{SearchError, SearchResult};
use super::executor::{SearchExecutor, SearchOptions};
use super::transport::SearchTransport;
use crate::observability::Logger;
use crate::query::{clean_query, QueryBuilder, SCROLL_ID_FIELD, SOURCE_NAME_FIELD};

pub struct Aggregator<'a, T: SearchTransport> {
    executor: &'a SearchExecutor<T>,
    window_size: usize,
}

impl<'a, T: SearchTransport> Aggregator<'a, T> {
    /// Uses the configured window size, capped at the hard cap.
    pub fn new(executor: &'a SearchExecutor<T>) -> Self {
        let window_size = executor.config().window_size;
        Self::with_window_size(executor, window_size)
    }

    pub fn with_window_size(executor: &'a SearchExecutor<T>, window_size: usize) -> Self {
        Self {
            window_size: window_size.clamp(1, executor.hard_cap().max(1)),
            executor,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Every record of one dataset.
    pub fn aggregate_source(&self, source_name: &str, index: Option<&str>) -> SearchResult<Vec<Value>> {
        let mut query = QueryBuilder::new();
        query.match_field(SOURCE_NAME_FIELD, source_name, true, false);
        self.aggregate(&query.clean_query(), index)
    }

    /// Every document matching an advanced query.
    pub fn aggregate(&self, query: &str, index: Option<&str>) -> SearchResult<Vec<Value>> {
        let q = clean_query(query);
        if q.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let total = self.count(&q, index)?;
        if total <= self.executor.hard_cap() {
            let options = self.options(index).limit(total);
            return self.executor.search(&q, &options);
        }

        let mut results: Vec<Value> = Vec::with_capacity(total);
        let mut scroll_pos: u64 = 0;
        let mut scroll_width = self.window_size;

        while results.len() < total {
            let window = self.fetch_window(&q, index, scroll_pos, &mut scroll_width)?;

            if window.is_empty() {
                let tail = format!("({}) AND ({}:>={})", q, SCROLL_ID_FIELD, scroll_pos);
                if self.count(&tail, index)? == 0 {
                    let collected = results.len().to_string();
                    let total_str = total.to_string();
                    Logger::warn(
                        "AGGREGATE_INCOMPLETE",
                        &[("collected", &collected), ("total", &total_str)],
                    );
                    break;
                }
            }

            results.extend(window);
            scroll_pos += scroll_width as u64;
        }

        let collected = results.len().to_string();
        Logger::info("AGGREGATE_COMPLETE", &[("documents", &collected)]);
        Ok(results)
    }

    /// Fetches `[scroll_pos, scroll_pos + width)`, shrinking `width` until
    /// the window fits under the cap. The shrunk width is kept for later
    /// windows.
    fn fetch_window(
        &self,
        q: &str,
        index: Option<&str>,
        scroll_pos: u64,
        width: &mut usize,
    ) -> SearchResult<Vec<Value>> {
        loop {
            self.executor.cancel_token().check()?;

            let range_query = format!(
                "({}) AND ({field}:>={} AND {field}:<{})",
                q,
                scroll_pos,
                scroll_pos + *width as u64,
                field = SCROLL_ID_FIELD
            );
            let options = self.options(index).limit(self.window_size);
            let (docs, info) = self.executor.search_with_info(&range_query, &options)?;
            let window_total = info.total_query_matches;

            let pos = scroll_pos.to_string();
            let width_str = width.to_string();
            let returned = docs.len().to_string();
            let total_str = window_total.to_string();

            if window_total <= docs.len() {
                Logger::trace(
                    "AGGREGATE_WINDOW_ACCEPTED",
                    &[("returned", &returned), ("scroll_pos", &pos), ("width", &width_str)],
                );
                return Ok(docs);
            }

            if *width == 1 {
                Logger::warn(
                    "AGGREGATE_SINGLE_ID_OVERFLOW",
                    &[("returned", &returned), ("scroll_pos", &pos), ("window_total", &total_str)],
                );
                return Ok(docs);
            }

            let proportional = *width * docs.len() / window_total;
            *width = if proportional <= 1 {
                (*width / 2).max(1)
            } else {
                proportional
            };

            let new_width = width.to_string();
            Logger::info(
                "AGGREGATE_WINDOW_SHRUNK",
                &[
                    ("new_width", &new_width),
                    ("returned", &returned),
                    ("scroll_pos", &pos),
                    ("width", &width_str),
                    ("window_total", &total_str),
                ],
            );
        }
    }

    fn count(&self, q: &str, index: Option<&str>) -> SearchResult<usize> {
        let options = self.options(index).limit(0);
        let (_, info) = self.executor.search_with_info(q, &options)?;
        Ok(info.total_query_matches)
    }

    fn options(&self, index: Option<&str>) -> SearchOptions {
        SearchOptions {
            index: index.map(str::to_string),
            ..SearchOptions::advanced()
        }
    }
}
