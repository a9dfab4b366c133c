//! Report aggregation
//!
//! Turns the page stream for one site into a `SiteReport` with edit-assist
//! links, and defines the `RunOutput` written for every run.

mod summary;

pub use summary::*;

use crate::error::Result;
use crate::linksearch::PageHandle;
use crate::ordered_map::OrderedMap;
use crate::quote::quote;
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One page linking to the target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_title: String,
    pub page_link: String,
    pub edit_link: String,
}

/// Matches on one site; only built when there is at least one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteReport {
    pub reports: Vec<PageRecord>,
    pub count: usize,
}

/// Everything one run produces for a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub target: String,
    pub start_time: String,
    pub site_reports: OrderedMap<SiteReport>,
    pub skipped: Vec<String>,
    pub summary_table: SummaryTable,
}

/// Timestamp format used for `start_time` and `last_update`
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Edit summary for a site: its own language, then English, then nothing
pub fn summary_for<'a>(preload: &'a OrderedMap<String>, code: &str) -> &'a str {
    preload
        .get(code)
        .or_else(|| preload.get("en"))
        .map(String::as_str)
        .unwrap_or("")
}

/// Edit URL for a page with the summary preloaded and the minor flag set
pub fn edit_link(page_url: &str, summary: &str) -> String {
    format!(
        "{}?action=edit&summary={}&minor=1",
        page_url,
        quote(summary, "/")
    )
}

/// Build the report for one site from its page stream
///
/// Returns `None` when no pages matched. Errors raised by the stream end the
/// report for this site.
pub async fn site_report<S, P>(
    pages: S,
    code: &str,
    preload: &OrderedMap<String>,
) -> Result<Option<SiteReport>>
where
    S: Stream<Item = Result<P>>,
    P: PageHandle,
{
    let summary = summary_for(preload, code);
    let mut pages = std::pin::pin!(pages);
    let mut seen = HashSet::new();
    let mut reports = Vec::new();

    while let Some(page) = pages.try_next().await? {
        let url = page.full_url().to_string();
        let record = PageRecord {
            page_title: page.title().to_string(),
            edit_link: edit_link(&url, summary),
            page_link: url,
        };

        if seen.insert(record.clone()) {
            reports.push(record);
        }
    }

    let count = reports.len();
    if count > 0 {
        Ok(Some(SiteReport { reports, count }))
    } else {
        Ok(None)
    }
}
