//! Maps a search's status to what should be shown for it.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::models::{SearchRecord, SearchStatus};
use crate::results::{self, ResultShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Pending or processing. No progress percentage is known.
    Waiting,
    Failed,
    ResultsEmpty,
    ResultsPresent,
}

/// A render mode together with the normalized results it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchView {
    Waiting(SearchStatus),
    Failed,
    ResultsEmpty,
    ResultsPresent(ResultShape),
}

impl SearchView {
    pub fn mode(&self) -> RenderMode {
        match self {
            SearchView::Waiting(_) => RenderMode::Waiting,
            SearchView::Failed => RenderMode::Failed,
            SearchView::ResultsEmpty => RenderMode::ResultsEmpty,
            SearchView::ResultsPresent(_) => RenderMode::ResultsPresent,
        }
    }

    /// Candidate count for completed searches, `None` otherwise.
    pub fn candidate_count(&self) -> Option<usize> {
        match self {
            SearchView::ResultsEmpty => Some(0),
            SearchView::ResultsPresent(shape) => Some(shape.total()),
            SearchView::Waiting(_) | SearchView::Failed => None,
        }
    }
}

/// Results are only looked at when the status is `completed`.
pub fn view_for(status: SearchStatus, results: Option<&serde_json::Value>) -> SearchView {
    match status {
        SearchStatus::Pending | SearchStatus::Processing => SearchView::Waiting(status),
        SearchStatus::Failed => SearchView::Failed,
        SearchStatus::Completed => {
            let shape = results::normalize(results);
            debug!(shape = shape.kind(), total = shape.total(), "normalized results");
            if shape.is_empty() {
                SearchView::ResultsEmpty
            } else {
                SearchView::ResultsPresent(shape)
            }
        }
    }
}

pub fn render_mode(status: &str, results: Option<&serde_json::Value>) -> Result<RenderMode> {
    let status: SearchStatus = status.parse()?;
    Ok(view_for(status, results).mode())
}

pub fn classify(record: &SearchRecord) -> Result<SearchView> {
    let status = record.parsed_status()?;
    Ok(view_for(status, record.results.as_ref()))
}
