//! Page result types handed back to callers.

use model::records::row::RowData;
use serde::Serialize;

/// One page of a cursor-paginated result set.
///
/// `start_cursor`/`end_cursor` address the first and last returned rows and
/// are `None` on an empty page. `has_prev_page` is `None` when the strategy
/// cannot know it without another query.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_prev_page: Option<bool>,
    pub rows: Vec<RowData>,
}

/// One page of an offset-paginated result set, addressed by absolute
/// 1-based page number instead of cursors.
///
/// Both flags are `None` when the page is empty: past the end of the
/// result set the direction cannot be determined from the rows alone.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage {
    pub has_next_page: Option<bool>,
    pub has_prev_page: Option<bool>,
    pub rows: Vec<RowData>,
}
