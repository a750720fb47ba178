//! Cursor-addressed offset pagination.
//!
//! A middle ground between the two main strategies: the wire format is an
//! opaque cursor, but the position it encodes is a single `offset` field —
//! the absolute 0-based index of a row. Useful when clients expect cursor
//! semantics over a sort order with no usable keyset (e.g. relevance
//! scores), at the usual OFFSET scan cost.

use crate::{
    codec::{CursorCodec, DefaultCodec},
    cursor::DEFAULT_ROW_CURSOR_KEY,
    error::PaginateError,
    page::CursorPage,
};
use model::core::value::Value;
use query_builder::{ast::{expr::Expr, select::Select}, exec::QueryExecutor};
use tracing::debug;

const OFFSET_KEY: &str = "offset";

pub struct OffsetCursorPagination {
    per_page: usize,
    after: Option<String>,
    row_cursor: Option<String>,
    codec: Option<Box<dyn CursorCodec>>,
}

impl OffsetCursorPagination {
    pub fn new(per_page: usize) -> Self {
        OffsetCursorPagination {
            per_page,
            after: None,
            row_cursor: None,
            codec: None,
        }
    }

    /// Resumes after this cursor: the page starts at the row following the
    /// index it encodes.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Attaches a cursor to every returned row under `$cursor`.
    pub fn row_cursors(self) -> Self {
        self.row_cursor_key(DEFAULT_ROW_CURSOR_KEY)
    }

    /// Attaches a cursor to every returned row under the given key.
    pub fn row_cursor_key(mut self, key: &str) -> Self {
        self.row_cursor = Some(key.to_string());
        self
    }

    /// Replaces the default wire codec.
    pub fn with_codec(mut self, codec: impl CursorCodec + 'static) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    pub async fn execute(
        &self,
        query: &Select,
        executor: &dyn QueryExecutor,
    ) -> Result<CursorPage, PaginateError> {
        let default_codec = DefaultCodec;
        let codec: &dyn CursorCodec = self.codec.as_deref().unwrap_or(&default_codec);

        let after = match &self.after {
            Some(cursor) => {
                let decoded = codec.decode(cursor, &[OFFSET_KEY])?;
                let raw = &decoded[0].1;
                Some(raw.parse::<u64>().map_err(|e| {
                    PaginateError::InvalidCursorValue {
                        key: OFFSET_KEY.to_string(),
                        reason: e.to_string(),
                    }
                })?)
            }
            None => None,
        };

        // The cursor names the last-seen row; the page starts one past it.
        let first_index = after.map(|index| index + 1).unwrap_or(0);

        let mut select = query.clone();
        select.limit = Some(Expr::Value(Value::Uint(self.per_page as u64 + 1)));
        if first_index > 0 {
            select.offset = Some(Expr::Value(Value::Uint(first_index)));
        }

        debug!(per_page = self.per_page, first_index, "executing offset-cursor page");
        let mut rows = executor.fetch(&select).await?;

        let has_next_page = rows.len() > self.per_page;
        rows.truncate(self.per_page);

        let encode_index = |index: u64| {
            codec.encode(&[(OFFSET_KEY, &Value::Uint(index))])
        };

        let (start_cursor, end_cursor, has_prev_page) = if rows.is_empty() {
            (None, None, None)
        } else {
            (
                Some(encode_index(first_index)?),
                Some(encode_index(first_index + rows.len() as u64 - 1)?),
                Some(first_index > 0),
            )
        };

        if let Some(key) = &self.row_cursor {
            for (i, row) in rows.iter_mut().enumerate() {
                let cursor = encode_index(first_index + i as u64)?;
                row.set_value(key, Value::String(cursor));
            }
        }

        Ok(CursorPage {
            start_cursor,
            end_cursor,
            has_next_page,
            has_prev_page,
            rows,
        })
    }
}
