//! The cursor (keyset) pagination executor.

use crate::{
    codec::{CursorCodec, DefaultCodec, ParseCursor, RawStrings},
    error::PaginateError,
    fields::{self, BoundField, SortField},
    keyset::{Bound, keyset_predicate},
    page::CursorPage,
};
use model::core::value::Value;
use query_builder::{
    ast::{
        expr::Expr,
        select::{OrderByExpr, Select},
    },
    exec::QueryExecutor,
};
use tracing::debug;

/// The key under which per-row cursors are attached when none is chosen.
pub const DEFAULT_ROW_CURSOR_KEY: &str = "$cursor";

/// Keyset pagination over a base query.
///
/// Filters rows strictly past the cursor position instead of skipping by
/// count, so pages stay stable under concurrent inserts and deletes and
/// the database never scans rows it will not return. The sort-field list
/// must total-order the rows — include a unique tie-breaker (typically the
/// primary key) as the final field, or rows with identical sort values can
/// be skipped or repeated across page boundaries.
pub struct CursorPagination {
    per_page: usize,
    after: Option<String>,
    before: Option<String>,
    fields: Vec<SortField>,
    row_cursor: Option<String>,
    codec: Option<Box<dyn CursorCodec>>,
    parser: Option<Box<dyn ParseCursor>>,
}

impl CursorPagination {
    pub fn new(per_page: usize) -> Self {
        CursorPagination {
            per_page,
            after: None,
            before: None,
            fields: Vec::new(),
            row_cursor: None,
            codec: None,
            parser: None,
        }
    }

    /// Restricts the page to rows strictly after this cursor.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Restricts the page to rows strictly before this cursor. Combined
    /// with `after`, the two bound a window.
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    /// Appends one sort field. Declaration order is tie-break priority.
    pub fn field(mut self, field: SortField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: Vec<SortField>) -> Self {
        self.fields = fields;
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

    /// Sets the raw-string-to-typed-value coercion used for decoded cursor
    /// fields. Defaults to identity: fields stay strings.
    pub fn parse_with(mut self, parser: impl ParseCursor + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Runs the paginated query against the executor.
    ///
    /// Codec and predicate errors propagate unchanged; treat them as
    /// client input errors, not server faults.
    pub async fn execute(
        &self,
        query: &Select,
        executor: &dyn QueryExecutor,
    ) -> Result<CursorPage, PaginateError> {
        let bound_fields = fields::normalize(&self.fields)?;
        let default_codec = DefaultCodec;
        let default_parser = RawStrings;
        let codec: &dyn CursorCodec = self.codec.as_deref().unwrap_or(&default_codec);
        let parser: &dyn ParseCursor = self.parser.as_deref().unwrap_or(&default_parser);

        let keys: Vec<&str> = bound_fields.iter().map(|f| f.key.as_str()).collect();

        let mut select = query.clone();

        if let Some(after) = &self.after {
            let values = decode_typed(codec, parser, after, &keys)?;
            select.and_where(keyset_predicate(&bound_fields, &values, Bound::After)?);
        }

        if let Some(before) = &self.before {
            let values = decode_typed(codec, parser, before, &keys)?;
            select.and_where(keyset_predicate(&bound_fields, &values, Bound::Before)?);
        }

        for field in &bound_fields {
            select.order_by.push(OrderByExpr {
                expr: Expr::Identifier(field.column.clone()),
                direction: Some(field.direction),
            });
        }

        // Over-fetch one row to detect a next page without a second query.
        select.limit = Some(Expr::Value(Value::Uint(self.per_page as u64 + 1)));

        debug!(
            per_page = self.per_page,
            fields = bound_fields.len(),
            after = self.after.is_some(),
            before = self.before.is_some(),
            "executing cursor page"
        );

        let mut rows = executor.fetch(&select).await?;

        let has_next_page = rows.len() > self.per_page;
        rows.truncate(self.per_page);

        let start_cursor = match rows.first() {
            Some(row) => Some(encode_row(codec, &bound_fields, row)?),
            None => None,
        };
        let end_cursor = match rows.last() {
            Some(row) => Some(encode_row(codec, &bound_fields, row)?),
            None => None,
        };

        if let Some(key) = &self.row_cursor {
            for row in &mut rows {
                let cursor = encode_row(codec, &bound_fields, row)?;
                row.set_value(key, Value::String(cursor));
            }
        }

        Ok(CursorPage {
            start_cursor,
            end_cursor,
            has_next_page,
            // Not knowable without another query; see the page type docs.
            has_prev_page: None,
            rows,
        })
    }
}

fn decode_typed(
    codec: &dyn CursorCodec,
    parser: &dyn ParseCursor,
    cursor: &str,
    keys: &[&str],
) -> Result<Vec<Value>, PaginateError> {
    codec
        .decode(cursor, keys)?
        .iter()
        .map(|(key, raw)| parser.parse(key, raw))
        .collect()
}

fn encode_row(
    codec: &dyn CursorCodec,
    fields: &[BoundField],
    row: &model::records::row::RowData,
) -> Result<String, PaginateError> {
    let values: Vec<(&str, Value)> = fields
        .iter()
        .map(|f| (f.key.as_str(), row.get_value(&f.key)))
        .collect();
    let refs: Vec<(&str, &Value)> = values.iter().map(|(k, v)| (*k, v)).collect();
    codec.encode(&refs)
}
