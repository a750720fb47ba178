//! The offset pagination executor, with the deferred-join optimization.

use crate::{error::PaginateError, page::OffsetPage};
use model::core::value::Value;
use query_builder::{
    ast::{
        expr::{BinaryOperator, Expr, Ident},
        select::Select,
    },
    exec::QueryExecutor,
};
use tracing::debug;

/// Offset pagination over a base query, addressed by 1-based page number.
///
/// With a deferred join configured, the offset scan runs over a narrowed
/// key-only projection first and the full rows are re-selected by key
/// membership, so the database never sorts and skips wide joined rows —
/// only the index-backed key lookup pays the offset cost. Both paths
/// return identical rows and flags for the same inputs.
pub struct OffsetPagination {
    per_page: usize,
    page: u64,
    deferred_join: Option<Ident>,
}

impl OffsetPagination {
    pub fn new(per_page: usize, page: u64) -> Self {
        OffsetPagination {
            per_page,
            page,
            deferred_join: None,
        }
    }

    /// Enables the deferred join, keyed on the given primary-key column.
    pub fn deferred_join(mut self, primary_key: Ident) -> Self {
        self.deferred_join = Some(primary_key);
        self
    }

    pub async fn execute(
        &self,
        query: &Select,
        executor: &dyn QueryExecutor,
    ) -> Result<OffsetPage, PaginateError> {
        if self.page < 1 {
            return Err(PaginateError::InvalidPageNumber(self.page));
        }

        let limit = self.per_page as u64 + 1;
        let offset = (self.page - 1) * self.per_page as u64;

        match &self.deferred_join {
            None => self.plain(query, executor, limit, offset).await,
            Some(pk) => self.deferred(query, executor, pk, limit, offset).await,
        }
    }

    async fn plain(
        &self,
        query: &Select,
        executor: &dyn QueryExecutor,
        limit: u64,
        offset: u64,
    ) -> Result<OffsetPage, PaginateError> {
        let mut select = query.clone();
        select.limit = Some(Expr::Value(Value::Uint(limit)));
        select.offset = Some(Expr::Value(Value::Uint(offset)));

        debug!(per_page = self.per_page, page = self.page, "executing offset page");
        let mut rows = executor.fetch(&select).await?;

        let page = self.flags(rows.len());
        rows.truncate(self.per_page);

        Ok(OffsetPage { rows, ..page })
    }

    async fn deferred(
        &self,
        query: &Select,
        executor: &dyn QueryExecutor,
        pk: &Ident,
        limit: u64,
        offset: u64,
    ) -> Result<OffsetPage, PaginateError> {
        // Pass 1: the offset scan over the key column only.
        let mut keys_query = query.clone();
        keys_query.columns = vec![Expr::Identifier(pk.clone())];
        keys_query.limit = Some(Expr::Value(Value::Uint(limit)));
        keys_query.offset = Some(Expr::Value(Value::Uint(offset)));

        debug!(
            per_page = self.per_page,
            page = self.page,
            key = %pk.name,
            "executing deferred-join key scan"
        );
        let mut key_rows = executor.fetch(&keys_query).await?;

        let page = self.flags(key_rows.len());
        key_rows.truncate(self.per_page);

        let keys: Vec<Expr> = key_rows
            .iter()
            .map(|row| Expr::Value(row.get_value(&pk.name)))
            .collect();

        // Pass 2: the original query, limit/offset replaced by key
        // membership. The caller's predicate tree stays intact.
        let mut select = query.clone();
        select.limit = None;
        select.offset = None;
        select.and_where(if keys.is_empty() {
            // Some dialects treat an empty IN-list inconsistently; a
            // constant-false predicate is portable.
            always_false()
        } else {
            Expr::InList {
                expr: Box::new(Expr::Identifier(pk.clone())),
                list: keys,
            }
        });

        let rows = executor.fetch(&select).await?;

        Ok(OffsetPage { rows, ..page })
    }

    /// Flags from the over-fetched row count; rows carry no direction on
    /// an empty page, so both stay unset there.
    fn flags(&self, fetched: usize) -> OffsetPage {
        let (has_next_page, has_prev_page) = if fetched == 0 {
            (None, None)
        } else {
            (Some(fetched > self.per_page), Some(self.page > 1))
        };

        OffsetPage {
            has_next_page,
            has_prev_page,
            rows: Vec::new(),
        }
    }
}

/// `1 = 0`: the constant-false filter for the empty deferred-join page.
fn always_false() -> Expr {
    Expr::binary(
        Expr::Value(Value::Int(1)),
        BinaryOperator::Eq,
        Expr::Value(Value::Int(0)),
    )
}
