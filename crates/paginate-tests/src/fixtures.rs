//! Shared tables and base queries for the pagination tests.

use crate::memory::MemoryExecutor;
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use query_builder::{
    ast::{
        common::{JoinKind, OrderDir},
        expr::{BinaryOperator, Expr},
        select::Select,
    },
    builder::select::SelectBuilder,
    ident, qual_ident, table_ref,
};

pub fn row(entity: &str, fields: Vec<(&str, Value)>) -> RowData {
    RowData::new(
        entity,
        fields
            .into_iter()
            .map(|(name, value)| FieldValue {
                name: name.to_string(),
                value,
            })
            .collect(),
    )
}

/// Ten posts across five authors, with duplicate `author_id` values so a
/// sort on `author_id` alone cannot total-order the rows.
pub fn posts_table() -> Vec<RowData> {
    let authors: [(u64, u64); 10] = [
        (1, 3),
        (2, 1),
        (3, 5),
        (4, 3),
        (5, 2),
        (6, 5),
        (7, 1),
        (8, 4),
        (9, 2),
        (10, 3),
    ];

    authors
        .into_iter()
        .map(|(id, author_id)| {
            row(
                "posts",
                vec![
                    ("id", Value::Uint(id)),
                    ("author_id", Value::Uint(author_id)),
                    ("title", Value::String(format!("post-{id}"))),
                ],
            )
        })
        .collect()
}

pub fn users_table() -> Vec<RowData> {
    ["alice", "bob", "carol", "dave", "erin"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            row(
                "users",
                vec![
                    ("id", Value::Uint(i as u64 + 1)),
                    ("name", Value::String(name.to_string())),
                ],
            )
        })
        .collect()
}

pub fn executor() -> MemoryExecutor {
    MemoryExecutor::new()
        .with_table("posts", posts_table())
        .with_table("users", users_table())
}

/// `SELECT id, author_id, title FROM posts`
pub fn posts_query() -> Select {
    SelectBuilder::new()
        .select(vec![ident("id"), ident("author_id"), ident("title")])
        .from(table_ref!("posts"), None)
        .build()
}

/// A wide joined select:
/// `SELECT p.id, p.author_id, p.title, u.name AS author_name
///  FROM posts AS p INNER JOIN users AS u ON p.author_id = u.id
///  ORDER BY p.id`
pub fn joined_query() -> Select {
    SelectBuilder::new()
        .select(vec![
            qual_ident("p", "id"),
            qual_ident("p", "author_id"),
            qual_ident("p", "title"),
            Expr::Alias {
                expr: Box::new(qual_ident("u", "name")),
                alias: "author_name".to_string(),
            },
        ])
        .from(table_ref!("posts"), Some("p"))
        .join(
            JoinKind::Inner,
            table_ref!("users"),
            Some("u"),
            Expr::binary(
                qual_ident("p", "author_id"),
                BinaryOperator::Eq,
                qual_ident("u", "id"),
            ),
        )
        .order_by(qual_ident("p", "id"), Some(OrderDir::Asc))
        .build()
}

/// Coerces decoded cursor strings to unsigned integers; the typed parse
/// hook used wherever cursor fields are numeric columns.
pub fn uint_parser(
) -> impl Fn(&str, &str) -> Result<Value, paginate::PaginateError> + Send + Sync {
    |key: &str, raw: &str| {
        raw.parse::<u64>()
            .map(Value::Uint)
            .map_err(|e| paginate::PaginateError::InvalidCursorValue {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}
