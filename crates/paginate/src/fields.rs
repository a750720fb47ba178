//! Sort-field declarations and their one-shot normalization.

use crate::error::PaginateError;
use query_builder::ast::{common::OrderDir, expr::Ident};

/// A column reference used for sorting, with or without an explicit cursor
/// key.
///
/// When the key is omitted it is derived from the column's rightmost dotted
/// segment, once, during field-list normalization — `users.created_at`
/// becomes the key `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortExpr {
    /// Column reference with an explicit cursor key.
    Keyed { column: Ident, key: String },

    /// Bare column reference; the key is the column name itself.
    Column(Ident),
}

/// One entry of an ordered sort-field list. List order defines the
/// lexicographic tie-break priority for keyset pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub expr: SortExpr,
    pub direction: OrderDir,
}

impl SortField {
    /// An ascending sort field from a (possibly dotted) column reference.
    pub fn asc(reference: &str) -> Self {
        SortField {
            expr: SortExpr::Column(parse_reference(reference)),
            direction: OrderDir::Asc,
        }
    }

    /// A descending sort field from a (possibly dotted) column reference.
    pub fn desc(reference: &str) -> Self {
        SortField {
            expr: SortExpr::Column(parse_reference(reference)),
            direction: OrderDir::Desc,
        }
    }

    /// Overrides the cursor key. The key must match the column's name in
    /// the executed query's output rows.
    pub fn with_key(self, key: &str) -> Self {
        let column = match self.expr {
            SortExpr::Keyed { column, .. } => column,
            SortExpr::Column(column) => column,
        };
        SortField {
            expr: SortExpr::Keyed {
                column,
                key: key.to_string(),
            },
            direction: self.direction,
        }
    }
}

/// A normalized sort field: column, resolved cursor key, direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundField {
    pub column: Ident,
    pub key: String,
    pub direction: OrderDir,
}

/// Resolves a field list into bound fields, deriving omitted keys and
/// enforcing the list invariants: at least one field, unique keys.
pub fn normalize(fields: &[SortField]) -> Result<Vec<BoundField>, PaginateError> {
    if fields.is_empty() {
        return Err(PaginateError::EmptyFieldList);
    }

    let mut bound = Vec::with_capacity(fields.len());
    for field in fields {
        let (column, key) = match &field.expr {
            SortExpr::Keyed { column, key } => (column.clone(), key.clone()),
            SortExpr::Column(column) => (column.clone(), column.name.clone()),
        };

        if bound.iter().any(|b: &BoundField| b.key == key) {
            return Err(PaginateError::DuplicateSortKey(key));
        }

        bound.push(BoundField {
            column,
            key,
            direction: field.direction,
        });
    }

    Ok(bound)
}

fn parse_reference(reference: &str) -> Ident {
    match reference.split_once('.') {
        Some((qualifier, name)) => Ident {
            qualifier: Some(qualifier.to_string()),
            name: name.to_string(),
        },
        None => Ident {
            qualifier: None,
            name: reference.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_key_from_rightmost_segment() {
        let bound = normalize(&[SortField::desc("posts.author_id"), SortField::desc("posts.id")])
            .unwrap();

        assert_eq!(bound[0].key, "author_id");
        assert_eq!(bound[0].column.qualifier.as_deref(), Some("posts"));
        assert_eq!(bound[1].key, "id");
        assert_eq!(bound[1].direction, OrderDir::Desc);
    }

    #[test]
    fn explicit_key_overrides_derivation() {
        let bound = normalize(&[SortField::asc("users.created_at").with_key("joined")]).unwrap();
        assert_eq!(bound[0].key, "joined");
        assert_eq!(bound[0].column.name, "created_at");
    }

    #[test]
    fn rejects_empty_field_list() {
        assert!(matches!(
            normalize(&[]),
            Err(PaginateError::EmptyFieldList)
        ));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = normalize(&[SortField::asc("a.id"), SortField::desc("b.id")]).unwrap_err();
        assert!(matches!(err, PaginateError::DuplicateSortKey(key) if key == "id"));
    }
}
