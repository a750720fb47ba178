//! Builds the composite keyset predicate: "row strictly after (or before)
//! the cursor position" over N ordered sort fields.

use crate::{error::PaginateError, fields::BoundField};
use model::core::value::Value;
use query_builder::ast::{
    common::OrderDir,
    expr::{BinaryOperator, Expr},
};

/// Which side of the cursor the requested page lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Rows strictly after the cursor in the declared sort order.
    After,
    /// Rows strictly before the cursor in the declared sort order.
    Before,
}

/// Builds the standard composite keyset condition:
///
/// ```text
/// predicate(i) = (f_i <op> v_i) OR (f_i = v_i AND predicate(i + 1))
/// ```
///
/// where `<op>` follows each field's direction (`>` for ascending, `<` for
/// descending) and `Bound::Before` inverts the sense. No row is skipped or
/// duplicated across pages as long as the field list total-orders the rows;
/// including a unique final tie-breaker (typically the primary key) is the
/// caller's responsibility.
pub fn keyset_predicate(
    fields: &[BoundField],
    values: &[Value],
    bound: Bound,
) -> Result<Expr, PaginateError> {
    if fields.is_empty() {
        return Err(PaginateError::EmptyFieldList);
    }
    apply(fields, values, bound, 0)
}

fn apply(
    fields: &[BoundField],
    values: &[Value],
    bound: Bound,
    index: usize,
) -> Result<Expr, PaginateError> {
    let field = fields
        .get(index)
        .ok_or(PaginateError::UnknownCursorField(index))?;
    let value = values
        .get(index)
        .ok_or(PaginateError::UnknownCursorField(index))?;

    let op = match (bound, field.direction) {
        (Bound::After, OrderDir::Asc) | (Bound::Before, OrderDir::Desc) => BinaryOperator::Gt,
        (Bound::After, OrderDir::Desc) | (Bound::Before, OrderDir::Asc) => BinaryOperator::Lt,
    };

    let column = Expr::Identifier(field.column.clone());
    let strict = Expr::binary(column.clone(), op, Expr::Value(value.clone()));

    // Last field: strict inequality only, no tie to break further.
    if index + 1 == fields.len() {
        return Ok(strict);
    }

    let tied = Expr::binary(column, BinaryOperator::Eq, Expr::Value(value.clone()));
    let rest = apply(fields, values, bound, index + 1)?;

    Ok(Expr::or(strict, Expr::and(tied, rest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{SortField, normalize};
    use query_builder::{
        dialect::Postgres,
        render::{Render, Renderer},
    };

    fn render(expr: &Expr) -> (String, Vec<Value>) {
        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        expr.render(&mut renderer);
        renderer.finish()
    }

    #[test]
    fn single_ascending_field() {
        let fields = normalize(&[SortField::asc("id")]).unwrap();
        let predicate =
            keyset_predicate(&fields, &[Value::Uint(7)], Bound::After).unwrap();

        let (sql, params) = render(&predicate);
        assert_eq!(sql, r#"("id" > $1)"#);
        assert_eq!(params, vec![Value::Uint(7)]);
    }

    #[test]
    fn two_fields_nest_or_and() {
        let fields =
            normalize(&[SortField::desc("author_id"), SortField::desc("id")]).unwrap();
        let predicate = keyset_predicate(
            &fields,
            &[Value::Uint(3), Value::Uint(12)],
            Bound::After,
        )
        .unwrap();

        let (sql, params) = render(&predicate);
        assert_eq!(
            sql,
            r#"(("author_id" < $1) OR (("author_id" = $2) AND ("id" < $3)))"#
        );
        assert_eq!(
            params,
            vec![Value::Uint(3), Value::Uint(3), Value::Uint(12)]
        );
    }

    #[test]
    fn before_inverts_the_comparison_sense() {
        let fields = normalize(&[SortField::asc("created_at"), SortField::asc("id")]).unwrap();
        let predicate = keyset_predicate(
            &fields,
            &[
                Value::String("2024-01-01".to_string()),
                Value::Uint(5),
            ],
            Bound::Before,
        )
        .unwrap();

        let (sql, _) = render(&predicate);
        assert_eq!(
            sql,
            r#"(("created_at" < $1) OR (("created_at" = $2) AND ("id" < $3)))"#
        );
    }

    #[test]
    fn mixed_directions_follow_each_field() {
        let fields = normalize(&[SortField::asc("name"), SortField::desc("id")]).unwrap();
        let predicate = keyset_predicate(
            &fields,
            &[Value::String("m".to_string()), Value::Uint(10)],
            Bound::After,
        )
        .unwrap();

        let (sql, _) = render(&predicate);
        assert_eq!(
            sql,
            r#"(("name" > $1) OR (("name" = $2) AND ("id" < $3)))"#
        );
    }

    #[test]
    fn short_value_list_surfaces_unknown_field() {
        let fields = normalize(&[SortField::asc("a"), SortField::asc("b")]).unwrap();
        let err = keyset_predicate(&fields, &[Value::Uint(1)], Bound::After).unwrap_err();
        assert!(matches!(err, PaginateError::UnknownCursorField(1)));
    }
}
