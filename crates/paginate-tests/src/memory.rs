//! An in-memory `QueryExecutor` that evaluates `Select` ASTs against
//! seeded tables.
//!
//! Supports what the pagination executors emit: WHERE predicates built
//! from the expression combinators, INNER JOINs on equality, multi-key
//! ORDER BY, LIMIT/OFFSET, and column projection with aliases. String
//! operands compare numerically against numeric operands, mirroring the
//! implicit coercion a SQL backend applies to untyped cursor values.

use async_trait::async_trait;
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use query_builder::{
    ast::{
        common::{JoinKind, OrderDir},
        expr::{BinaryOperator, Expr, Ident},
        select::Select,
    },
    exec::{ExecError, QueryExecutor},
};
use std::{cmp::Ordering, collections::HashMap};

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: HashMap<String, Vec<RowData>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, rows: Vec<RowData>) -> Self {
        self.tables.insert(name.to_string(), rows);
        self
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn fetch(&self, query: &Select) -> Result<Vec<RowData>, ExecError> {
        let from = query
            .from
            .as_ref()
            .ok_or_else(|| ExecError::Unsupported("SELECT without FROM".to_string()))?;

        let base = self
            .tables
            .get(&from.table.name)
            .ok_or_else(|| ExecError::Database(format!("unknown table: {}", from.table.name)))?;
        let label = from.alias.as_deref().unwrap_or(&from.table.name);

        let mut rows: Vec<RowData> = base.iter().map(|row| qualify(row, label)).collect();

        for join in &query.joins {
            if join.kind != JoinKind::Inner {
                return Err(ExecError::Unsupported(
                    "only INNER JOIN is implemented".to_string(),
                ));
            }

            let right = self.tables.get(&join.table.name).ok_or_else(|| {
                ExecError::Database(format!("unknown table: {}", join.table.name))
            })?;
            let right_label = join.alias.as_deref().unwrap_or(&join.table.name);

            let mut joined = Vec::new();
            for left_row in &rows {
                for right_row in right {
                    let mut candidate = left_row.clone();
                    candidate
                        .field_values
                        .extend(qualify(right_row, right_label).field_values);
                    if eval_predicate(&join.on, &candidate)? {
                        joined.push(candidate);
                    }
                }
            }
            rows = joined;
        }

        if let Some(condition) = &query.where_clause {
            let mut kept = Vec::new();
            for row in rows {
                if eval_predicate(condition, &row)? {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        if !query.order_by.is_empty() {
            rows.sort_by(|a, b| {
                for order in &query.order_by {
                    let left = eval_expr(&order.expr, a).unwrap_or(Value::Null);
                    let right = eval_expr(&order.expr, b).unwrap_or(Value::Null);
                    let mut ordering = compare(&left, &right).unwrap_or(Ordering::Equal);
                    if order.direction == Some(OrderDir::Desc) {
                        ordering = ordering.reverse();
                    }
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = bound_value(query.offset.as_ref())?.unwrap_or(0);
        let limit = bound_value(query.limit.as_ref())?;

        let selected = rows.into_iter().skip(offset);
        let selected: Vec<RowData> = match limit {
            Some(limit) => selected.take(limit).collect(),
            None => selected.collect(),
        };

        selected
            .iter()
            .map(|row| project(query, row, &from.table.name))
            .collect()
    }
}

/// Prefixes every field name with the table (or alias) label, so qualified
/// identifiers resolve unambiguously after joins.
fn qualify(row: &RowData, label: &str) -> RowData {
    RowData::new(
        &row.entity,
        row.field_values
            .iter()
            .map(|f| FieldValue {
                name: format!("{label}.{}", f.name),
                value: f.value.clone(),
            })
            .collect(),
    )
}

fn resolve(row: &RowData, ident: &Ident) -> Value {
    match &ident.qualifier {
        Some(qualifier) => row.get_value(&format!("{qualifier}.{}", ident.name)),
        None => {
            let suffix = format!(".{}", ident.name);
            row.field_values
                .iter()
                .find(|f| f.name == ident.name || f.name.ends_with(&suffix))
                .map(|f| f.value.clone())
                .unwrap_or(Value::Null)
        }
    }
}

fn eval_predicate(expr: &Expr, row: &RowData) -> Result<bool, ExecError> {
    match eval_expr(expr, row)? {
        Value::Boolean(b) => Ok(b),
        other => Err(ExecError::Unsupported(format!(
            "predicate evaluated to non-boolean {}",
            other.kind()
        ))),
    }
}

fn eval_expr(expr: &Expr, row: &RowData) -> Result<Value, ExecError> {
    match expr {
        Expr::Identifier(ident) => Ok(resolve(row, ident)),
        Expr::Value(value) => Ok(value.clone()),
        Expr::Alias { expr, .. } => eval_expr(expr, row),
        Expr::InList { expr, list } => {
            let needle = eval_expr(expr, row)?;
            for item in list {
                let candidate = eval_expr(item, row)?;
                if compare(&needle, &candidate) == Some(Ordering::Equal) {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        Expr::BinaryOp(op) => {
            let left = eval_expr(&op.left, row)?;
            let right = eval_expr(&op.right, row)?;

            let result = match &op.op {
                BinaryOperator::And => {
                    left.as_bool().unwrap_or(false) && right.as_bool().unwrap_or(false)
                }
                BinaryOperator::Or => {
                    left.as_bool().unwrap_or(false) || right.as_bool().unwrap_or(false)
                }
                comparison => match compare(&left, &right) {
                    Some(ordering) => match comparison {
                        BinaryOperator::Eq => ordering == Ordering::Equal,
                        BinaryOperator::NotEq => ordering != Ordering::Equal,
                        BinaryOperator::Lt => ordering == Ordering::Less,
                        BinaryOperator::LtEq => ordering != Ordering::Greater,
                        BinaryOperator::Gt => ordering == Ordering::Greater,
                        BinaryOperator::GtEq => ordering != Ordering::Less,
                        BinaryOperator::And | BinaryOperator::Or => unreachable!(),
                    },
                    // Incomparable operands (e.g. anything against NULL)
                    // never match, as in SQL.
                    None => false,
                },
            };

            Ok(Value::Boolean(result))
        }
    }
}

/// Value comparison with the string-to-number coercion SQL backends apply
/// when an untyped cursor string meets a numeric column.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let Some(ordering) = left.compare(right) {
        return Some(ordering);
    }

    match (left, right) {
        (Value::String(s), other) if is_numeric(other) => {
            s.parse::<f64>().ok()?.partial_cmp(&as_f64(other)?)
        }
        (other, Value::String(s)) if is_numeric(other) => {
            as_f64(other)?.partial_cmp(&s.parse::<f64>().ok()?)
        }
        _ => None,
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Uint(_) | Value::Float(_))
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::Uint(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

fn bound_value(expr: Option<&Expr>) -> Result<Option<usize>, ExecError> {
    match expr {
        None => Ok(None),
        Some(Expr::Value(value)) => value.as_usize().map(Some).ok_or_else(|| {
            ExecError::Unsupported("LIMIT/OFFSET must be a non-negative integer".to_string())
        }),
        Some(other) => Err(ExecError::Unsupported(format!(
            "LIMIT/OFFSET expression not supported: {other:?}"
        ))),
    }
}

fn project(query: &Select, row: &RowData, entity: &str) -> Result<RowData, ExecError> {
    let mut field_values = Vec::with_capacity(query.columns.len());

    for column in &query.columns {
        let (name, value) = match column {
            Expr::Identifier(ident) => (ident.name.clone(), resolve(row, ident)),
            Expr::Alias { expr, alias } => match expr.as_ref() {
                Expr::Identifier(ident) => (alias.clone(), resolve(row, ident)),
                other => {
                    return Err(ExecError::Unsupported(format!(
                        "aliased projection not supported: {other:?}"
                    )));
                }
            },
            other => {
                return Err(ExecError::Unsupported(format!(
                    "projection not supported: {other:?}"
                )));
            }
        };
        field_values.push(FieldValue { name, value });
    }

    Ok(RowData::new(entity, field_values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::row;
    use query_builder::{builder::select::SelectBuilder, ident, qual_ident, table_ref, value};

    fn executor() -> MemoryExecutor {
        MemoryExecutor::new().with_table(
            "items",
            vec![
                row("items", vec![("id", Value::Uint(1)), ("rank", Value::Uint(3))]),
                row("items", vec![("id", Value::Uint(2)), ("rank", Value::Uint(1))]),
                row("items", vec![("id", Value::Uint(3)), ("rank", Value::Uint(2))]),
            ],
        )
    }

    #[tokio::test]
    async fn filters_orders_and_limits() {
        let query = SelectBuilder::new()
            .select(vec![ident("id"), ident("rank")])
            .from(table_ref!("items"), None)
            .where_clause(Expr::binary(
                ident("rank"),
                BinaryOperator::Gt,
                value!(Value::Uint(1)),
            ))
            .order_by(ident("rank"), Some(OrderDir::Asc))
            .limit(value(Value::Uint(1)))
            .build();

        let rows = executor().fetch(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_value("id"), Value::Uint(3));
    }

    #[tokio::test]
    async fn coerces_strings_against_numbers() {
        let query = SelectBuilder::new()
            .select(vec![ident("id")])
            .from(table_ref!("items"), None)
            .where_clause(Expr::binary(
                ident("rank"),
                BinaryOperator::GtEq,
                value(Value::String("2".to_string())),
            ))
            .order_by(qual_ident("items", "id"), Some(OrderDir::Asc))
            .build();

        let rows = executor().fetch(&query).await.unwrap();
        let ids: Vec<Value> = rows.iter().map(|r| r.get_value("id")).collect();
        assert_eq!(ids, vec![Value::Uint(1), Value::Uint(3)]);
    }
}
