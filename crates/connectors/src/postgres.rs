//! PostgreSQL executor for the query-builder seam.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use query_builder::{
    ast::select::Select,
    dialect::Postgres,
    exec::{ExecError, QueryExecutor},
    render::{Render, Renderer},
};
use tokio_postgres::{Client, Row as PgRow, types::ToSql};
use tracing::{trace, warn};
use uuid::Uuid;

/// Executes `Select` ASTs against a PostgreSQL connection.
///
/// Connection setup, pooling, TLS, timeouts and retries belong to the
/// caller; this type only renders, binds and converts.
pub struct PostgresExecutor {
    client: Client,
}

impl PostgresExecutor {
    pub fn new(client: Client) -> Self {
        PostgresExecutor { client }
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn fetch(&self, query: &Select) -> Result<Vec<RowData>, ExecError> {
        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        query.render(&mut renderer);
        let (sql, params) = renderer.finish();

        trace!(%sql, params = params.len(), "executing select");

        // The boxes must be Send: they live across the query await.
        let bound: Vec<Box<dyn ToSql + Send + Sync>> = params.iter().map(to_sql_param).collect();
        let refs: Vec<&(dyn ToSql + Sync)> = bound
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let entity = query
            .from
            .as_ref()
            .map(|f| f.table.name.clone())
            .unwrap_or_default();

        let rows = self
            .client
            .query(&sql, &refs)
            .await
            .map_err(|e| ExecError::Database(e.to_string()))?;

        Ok(rows.iter().map(|row| to_row_data(row, &entity)).collect())
    }
}

fn to_sql_param(value: &Value) -> Box<dyn ToSql + Send + Sync> {
    match value {
        Value::Int(v) => Box::new(*v),
        // Postgres has no unsigned integer type; bind as BIGINT.
        Value::Uint(v) => Box::new(*v as i64),
        Value::Float(v) => Box::new(*v),
        Value::String(s) => Box::new(s.clone()),
        Value::Boolean(b) => Box::new(*b),
        Value::Date(d) => Box::new(*d),
        Value::Timestamp(ts) => Box::new(*ts),
        Value::Uuid(u) => Box::new(*u),
        Value::Null => Box::new(Option::<String>::None),
    }
}

fn to_row_data(row: &PgRow, entity: &str) -> RowData {
    let field_values = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| FieldValue {
            name: column.name().to_string(),
            value: column_value(row, idx, column.type_().name()),
        })
        .collect();

    RowData::new(entity, field_values)
}

fn column_value(row: &PgRow, idx: usize, type_name: &str) -> Value {
    let value = match type_name {
        "int2" => row.try_get::<_, i16>(idx).ok().map(|v| Value::Int(v as i64)),
        "int4" => row.try_get::<_, i32>(idx).ok().map(|v| Value::Int(v as i64)),
        "int8" => row.try_get::<_, i64>(idx).ok().map(Value::Int),
        "float4" => row
            .try_get::<_, f32>(idx)
            .ok()
            .map(|v| Value::Float(v as f64)),
        "float8" => row.try_get::<_, f64>(idx).ok().map(Value::Float),
        "text" | "varchar" | "bpchar" | "name" => {
            row.try_get::<_, String>(idx).ok().map(Value::String)
        }
        "bool" => row.try_get::<_, bool>(idx).ok().map(Value::Boolean),
        "date" => row.try_get::<_, NaiveDate>(idx).ok().map(Value::Date),
        "timestamptz" => row
            .try_get::<_, DateTime<Utc>>(idx)
            .ok()
            .map(Value::Timestamp),
        "uuid" => row.try_get::<_, Uuid>(idx).ok().map(Value::Uuid),
        other => {
            warn!("unhandled column type: {other}");
            None
        }
    };

    // NULLs and unhandled types both land here.
    value.unwrap_or(Value::Null)
}
