//! Postgres 存储实现

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::storage::manager::{quote_ident, DataStore};
use crate::storage::table::{Column, ColumnKind, Table, Value};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{Column as _, Postgres, QueryBuilder, Row, TypeInfo};
use std::time::Duration;

/// Postgres 单条语句的绑定参数上限
const BIND_LIMIT: usize = 65_535;

/// Postgres 存储
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// 创建惰性连接池；连接错误在第一次查询时才出现
    pub fn connect_lazy(config: &StoreConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_lazy_with(options);

        tracing::debug!(url = %config.redacted_url(), "Created Postgres pool");

        Self { pool }
    }
}

#[async_trait]
impl DataStore for PostgresStore {
    async fn query(&self, sql: &str) -> Result<Table, StoreError> {
        let mut rows = sqlx::query(sql).fetch(&self.pool);
        let mut columns: Option<Vec<Column>> = None;
        let mut decoded = Vec::new();

        while let Some(row) = rows.try_next().await.map_err(query_error)? {
            if columns.is_none() {
                columns = Some(describe(&row)?);
            }

            let mut values = Vec::with_capacity(row.columns().len());
            for column in row.columns() {
                values.push(decode_value(&row, column.ordinal(), column.type_info().name())?);
            }
            decoded.push(values);
        }

        let mut table = Table::new(columns.unwrap_or_default());
        for values in decoded {
            table.push_row(values);
        }
        tracing::debug!(rows = table.len(), "Query returned");
        Ok(table)
    }

    async fn append(&self, table_name: &str, data: &Table) -> Result<u64, StoreError> {
        if data.is_empty() {
            return Ok(0);
        }

        let write_error = |e: sqlx::Error| StoreError::Write {
            table: table_name.to_string(),
            message: e.to_string(),
        };

        let mut tx = self.pool.begin().await.map_err(connection_error)?;

        sqlx::query(&create_table_sql(table_name, data.columns()))
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

        let column_list = data
            .columns()
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = format!("INSERT INTO {} ({}) ", quote_ident(table_name), column_list);
        let rows_per_statement = (BIND_LIMIT / data.columns().len()).max(1);

        let mut written = 0;
        for chunk in data.rows().chunks(rows_per_statement) {
            let mut builder = QueryBuilder::<Postgres>::new(&prefix);
            builder.push_values(chunk, |mut separated, row| {
                for (value, column) in row.iter().zip(data.columns()) {
                    push_value(&mut separated, value, column.kind);
                }
            });
            let result = builder.build().execute(&mut *tx).await.map_err(write_error)?;
            written += result.rows_affected();
        }

        tx.commit().await.map_err(write_error)?;

        tracing::debug!(table = table_name, rows = written, "Appended rows");
        Ok(written)
    }
}

fn create_table_sql(table_name: &str, columns: &[Column]) -> String {
    let definitions = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table_name),
        definitions
    )
}

fn push_value(separated: &mut Separated<'_, '_, Postgres, &'static str>, value: &Value, kind: ColumnKind) {
    match value {
        Value::Int(v) => separated.push_bind(*v),
        Value::Float(v) => separated.push_bind(*v),
        Value::Text(v) => separated.push_bind(v.clone()),
        Value::Bool(v) => separated.push_bind(*v),
        Value::Date(v) => separated.push_bind(*v),
        Value::Timestamp(v) => separated.push_bind(*v),
        Value::Null => match kind {
            ColumnKind::Int => separated.push_bind(None::<i64>),
            ColumnKind::Float => separated.push_bind(None::<f64>),
            ColumnKind::Text => separated.push_bind(None::<String>),
            ColumnKind::Bool => separated.push_bind(None::<bool>),
            ColumnKind::Date => separated.push_bind(None::<NaiveDate>),
            ColumnKind::Timestamp => separated.push_bind(None::<DateTime<Utc>>),
        },
    };
}

fn column_kind(column: &str, type_name: &str) -> Result<ColumnKind, StoreError> {
    match type_name {
        "INT2" | "INT4" | "INT8" => Ok(ColumnKind::Int),
        "FLOAT4" | "FLOAT8" => Ok(ColumnKind::Float),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => Ok(ColumnKind::Text),
        "BOOL" => Ok(ColumnKind::Bool),
        "DATE" => Ok(ColumnKind::Date),
        "TIMESTAMP" | "TIMESTAMPTZ" => Ok(ColumnKind::Timestamp),
        other => Err(StoreError::UnsupportedType {
            column: column.to_string(),
            column_type: other.to_string(),
        }),
    }
}

fn describe(row: &PgRow) -> Result<Vec<Column>, StoreError> {
    row.columns()
        .iter()
        .map(|c| Ok(Column::new(c.name(), column_kind(c.name(), c.type_info().name())?)))
        .collect()
}

fn decode_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value, StoreError> {
    let decoded = match type_name {
        "INT2" => row.try_get::<Option<i16>, _>(index).map(|v| v.map(|v| Value::Int(v.into()))),
        "INT4" => row.try_get::<Option<i32>, _>(index).map(|v| v.map(|v| Value::Int(v.into()))),
        "INT8" => row.try_get::<Option<i64>, _>(index).map(|v| v.map(Value::Int)),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index).map(|v| v.map(|v| Value::Float(v.into()))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index).map(|v| v.map(Value::Float)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index).map(|v| v.map(Value::Text))
        }
        "BOOL" => row.try_get::<Option<bool>, _>(index).map(|v| v.map(Value::Bool)),
        "DATE" => row.try_get::<Option<NaiveDate>, _>(index).map(|v| v.map(Value::Date)),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|v| v.map(Value::Timestamp)),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map(|v| Value::Timestamp(v.and_utc()))),
        other => {
            return Err(StoreError::UnsupportedType {
                column: row.columns()[index].name().to_string(),
                column_type: other.to_string(),
            })
        }
    };

    decoded
        .map(|v| v.unwrap_or(Value::Null))
        .map_err(query_error)
}

fn connection_error(e: sqlx::Error) -> StoreError {
    StoreError::Connection(e.to_string())
}

fn query_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => connection_error(e),
        other => StoreError::Query(other.to_string()),
    }
}
