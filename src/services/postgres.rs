use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::services::store::{Filter, FilterOp, Store, StoreError, Table};

/// Direct PostgreSQL access to the `profiles` and `likes` tables
///
/// Used when the service runs next to the database instead of going through
/// the hosted REST endpoint. Rows are converted to and from JSON inside
/// PostgreSQL (`to_jsonb` / `jsonb_populate_record`) so the adapter stays
/// schema-agnostic apart from the column whitelist.
pub struct PgStore {
    pool: PgPool,
}

enum Bind {
    Text(String),
    TextArray(Vec<String>),
}

impl PgStore {
    /// Connect and run embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max: {} connections)",
            settings.max_connections.unwrap_or(10)
        );

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    fn bind_all<'q>(sql: &'q str, binds: Vec<Bind>) -> Query<'q, Postgres, PgArguments> {
        binds.into_iter().fold(sqlx::query(sql), |query, bind| match bind {
            Bind::Text(value) => query.bind(value),
            Bind::TextArray(values) => query.bind(values),
        })
    }
}

/// Build a `WHERE` clause comparing columns in their text form.
/// Parameters are numbered from `$1`.
fn where_clause(table: Table, filters: &[Filter]) -> Result<(String, Vec<Bind>), StoreError> {
    let mut conditions = Vec::with_capacity(filters.len());
    let mut binds = Vec::with_capacity(filters.len());

    for (i, filter) in filters.iter().enumerate() {
        table.check_column(&filter.column)?;
        let param = i + 1;

        let (condition, bind) = match &filter.op {
            FilterOp::Eq(value) => (
                format!("\"{}\"::text = ${}", filter.column, param),
                Bind::Text(value.clone()),
            ),
            FilterOp::Neq(value) => (
                format!("\"{}\"::text IS DISTINCT FROM ${}", filter.column, param),
                Bind::Text(value.clone()),
            ),
            FilterOp::In(values) => (
                format!("\"{}\"::text = ANY(${})", filter.column, param),
                Bind::TextArray(values.clone()),
            ),
        };

        conditions.push(condition);
        binds.push(bind);
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    Ok((clause, binds))
}

/// Build `INSERT ... SELECT ... FROM jsonb_populate_record(...)` for the
/// columns present in `row`
fn insert_statement(table: Table, row: &Value) -> Result<(String, Vec<String>), StoreError> {
    table.check_row(row)?;

    let columns: Vec<String> = row
        .as_object()
        .map(|object| object.keys().map(|k| format!("\"{}\"", k)).collect())
        .unwrap_or_default();

    if columns.is_empty() {
        return Err(StoreError::InvalidResponse(format!("empty row for {}", table)));
    }

    let column_list = columns.join(", ");
    let sql = format!(
        "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)",
        table = table.name(),
        columns = column_list,
    );

    Ok((sql, columns))
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        let (clause, binds) = where_clause(table, filters)?;
        let sql = format!("SELECT to_jsonb(t) AS row FROM {} t{}", table.name(), clause);

        let rows = Self::bind_all(&sql, binds).fetch_all(&self.pool).await?;

        let values = rows
            .iter()
            .map(|row| row.try_get::<Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Selected {} rows from {}", values.len(), table);
        Ok(values)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<(), StoreError> {
        let (sql, _) = insert_statement(table, &row)?;

        sqlx::query(&sql).bind(&row).execute(&self.pool).await?;

        tracing::debug!("Inserted row into {}", table);
        Ok(())
    }

    /// Uses INSERT ... ON CONFLICT so a repeated relation updates in place
    async fn upsert(&self, table: Table, row: Value, conflict_keys: &[&str]) -> Result<(), StoreError> {
        for key in conflict_keys {
            table.check_column(key)?;
        }
        let (insert, columns) = insert_statement(table, &row)?;

        let keys: Vec<String> = conflict_keys.iter().map(|k| format!("\"{}\"", k)).collect();
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !keys.contains(c))
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect();

        let action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        let sql = format!("{} ON CONFLICT ({}) {}", insert, keys.join(", "), action);

        sqlx::query(&sql).bind(&row).execute(&self.pool).await?;

        tracing::debug!("Upserted row into {} (conflict on {:?})", table, conflict_keys);
        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<(), StoreError> {
        let (clause, binds) = where_clause(table, filters)?;
        let sql = format!("DELETE FROM {}{}", table.name(), clause);

        let result = Self::bind_all(&sql, binds).execute(&self.pool).await?;

        tracing::debug!("Deleted {} rows from {}", result.rows_affected(), table);
        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
