use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use prosper_core::store::{merge_patch, record_id, stamp_new_record, Condition, EntityStore, Query};
use prosper_core::{EntityKind, StoreError};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions};
use sqlx::query::Query as SqlxQuery;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

/// Entity store backed by one SQLite table of JSON documents.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .connect(&db_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database. Single connection, since every SQLite
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                created_date TEXT NOT NULL,
                body TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create records table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_kind_created ON records(kind, created_date)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create records kind index")?;

        Ok(())
    }

    async fn fetch_body(&self, kind: EntityKind, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT body FROM records WHERE kind = ? AND id = ?")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(|r| parse_body(kind, &r)).transpose()
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn parse_body(kind: EntityKind, row: &sqlx::sqlite::SqliteRow) -> Result<Value, StoreError> {
    let body: String = row.try_get("body").map_err(backend)?;
    serde_json::from_str(&body).map_err(|source| StoreError::Decode { kind, source })
}

/// SQL expression for a (validated) top-level field.
fn field_expr(field: &str) -> String {
    if field == "created_date" {
        // Indexed column holding the same normalised timestamp as the body.
        "created_date".to_string()
    } else {
        format!("json_extract(body, '$.{}')", field)
    }
}

fn bind_json<'q>(
    q: SqlxQuery<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> SqlxQuery<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Bool(b) => q.bind(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => q.bind(i),
            None => q.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => q.bind(s.clone()),
        other => q.bind(other.to_string()),
    }
}

fn build_select(query: &Query) -> String {
    let mut sql = String::from("SELECT body FROM records WHERE kind = ?");
    for cond in &query.conditions {
        match cond {
            Condition::Eq { field, value } if value.is_null() => {
                sql.push_str(&format!(" AND {} IS NULL", field_expr(field)));
            }
            Condition::Eq { field, .. } => {
                sql.push_str(&format!(" AND {} = ?", field_expr(field)));
            }
            Condition::Gte { field, .. } => {
                sql.push_str(&format!(" AND {} >= ?", field_expr(field)));
            }
        }
    }
    match &query.sort {
        Some(sort) => {
            let dir = if sort.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(" ORDER BY {} {}, rowid ASC", field_expr(&sort.field), dir));
        }
        None => sql.push_str(" ORDER BY rowid ASC"),
    }
    if query.limit.is_some() {
        sql.push_str(" LIMIT ?");
    }
    sql
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query("SELECT body FROM records WHERE kind = ? ORDER BY rowid ASC")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(|r| parse_body(kind, r)).collect()
    }

    async fn filter(&self, kind: EntityKind, query: &Query) -> Result<Vec<Value>, StoreError> {
        query.validate()?;
        let sql = build_select(query);
        tracing::debug!("SqliteStore filter {}: {}", kind, sql);

        let mut q = sqlx::query(&sql).bind(kind.as_str());
        for cond in &query.conditions {
            match cond {
                Condition::Eq { value, .. } if value.is_null() => {}
                Condition::Eq { value, .. } | Condition::Gte { value, .. } => {
                    q = bind_json(q, value);
                }
            }
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit as i64);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(backend)?;
        rows.iter().map(|r| parse_body(kind, r)).collect()
    }

    async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, StoreError> {
        let record = stamp_new_record(kind, data, Utc::now())?;
        let id = record_id(&record).unwrap_or_default().to_string();
        let created = record["created_date"].as_str().unwrap_or_default().to_string();

        sqlx::query("INSERT INTO records (id, kind, created_date, body) VALUES (?, ?, ?, ?)")
            .bind(id.as_str())
            .bind(kind.as_str())
            .bind(created.as_str())
            .bind(record.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(record)
    }

    async fn update(&self, kind: EntityKind, id: &str, patch: Value) -> Result<Value, StoreError> {
        let mut record = self
            .fetch_body(kind, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        merge_patch(kind, &mut record, patch)?;

        sqlx::query("UPDATE records SET body = ? WHERE kind = ? AND id = ?")
            .bind(record.to_string())
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(record)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE kind = ? AND id = ?")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
