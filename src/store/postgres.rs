use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};

use crate::model::{generate_id, AssetUpload, ContentRecord, Identifier};
use crate::store::traits::{AssetStore, RecordConflict, RecordStore, ReservationStore};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS content_records (
        category TEXT NOT NULL,
        id BIGINT NOT NULL,
        content JSONB NOT NULL,
        created_by TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (category, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        category TEXT NOT NULL,
        id BIGINT NOT NULL,
        reserved_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (category, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assets (
        url TEXT PRIMARY KEY,
        folder TEXT NOT NULL,
        file_name TEXT NOT NULL,
        content_type TEXT NOT NULL,
        data BYTEA NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS assets_folder_idx ON assets (folder)",
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    public_base_url: String,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32, public_base_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self {
            pool,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create the tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run database migrations")?;
        }
        log::info!("Database schema is up to date");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReservationStore for PostgresStore {
    async fn reserve_next_id(&self, category: &str) -> Result<Identifier> {
        // Optimistic max+1; a concurrent reservation surfaces as a primary key violation
        let row = sqlx::query(
            r#"
            INSERT INTO reservations (category, id, reserved_at)
            SELECT $1, COALESCE(MAX(ids.id), 0) + 1, NOW()
            FROM (
                SELECT id FROM content_records WHERE category = $1
                UNION ALL
                SELECT id FROM reservations WHERE category = $1
            ) AS ids
            RETURNING id
            "#,
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to reserve identifier for category '{}'", category))?;

        Ok(row.get("id"))
    }

    async fn release_reserved_id(&self, category: &str, id: Identifier) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE category = $1 AND id = $2")
            .bind(category)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to release reservation")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl RecordStore for PostgresStore {
    async fn create_with_reserved_id(
        &self,
        category: &str,
        id: Identifier,
        content: serde_json::Value,
        created_by: &str,
    ) -> Result<ContentRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        let row = sqlx::query(
            r#"
            INSERT INTO content_records (category, id, content, created_by, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (category, id) DO NOTHING
            RETURNING created_at
            "#,
        )
        .bind(category)
        .bind(id)
        .bind(Json(&content))
        .bind(created_by)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to insert content record")?;

        let Some(row) = row else {
            tx.rollback().await.context("Failed to roll back transaction")?;
            return Err(RecordConflict {
                category: category.to_string(),
                id,
            }
            .into());
        };
        let created_at: DateTime<Utc> = row.get("created_at");

        sqlx::query("DELETE FROM reservations WHERE category = $1 AND id = $2")
            .bind(category)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to retire reservation")?;

        tx.commit().await.context("Failed to commit content record")?;

        Ok(ContentRecord {
            category: category.to_string(),
            id,
            content,
            created_by: created_by.to_string(),
            created_at,
        })
    }

    async fn get_record(&self, category: &str, id: Identifier) -> Result<Option<ContentRecord>> {
        let row = sqlx::query(
            "SELECT category, id, content, created_by, created_at FROM content_records WHERE category = $1 AND id = $2",
        )
        .bind(category)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch content record")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let content: Json<serde_json::Value> = row.get("content");
        Ok(Some(ContentRecord {
            category: row.get("category"),
            id: row.get("id"),
            content: content.0,
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
        }))
    }
}

#[async_trait::async_trait]
impl AssetStore for PostgresStore {
    async fn upload_asset(&self, upload: AssetUpload, folder: &str) -> Result<String> {
        let folder = folder.trim_matches('/');
        let file_name = upload.sanitized_file_name();
        let url = format!(
            "{}/{}/{}-{}",
            self.public_base_url,
            folder,
            generate_id(),
            file_name
        );

        sqlx::query(
            r#"
            INSERT INTO assets (url, folder, file_name, content_type, data, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(&url)
        .bind(folder)
        .bind(&file_name)
        .bind(&upload.content_type)
        .bind(&upload.bytes)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to store asset '{}'", file_name))?;

        Ok(url)
    }

    async fn delete_asset(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE url = $1")
            .bind(url)
            .execute(&self.pool)
            .await
            .context("Failed to delete asset")?;

        Ok(result.rows_affected() > 0)
    }
}
