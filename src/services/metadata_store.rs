//! Metadata-store collaborator contract and its SQLite implementation.
//!
//! The store assigns identity and creation time on insert and supports one
//! read: every record, newest first.

use crate::models::media_asset::{MediaAsset, NewMediaAsset};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Schema applied by `--migrate` and by test fixtures.
const MIGRATION_SQL: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type MetadataResult<T> = Result<T, MetadataError>;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist a record, assigning its id and `created_at`.
    async fn insert(&self, asset: NewMediaAsset) -> MetadataResult<MediaAsset>;

    /// All records ordered by `created_at` descending. Records with equal
    /// timestamps come back in whatever order the backend yields them.
    async fn scan_all_ordered_by_created_desc(&self) -> MetadataResult<Vec<MediaAsset>>;
}

/// Source of insert timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// `MetadataStore` backed by a shared SQLite pool.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,
    clock: Clock,
}

impl SqliteMetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self::with_clock(db, Arc::new(Utc::now))
    }

    pub fn with_clock(db: Arc<SqlitePool>, clock: Clock) -> Self {
        Self { db, clock }
    }

    /// Apply the embedded schema. Safe to run repeatedly.
    pub async fn migrate(&self) -> MetadataResult<()> {
        let statements = MIGRATION_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        info!("Running {} migration statements...", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Lightweight connectivity check (`SELECT 1`).
    pub async fn ping(&self) -> MetadataResult<()> {
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&*self.db)
            .await?
        {
            1 => Ok(()),
            other => Err(MetadataError::Unavailable(format!(
                "unexpected result: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn insert(&self, asset: NewMediaAsset) -> MetadataResult<MediaAsset> {
        let record = sqlx::query_as::<_, MediaAsset>(
            r#"
            INSERT INTO media_assets (
                id, title, description, storage_url, storage_object_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, title, description, storage_url, storage_object_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(asset.title)
        .bind(asset.description)
        .bind(asset.storage_url)
        .bind(asset.storage_object_id)
        .bind((self.clock)())
        .fetch_one(&*self.db)
        .await?;

        debug!(id = %record.id, "inserted media asset");
        Ok(record)
    }

    async fn scan_all_ordered_by_created_desc(&self) -> MetadataResult<Vec<MediaAsset>> {
        let rows = sqlx::query_as::<_, MediaAsset>(
            "SELECT id, title, description, storage_url, storage_object_id, created_at
             FROM media_assets
             ORDER BY created_at DESC",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }
}
