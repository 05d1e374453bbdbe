// src/db/snapshot_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::SnapshotStore;
use crate::{
    common::error::AppError,
    models::inventory::{InventorySnapshot, RecordSnapshotRequest},
};

#[derive(Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SnapshotRepository {
    async fn record(
        &self,
        recorded_by: Uuid,
        entries: &[RecordSnapshotRequest],
        now: DateTime<Utc>,
    ) -> Result<Vec<InventorySnapshot>, AppError> {
        // Tudo ou nada
        let mut tx = self.pool.begin().await?;

        let mut recorded = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, InventorySnapshot>(
                r#"
                INSERT INTO inventory_snapshots (item_id, quantity, recorded_by, recorded_at)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(entry.item_id)
            .bind(entry.quantity)
            .bind(recorded_by)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            recorded.push(row);
        }

        tx.commit().await?;
        Ok(recorded)
    }

    async fn list(&self, item_id: Option<Uuid>) -> Result<Vec<InventorySnapshot>, AppError> {
        let snapshots = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT * FROM inventory_snapshots
            WHERE ($1::uuid IS NULL OR item_id = $1)
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(snapshots)
    }

    async fn latest_per_item(&self) -> Result<Vec<InventorySnapshot>, AppError> {
        let snapshots = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT DISTINCT ON (item_id) *
            FROM inventory_snapshots
            ORDER BY item_id, recorded_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(snapshots)
    }

    async fn recorded_minutes(&self) -> Result<Vec<DateTime<Utc>>, AppError> {
        let minutes = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT DISTINCT date_trunc('minute', recorded_at) AS minute
            FROM inventory_snapshots
            ORDER BY minute DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(minutes)
    }

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InventorySnapshot>, AppError> {
        let snapshots = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT * FROM inventory_snapshots
            WHERE recorded_at >= $1 AND recorded_at < $2
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(snapshots)
    }
}
