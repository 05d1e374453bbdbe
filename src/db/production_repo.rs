// src/db/production_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    lot_code, lot_prefix, run_out_waste_error, InventoryRepository, ProductionStore,
    RequestFilter, WasteFilter,
};
use crate::{
    common::error::AppError,
    models::production::{
        BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, ProductionBatch,
        ProductionRequest, RecordWasteRequest, RequestStatus, WasteEvent,
    },
};

#[derive(Clone)]
pub struct ProductionRepository {
    pool: PgPool,
}

impl ProductionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductionStore for ProductionRepository {
    // ---
    // Pedidos de produção
    // ---

    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<ProductionRequest>, AppError> {
        let requests = sqlx::query_as::<_, ProductionRequest>(
            r#"
            SELECT * FROM production_requests
            WHERE ($1::request_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR location_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn overdue_requests(&self, now: DateTime<Utc>) -> Result<Vec<ProductionRequest>, AppError> {
        let requests = sqlx::query_as::<_, ProductionRequest>(
            r#"
            SELECT * FROM production_requests
            WHERE status IN ('OPEN', 'IN_PROGRESS') AND needed_by < $1
            ORDER BY needed_by ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<ProductionRequest>, AppError> {
        let request = sqlx::query_as::<_, ProductionRequest>(
            "SELECT * FROM production_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn create_request(
        &self,
        requested_by: Uuid,
        payload: &CreateProductionRequestRequest,
    ) -> Result<ProductionRequest, AppError> {
        let request = sqlx::query_as::<_, ProductionRequest>(
            r#"
            INSERT INTO production_requests
                (product_item_id, location_id, requested_by, needed_by,
                 target_quantity, unit, priority, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(payload.product_item_id)
        .bind(payload.location_id)
        .bind(requested_by)
        .bind(payload.needed_by)
        .bind(payload.target_quantity)
        .bind(&payload.unit)
        .bind(payload.priority)
        .bind(&payload.reason)
        .bind(RequestStatus::Open)
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    async fn transition_request(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        notes: Option<String>,
    ) -> Result<Option<ProductionRequest>, AppError> {
        let request = sqlx::query_as::<_, ProductionRequest>(
            r#"
            UPDATE production_requests
            SET status = $3, notes = COALESCE($4, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn delete_open_request(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM production_requests WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(RequestStatus::Open)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Lotes
    // ---

    async fn list_batches(&self, status: Option<BatchStatus>) -> Result<Vec<ProductionBatch>, AppError> {
        let batches = sqlx::query_as::<_, ProductionBatch>(
            r#"
            SELECT * FROM production_batches
            WHERE ($1::batch_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(batches)
    }

    async fn find_batch(&self, id: Uuid) -> Result<Option<ProductionBatch>, AppError> {
        let batch = sqlx::query_as::<_, ProductionBatch>(
            "SELECT * FROM production_batches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(batch)
    }

    async fn create_batch(
        &self,
        made_by: Uuid,
        payload: &CreateBatchRequest,
        now: DateTime<Utc>,
    ) -> Result<ProductionBatch, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serializa a geração do lot code do dia
        sqlx::query("LOCK TABLE production_batches IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM production_batches WHERE lot_code LIKE $1 || '%'",
        )
        .bind(lot_prefix(now))
        .fetch_one(&mut *tx)
        .await?;

        let batch = sqlx::query_as::<_, ProductionBatch>(
            r#"
            INSERT INTO production_batches
                (product_item_id, quantity_made, unit, storage_location_id, made_by,
                 started_at, lot_code, notes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $6, $6)
            RETURNING *
            "#,
        )
        .bind(payload.product_item_id)
        .bind(payload.quantity_made)
        .bind(&payload.unit)
        .bind(payload.storage_location_id)
        .bind(made_by)
        .bind(now)
        .bind(lot_code(now, existing))
        .bind(&payload.notes)
        .bind(BatchStatus::InProgress)
        .fetch_one(&mut *tx)
        .await?;

        InventoryRepository::adjust_stock(
            &mut *tx,
            batch.product_item_id,
            batch.storage_location_id,
            batch.quantity_made,
        )
        .await?;

        tx.commit().await?;
        Ok(batch)
    }

    async fn complete_batch(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ProductionBatch>, AppError> {
        let batch = sqlx::query_as::<_, ProductionBatch>(
            r#"
            UPDATE production_batches
            SET status = $3, finished_at = $4, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(BatchStatus::InProgress)
        .bind(BatchStatus::Completed)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(batch)
    }

    async fn run_out_batch(&self, id: Uuid) -> Result<Option<ProductionBatch>, AppError> {
        let mut tx = self.pool.begin().await?;

        let batch = sqlx::query_as::<_, ProductionBatch>(
            r#"
            UPDATE production_batches
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(BatchStatus::Completed)
        .bind(BatchStatus::RunOut)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(batch) = batch else {
            return Ok(None);
        };

        InventoryRepository::adjust_stock(
            &mut *tx,
            batch.product_item_id,
            batch.storage_location_id,
            -batch.quantity_made,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(batch))
    }

    // ---
    // Desperdício
    // ---

    async fn list_waste(&self, filter: WasteFilter) -> Result<Vec<WasteEvent>, AppError> {
        let events = sqlx::query_as::<_, WasteEvent>(
            r#"
            SELECT * FROM waste_events
            WHERE ($1::uuid IS NULL OR batch_id = $1)
              AND ($2::uuid IS NULL OR item_id = $2)
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(filter.batch_id)
        .bind(filter.item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn record_waste(
        &self,
        recorded_by: Uuid,
        payload: &RecordWasteRequest,
    ) -> Result<WasteEvent, AppError> {
        let mut tx = self.pool.begin().await?;

        let batch = match payload.batch_id {
            Some(batch_id) => {
                let batch = sqlx::query_as::<_, ProductionBatch>(
                    "SELECT * FROM production_batches WHERE id = $1 FOR UPDATE",
                )
                .bind(batch_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(AppError::NotFound("Production batch"))?;
                if batch.status == BatchStatus::RunOut {
                    return Err(run_out_waste_error());
                }
                Some(batch)
            }
            None => None,
        };

        let event = sqlx::query_as::<_, WasteEvent>(
            r#"
            INSERT INTO waste_events
                (batch_id, item_id, quantity, unit, reason, recorded_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(payload.batch_id)
        .bind(payload.item_id)
        .bind(payload.quantity)
        .bind(&payload.unit)
        .bind(payload.reason)
        .bind(recorded_by)
        .bind(&payload.notes)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(batch) = batch {
            InventoryRepository::adjust_stock(
                &mut *tx,
                event.item_id,
                batch.storage_location_id,
                -event.quantity,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(event)
    }
}
