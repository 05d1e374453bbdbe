// src/services/production_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryStore, LocationStore, ProductionStore, RequestFilter, WasteFilter},
    models::production::{
        BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, ProductionBatch,
        ProductionRequest, RecordWasteRequest, RequestStatus, WasteEvent,
    },
};

#[derive(Clone)]
pub struct ProductionService {
    production_repo: Arc<dyn ProductionStore>,
    inventory_repo: Arc<dyn InventoryStore>,
    location_repo: Arc<dyn LocationStore>,
}

impl ProductionService {
    pub fn new(
        production_repo: Arc<dyn ProductionStore>,
        inventory_repo: Arc<dyn InventoryStore>,
        location_repo: Arc<dyn LocationStore>,
    ) -> Self {
        Self { production_repo, inventory_repo, location_repo }
    }

    async fn require_item(&self, id: Uuid) -> Result<(), AppError> {
        self.inventory_repo
            .find_item(id)
            .await?
            .map(|_| ())
            .ok_or(AppError::NotFound("Inventory item"))
    }

    // --- PEDIDOS ---

    pub async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<ProductionRequest>, AppError> {
        self.production_repo.list_requests(filter).await
    }

    pub async fn overdue_requests(&self) -> Result<Vec<ProductionRequest>, AppError> {
        self.production_repo.overdue_requests(Utc::now()).await
    }

    pub async fn get_request(&self, id: Uuid) -> Result<ProductionRequest, AppError> {
        self.production_repo
            .find_request(id)
            .await?
            .ok_or(AppError::NotFound("Production request"))
    }

    pub async fn create_request(
        &self,
        requested_by: Uuid,
        payload: &CreateProductionRequestRequest,
    ) -> Result<ProductionRequest, AppError> {
        self.require_item(payload.product_item_id).await?;
        self.location_repo
            .find_by_id(payload.location_id)
            .await?
            .ok_or(AppError::NotFound("Location"))?;

        let request = self.production_repo.create_request(requested_by, payload).await?;
        tracing::info!(request_id = %request.id, priority = %request.priority, "pedido de produção criado");
        Ok(request)
    }

    /// Aplica a transição se for permitida a partir do status atual.
    pub async fn transition_request(
        &self,
        id: Uuid,
        to: RequestStatus,
        notes: Option<String>,
    ) -> Result<ProductionRequest, AppError> {
        let current = self.get_request(id).await?;
        if !current.status.can_transition_to(to) {
            return Err(AppError::InvalidTransition {
                from: current.status.to_string(),
                to: to.to_string(),
            });
        }

        // Compare-and-set: se outro pedido mudou o status no meio, é conflito
        let updated = self
            .production_repo
            .transition_request(id, current.status, to, notes)
            .await?
            .ok_or_else(|| AppError::Conflict("Production request was modified concurrently".into()))?;

        tracing::info!(request_id = %id, from = %current.status, to = %to, "pedido de produção atualizado");
        Ok(updated)
    }

    pub async fn delete_request(&self, id: Uuid) -> Result<(), AppError> {
        if self.production_repo.delete_open_request(id).await? {
            return Ok(());
        }
        // Distingue "não existe" de "não está OPEN"
        self.get_request(id).await?;
        Err(AppError::Conflict("Only open requests can be deleted".into()))
    }

    // --- LOTES ---

    pub async fn list_batches(&self, status: Option<BatchStatus>) -> Result<Vec<ProductionBatch>, AppError> {
        self.production_repo.list_batches(status).await
    }

    pub async fn get_batch(&self, id: Uuid) -> Result<ProductionBatch, AppError> {
        self.production_repo
            .find_batch(id)
            .await?
            .ok_or(AppError::NotFound("Production batch"))
    }

    pub async fn create_batch(
        &self,
        made_by: Uuid,
        payload: &CreateBatchRequest,
    ) -> Result<ProductionBatch, AppError> {
        self.require_item(payload.product_item_id).await?;
        let location = self
            .location_repo
            .find_by_id(payload.storage_location_id)
            .await?
            .ok_or(AppError::NotFound("Location"))?;
        if !location.location_type.holds_batches() {
            return Err(AppError::BadRequest(format!(
                "Batches must be stored in a freezer or storage location, not {}",
                location.location_type
            )));
        }

        let batch = self.production_repo.create_batch(made_by, payload, Utc::now()).await?;
        tracing::info!(batch_id = %batch.id, lot_code = %batch.lot_code, "lote criado");
        Ok(batch)
    }

    pub async fn complete_batch(&self, id: Uuid) -> Result<ProductionBatch, AppError> {
        match self.production_repo.complete_batch(id, Utc::now()).await? {
            Some(batch) => Ok(batch),
            None => {
                let batch = self.get_batch(id).await?;
                Err(AppError::InvalidTransition {
                    from: batch.status.to_string(),
                    to: BatchStatus::Completed.to_string(),
                })
            }
        }
    }

    pub async fn run_out_batch(&self, id: Uuid) -> Result<ProductionBatch, AppError> {
        match self.production_repo.run_out_batch(id).await? {
            Some(batch) => {
                tracing::info!(batch_id = %batch.id, lot_code = %batch.lot_code, "lote esgotado");
                Ok(batch)
            }
            None => {
                let batch = self.get_batch(id).await?;
                Err(AppError::InvalidTransition {
                    from: batch.status.to_string(),
                    to: BatchStatus::RunOut.to_string(),
                })
            }
        }
    }

    // --- DESPERDÍCIO ---

    pub async fn list_waste(&self, filter: WasteFilter) -> Result<Vec<WasteEvent>, AppError> {
        self.production_repo.list_waste(filter).await
    }

    pub async fn record_waste(
        &self,
        recorded_by: Uuid,
        payload: &RecordWasteRequest,
    ) -> Result<WasteEvent, AppError> {
        self.require_item(payload.item_id).await?;
        let event = self.production_repo.record_waste(recorded_by, payload).await?;
        tracing::info!(
            waste_id = %event.id,
            reason = %event.reason,
            quantity = %event.quantity,
            "desperdício registrado"
        );
        Ok(event)
    }
}
