// src/services/snapshot_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{truncate_to_minute, InventoryStore, ItemFilter, SnapshotStore},
    models::inventory::{InventoryItem, InventorySnapshot, RecordSnapshotRequest},
};

#[derive(Clone)]
pub struct SnapshotService {
    snapshot_repo: Arc<dyn SnapshotStore>,
    inventory_repo: Arc<dyn InventoryStore>,
}

impl SnapshotService {
    pub fn new(snapshot_repo: Arc<dyn SnapshotStore>, inventory_repo: Arc<dyn InventoryStore>) -> Self {
        Self { snapshot_repo, inventory_repo }
    }

    // Embute o item em cada snapshot
    async fn with_items(&self, snapshots: Vec<InventorySnapshot>) -> Result<Vec<InventorySnapshot>, AppError> {
        let items: HashMap<Uuid, InventoryItem> = self
            .inventory_repo
            .list_items(ItemFilter::default())
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        Ok(snapshots
            .into_iter()
            .map(|mut snapshot| {
                snapshot.item = items.get(&snapshot.item_id).cloned();
                snapshot
            })
            .collect())
    }

    pub async fn record(
        &self,
        recorded_by: Uuid,
        entry: RecordSnapshotRequest,
    ) -> Result<InventorySnapshot, AppError> {
        let mut recorded = self.record_batch(recorded_by, vec![entry]).await?;
        recorded
            .pop()
            .ok_or_else(|| anyhow::anyhow!("snapshot não retornado pelo store").into())
    }

    /// Todas as entradas ficam com o mesmo horário (mesma "sessão").
    pub async fn record_batch(
        &self,
        recorded_by: Uuid,
        entries: Vec<RecordSnapshotRequest>,
    ) -> Result<Vec<InventorySnapshot>, AppError> {
        if entries.is_empty() {
            return Err(AppError::BadRequest("At least one snapshot is required".into()));
        }
        for entry in &entries {
            self.inventory_repo
                .find_item(entry.item_id)
                .await?
                .ok_or(AppError::NotFound("Inventory item"))?;
        }

        let recorded = self.snapshot_repo.record(recorded_by, &entries, Utc::now()).await?;
        tracing::info!(count = recorded.len(), user_id = %recorded_by, "snapshots gravados");
        self.with_items(recorded).await
    }

    pub async fn list(&self, item_id: Option<Uuid>) -> Result<Vec<InventorySnapshot>, AppError> {
        let snapshots = self.snapshot_repo.list(item_id).await?;
        self.with_items(snapshots).await
    }

    /// Histórico de um item, mais recente primeiro.
    pub async fn history(&self, item_id: Uuid) -> Result<Vec<InventorySnapshot>, AppError> {
        self.inventory_repo
            .find_item(item_id)
            .await?
            .ok_or(AppError::NotFound("Inventory item"))?;
        self.list(Some(item_id)).await
    }

    pub async fn current(&self) -> Result<Vec<InventorySnapshot>, AppError> {
        let snapshots = self.snapshot_repo.latest_per_item().await?;
        self.with_items(snapshots).await
    }

    pub async fn recorded_minutes(&self) -> Result<Vec<DateTime<Utc>>, AppError> {
        self.snapshot_repo.recorded_minutes().await
    }

    /// Snapshots gravados no mesmo minuto de `recorded_at`.
    pub async fn in_minute(&self, recorded_at: DateTime<Utc>) -> Result<Vec<InventorySnapshot>, AppError> {
        let from = truncate_to_minute(recorded_at);
        let snapshots = self
            .snapshot_repo
            .list_between(from, from + Duration::minutes(1))
            .await?;
        self.with_items(snapshots).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, models::inventory::{InventoryCategory, InventoryItemRequest}};
    use rust_decimal_macros::dec;

    async fn setup() -> (SnapshotService, InventoryItem) {
        let store = Arc::new(MemoryStore::default());
        let item = store
            .create_item(&InventoryItemRequest {
                name: "Whipping Cream".into(),
                category: InventoryCategory::Base,
                unit: "gallons".into(),
                par_stock_level: dec!(6),
                default_location_id: None,
                sku: None,
                notes: None,
            })
            .await
            .unwrap();
        (SnapshotService::new(store.clone(), store), item)
    }

    #[tokio::test]
    async fn recorded_snapshots_embed_the_item() {
        let (service, cream) = setup().await;
        let user = Uuid::new_v4();

        let snapshot = service
            .record(user, RecordSnapshotRequest { item_id: cream.id, quantity: dec!(4.5) })
            .await
            .unwrap();
        assert_eq!(snapshot.recorded_by, user);
        assert_eq!(snapshot.item.as_ref().map(|i| i.name.as_str()), Some("Whipping Cream"));

        let same_minute = service.in_minute(snapshot.recorded_at).await.unwrap();
        assert_eq!(same_minute.len(), 1);
        assert_eq!(service.recorded_minutes().await.unwrap(), vec![truncate_to_minute(snapshot.recorded_at)]);
    }

    #[tokio::test]
    async fn unknown_items_and_empty_batches_are_rejected() {
        let (service, cream) = setup().await;
        let user = Uuid::new_v4();

        let err = service.record_batch(user, vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // Um item inexistente invalida o lote inteiro
        let batch = vec![
            RecordSnapshotRequest { item_id: cream.id, quantity: dec!(2) },
            RecordSnapshotRequest { item_id: Uuid::new_v4(), quantity: dec!(1) },
        ];
        let err = service.record_batch(user, batch).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Inventory item")));
        assert!(service.list(None).await.unwrap().is_empty());

        let err = service.history(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
