// src/services/inventory_service.rs

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryStore, ItemFilter, LocationStore},
    models::{
        inventory::{
            AddSessionLineRequest, CurrentStock, InventoryItem, InventoryItemRequest,
            InventorySession, InventorySessionLine,
        },
        location::Location,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: Arc<dyn InventoryStore>,
    location_repo: Arc<dyn LocationStore>,
}

impl InventoryService {
    pub fn new(inventory_repo: Arc<dyn InventoryStore>, location_repo: Arc<dyn LocationStore>) -> Self {
        Self { inventory_repo, location_repo }
    }

    async fn require_location(&self, id: Uuid) -> Result<Location, AppError> {
        self.location_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Location"))
    }

    // --- ITENS ---

    pub async fn list_items(&self, filter: ItemFilter) -> Result<Vec<InventoryItem>, AppError> {
        self.inventory_repo.list_items(filter).await
    }

    pub async fn get_item(&self, id: Uuid) -> Result<InventoryItem, AppError> {
        self.inventory_repo
            .find_item(id)
            .await?
            .ok_or(AppError::NotFound("Inventory item"))
    }

    pub async fn create_item(&self, payload: &InventoryItemRequest) -> Result<InventoryItem, AppError> {
        if let Some(location_id) = payload.default_location_id {
            self.require_location(location_id).await?;
        }
        let item = self.inventory_repo.create_item(payload).await?;
        tracing::info!(item_id = %item.id, name = %item.name, "item criado");
        Ok(item)
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        payload: &InventoryItemRequest,
    ) -> Result<InventoryItem, AppError> {
        if let Some(location_id) = payload.default_location_id {
            self.require_location(location_id).await?;
        }
        self.inventory_repo
            .update_item(id, payload)
            .await?
            .ok_or(AppError::NotFound("Inventory item"))
    }

    pub async fn delete_item(&self, id: Uuid) -> Result<(), AppError> {
        if !self.inventory_repo.deactivate_item(id).await? {
            return Err(AppError::NotFound("Inventory item"));
        }
        tracing::info!(item_id = %id, "item desativado");
        Ok(())
    }

    // --- SALDO ATUAL ---

    /// Saldo com `item` e `location` embutidos.
    pub async fn current_stock(
        &self,
        location_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<CurrentStock>, AppError> {
        let stock = self.inventory_repo.list_stock(location_id, item_id).await?;
        let items: HashMap<Uuid, InventoryItem> = self
            .inventory_repo
            .list_items(ItemFilter::default())
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();
        let locations: HashMap<Uuid, Location> = self
            .location_repo
            .list(None)
            .await?
            .into_iter()
            .map(|location| (location.id, location))
            .collect();

        Ok(stock
            .into_iter()
            .map(|mut entry| {
                entry.item = items.get(&entry.item_id).cloned();
                entry.location = locations.get(&entry.location_id).cloned();
                entry
            })
            .collect())
    }

    pub async fn below_par(&self, location_id: Option<Uuid>) -> Result<Vec<CurrentStock>, AppError> {
        Ok(self
            .current_stock(location_id, None)
            .await?
            .into_iter()
            .filter(CurrentStock::is_below_par)
            .collect())
    }

    // --- SESSÕES DE CONTAGEM ---

    pub async fn list_sessions(&self, location_id: Option<Uuid>) -> Result<Vec<InventorySession>, AppError> {
        self.inventory_repo.list_sessions(location_id).await
    }

    pub async fn get_session(&self, id: Uuid) -> Result<InventorySession, AppError> {
        self.inventory_repo
            .find_session(id)
            .await?
            .ok_or(AppError::NotFound("Inventory session"))
    }

    pub async fn start_session(&self, location_id: Uuid, started_by: Uuid) -> Result<InventorySession, AppError> {
        self.require_location(location_id).await?;
        let session = self.inventory_repo.create_session(location_id, started_by).await?;
        tracing::info!(session_id = %session.id, location_id = %location_id, "sessão de contagem iniciada");
        Ok(session)
    }

    pub async fn add_line(
        &self,
        session_id: Uuid,
        line: AddSessionLineRequest,
    ) -> Result<InventorySessionLine, AppError> {
        let mut created = self.add_lines(session_id, vec![line]).await?;
        created
            .pop()
            .ok_or_else(|| anyhow::anyhow!("linha não retornada pelo store").into())
    }

    pub async fn add_lines(
        &self,
        session_id: Uuid,
        lines: Vec<AddSessionLineRequest>,
    ) -> Result<Vec<InventorySessionLine>, AppError> {
        if lines.is_empty() {
            return Err(AppError::BadRequest("At least one line is required".into()));
        }
        for line in &lines {
            self.get_item(line.item_id).await?;
        }
        self.inventory_repo.add_lines(session_id, &lines).await
    }

    pub async fn close_session(
        &self,
        session_id: Uuid,
        closed_by: Uuid,
        notes: Option<String>,
    ) -> Result<InventorySession, AppError> {
        let session = self.inventory_repo.close_session(session_id, closed_by, notes).await?;
        tracing::info!(
            session_id = %session.id,
            lines = session.lines.len(),
            "sessão de contagem fechada"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{
            inventory::InventoryCategory,
            location::{CreateLocationRequest, LocationType},
        },
    };
    use rust_decimal_macros::dec;

    async fn setup() -> (InventoryService, Location) {
        let store = Arc::new(MemoryStore::default());
        let location = LocationStore::create(
            store.as_ref(),
            &CreateLocationRequest {
                name: "Main Shop".into(),
                location_type: LocationType::Shop,
                parent_id: None,
            },
        )
        .await
        .unwrap();
        (InventoryService::new(store.clone(), store), location)
    }

    fn item(name: &str, par: rust_decimal::Decimal) -> InventoryItemRequest {
        InventoryItemRequest {
            name: name.into(),
            category: InventoryCategory::Base,
            unit: "gallons".into(),
            par_stock_level: par,
            default_location_id: None,
            sku: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn deleted_items_drop_out_of_the_default_listing() {
        let (service, _) = setup().await;
        let vanilla = service.create_item(&item("Vanilla Base", dec!(10))).await.unwrap();
        service.create_item(&item("Chocolate Base", dec!(8))).await.unwrap();

        service.delete_item(vanilla.id).await.unwrap();
        let active = service
            .list_items(ItemFilter { active: Some(true), location_id: None })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Chocolate Base");

        // soft delete: o item continua acessível
        assert!(!service.get_item(vanilla.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn closing_embeds_item_and_location_in_stock() {
        let (service, shop) = setup().await;
        let vanilla = service.create_item(&item("Vanilla Base", dec!(10))).await.unwrap();
        let chips = service.create_item(&item("Chocolate Chips", dec!(5))).await.unwrap();
        let user = Uuid::new_v4();

        let session = service.start_session(shop.id, user).await.unwrap();
        let line = |item_id, count| AddSessionLineRequest {
            item_id,
            count,
            unit: "gallons".into(),
            note: None,
            photo_url: None,
        };
        service
            .add_lines(session.id, vec![line(vanilla.id, dec!(4)), line(chips.id, dec!(6))])
            .await
            .unwrap();
        service.close_session(session.id, user, None).await.unwrap();

        let stock = service.current_stock(Some(shop.id), None).await.unwrap();
        assert_eq!(stock.len(), 2);
        assert!(stock.iter().all(|s| s.item.is_some() && s.location.is_some()));

        let low = service.below_par(None).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].item_id, vanilla.id);
    }

    #[tokio::test]
    async fn sessions_need_an_existing_location() {
        let (service, _) = setup().await;
        let err = service.start_session(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Location")));
    }
}
