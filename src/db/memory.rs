// src/db/memory.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    closed_session_error, counts_by_item, duplicate_sku_error, lot_code, lot_prefix, run_out_waste_error,
    truncate_to_minute, InventoryStore, ItemFilter, LocationStore, ProductionStore, RequestFilter,
    SnapshotStore, UserStore, WasteFilter,
};
use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, Role, User},
        inventory::{
            AddSessionLineRequest, CurrentStock, InventoryItem, InventoryItemRequest,
            InventorySession, InventorySessionLine, InventorySnapshot, RecordSnapshotRequest,
            SessionStatus,
        },
        location::{CreateLocationRequest, Location, LocationType},
        production::{
            BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, ProductionBatch,
            ProductionRequest, RecordWasteRequest, RequestStatus, WasteEvent,
        },
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    locations: Vec<Location>,
    items: Vec<InventoryItem>,
    stock: Vec<CurrentStock>,
    sessions: Vec<InventorySession>,
    lines: Vec<InventorySessionLine>,
    requests: Vec<ProductionRequest>,
    batches: Vec<ProductionBatch>,
    waste: Vec<WasteEvent>,
    snapshots: Vec<InventorySnapshot>,
}

impl Tables {
    // Mesmo comportamento do upsert do Postgres: cria a linha com 0 se faltar
    fn adjust_stock(&mut self, item_id: Uuid, location_id: Uuid, delta: Decimal, now: DateTime<Utc>) {
        self.set_stock_with(item_id, location_id, now, |quantity| quantity + delta);
    }

    fn set_stock(&mut self, item_id: Uuid, location_id: Uuid, quantity: Decimal, now: DateTime<Utc>) {
        self.set_stock_with(item_id, location_id, now, |_| quantity);
    }

    fn set_stock_with(
        &mut self,
        item_id: Uuid,
        location_id: Uuid,
        now: DateTime<Utc>,
        update: impl FnOnce(Decimal) -> Decimal,
    ) {
        match self
            .stock
            .iter_mut()
            .find(|s| s.item_id == item_id && s.location_id == location_id)
        {
            Some(entry) => {
                entry.quantity = update(entry.quantity);
                entry.last_updated = now;
            }
            None => self.stock.push(CurrentStock {
                id: Uuid::new_v4(),
                item_id,
                location_id,
                quantity: update(Decimal::ZERO),
                last_updated: now,
                item: None,
                location: None,
            }),
        }
    }

    // SKU é único entre os itens (ignorando o próprio item numa edição)
    fn sku_taken(&self, sku: Option<&str>, except: Option<Uuid>) -> bool {
        sku.is_some_and(|sku| {
            self.items
                .iter()
                .any(|i| i.sku.as_deref() == Some(sku) && Some(i.id) != except)
        })
    }

    fn session_lines(&self, session_id: Uuid) -> Vec<InventorySessionLine> {
        self.lines
            .iter()
            .filter(|line| line.session_id == session_id)
            .cloned()
            .collect()
    }
}

/// Store em memória para desenvolvimento e testes. Um único lock de escrita
/// garante a atomicidade das operações compostas.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> DateTime<Utc>) {
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.users.len() as i64)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.id == id && u.is_active != active)
            .map(|user| {
                user.is_active = active;
                user.updated_at = Utc::now();
                user.clone()
            }))
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn list(&self, location_type: Option<LocationType>) -> Result<Vec<Location>, AppError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables
            .locations
            .iter()
            .filter(|l| l.is_active && location_type.is_none_or(|t| l.location_type == t))
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.locations.iter().find(|l| l.id == id).cloned())
    }

    async fn create(&self, payload: &CreateLocationRequest) -> Result<Location, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            name: payload.name.clone(),
            location_type: payload.location_type,
            parent_id: payload.parent_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.locations.push(location.clone());
        Ok(location)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<InventoryItem>, AppError> {
        let tables = self.tables.read().await;
        let mut items: Vec<InventoryItem> = tables
            .items
            .iter()
            .filter(|i| filter.active.is_none_or(|active| i.is_active == active))
            .filter(|i| filter.location_id.is_none_or(|loc| i.default_location_id == Some(loc)))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<InventoryItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.items.iter().find(|i| i.id == id).cloned())
    }

    async fn create_item(&self, payload: &InventoryItemRequest) -> Result<InventoryItem, AppError> {
        let mut tables = self.tables.write().await;
        if tables.sku_taken(payload.sku.as_deref(), None) {
            return Err(duplicate_sku_error());
        }
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4(),
            name: payload.name.clone(),
            category: payload.category,
            unit: payload.unit.clone(),
            par_stock_level: payload.par_stock_level,
            default_location_id: payload.default_location_id,
            sku: payload.sku.clone(),
            notes: payload.notes.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        id: Uuid,
        payload: &InventoryItemRequest,
    ) -> Result<Option<InventoryItem>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.sku_taken(payload.sku.as_deref(), Some(id)) {
            return Err(duplicate_sku_error());
        }
        Ok(tables.items.iter_mut().find(|i| i.id == id).map(|item| {
            item.name = payload.name.clone();
            item.category = payload.category;
            item.unit = payload.unit.clone();
            item.par_stock_level = payload.par_stock_level;
            item.default_location_id = payload.default_location_id;
            item.sku = payload.sku.clone();
            item.notes = payload.notes.clone();
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn deactivate_item(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.is_active = false;
                item.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_stock(
        &self,
        location_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<CurrentStock>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .stock
            .iter()
            .filter(|s| location_id.is_none_or(|loc| s.location_id == loc))
            .filter(|s| item_id.is_none_or(|item| s.item_id == item))
            .cloned()
            .collect())
    }

    async fn list_sessions(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<InventorySession>, AppError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<InventorySession> = tables
            .sessions
            .iter()
            .filter(|s| location_id.is_none_or(|loc| s.location_id == loc))
            .cloned()
            .collect();
        newest_first(&mut sessions, |s| s.started_at);
        Ok(sessions)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<InventorySession>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned().map(|mut session| {
            session.lines = tables.session_lines(id);
            session
        }))
    }

    async fn create_session(
        &self,
        location_id: Uuid,
        started_by: Uuid,
    ) -> Result<InventorySession, AppError> {
        let mut tables = self.tables.write().await;
        let session = InventorySession {
            id: Uuid::new_v4(),
            location_id,
            started_by,
            started_at: Utc::now(),
            closed_by: None,
            closed_at: None,
            status: SessionStatus::Draft,
            notes: None,
            lines: Vec::new(),
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn add_lines(
        &self,
        session_id: Uuid,
        lines: &[AddSessionLineRequest],
    ) -> Result<Vec<InventorySessionLine>, AppError> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .ok_or(AppError::NotFound("Inventory session"))?;
        if session.is_closed() {
            return Err(closed_session_error());
        }

        let now = Utc::now();
        let created: Vec<InventorySessionLine> = lines
            .iter()
            .map(|line| InventorySessionLine {
                id: Uuid::new_v4(),
                session_id,
                item_id: line.item_id,
                count: line.count,
                unit: line.unit.clone(),
                note: line.note.clone(),
                photo_url: line.photo_url.clone(),
                created_at: now,
            })
            .collect();
        tables.lines.extend(created.iter().cloned());
        Ok(created)
    }

    async fn close_session(
        &self,
        session_id: Uuid,
        closed_by: Uuid,
        notes: Option<String>,
    ) -> Result<InventorySession, AppError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or(AppError::NotFound("Inventory session"))?;
        if tables.sessions[index].is_closed() {
            return Err(AppError::Conflict("Session is already closed".into()));
        }

        let lines = tables.session_lines(session_id);
        if lines.is_empty() {
            return Err(AppError::Conflict("Cannot close session without any line items".into()));
        }

        let now = Utc::now();
        let location_id = tables.sessions[index].location_id;
        for (item_id, count) in counts_by_item(&lines) {
            tables.set_stock(item_id, location_id, count, now);
        }

        let session = &mut tables.sessions[index];
        session.status = SessionStatus::Closed;
        session.closed_by = Some(closed_by);
        session.closed_at = Some(now);
        session.notes = notes;

        let mut closed = session.clone();
        closed.lines = lines;
        Ok(closed)
    }
}

#[async_trait]
impl ProductionStore for MemoryStore {
    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<ProductionRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<ProductionRequest> = tables
            .requests
            .iter()
            .filter(|r| filter.status.is_none_or(|status| r.status == status))
            .filter(|r| filter.location_id.is_none_or(|loc| r.location_id == loc))
            .cloned()
            .collect();
        newest_first(&mut requests, |r| r.created_at);
        Ok(requests)
    }

    async fn overdue_requests(&self, now: DateTime<Utc>) -> Result<Vec<ProductionRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<ProductionRequest> = tables
            .requests
            .iter()
            .filter(|r| matches!(r.status, RequestStatus::Open | RequestStatus::InProgress))
            .filter(|r| r.needed_by < now)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.needed_by);
        Ok(requests)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<ProductionRequest>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn create_request(
        &self,
        requested_by: Uuid,
        payload: &CreateProductionRequestRequest,
    ) -> Result<ProductionRequest, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let request = ProductionRequest {
            id: Uuid::new_v4(),
            product_item_id: payload.product_item_id,
            location_id: payload.location_id,
            requested_by,
            needed_by: payload.needed_by,
            target_quantity: payload.target_quantity,
            unit: payload.unit.clone(),
            priority: payload.priority,
            reason: payload.reason.clone(),
            status: RequestStatus::Open,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        tables.requests.push(request.clone());
        Ok(request)
    }

    async fn transition_request(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        notes: Option<String>,
    ) -> Result<Option<ProductionRequest>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == from)
            .map(|request| {
                request.status = to;
                if notes.is_some() {
                    request.notes = notes;
                }
                request.updated_at = Utc::now();
                request.clone()
            }))
    }

    async fn delete_open_request(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.requests.len();
        tables
            .requests
            .retain(|r| !(r.id == id && r.status == RequestStatus::Open));
        Ok(tables.requests.len() < before)
    }

    async fn list_batches(&self, status: Option<BatchStatus>) -> Result<Vec<ProductionBatch>, AppError> {
        let tables = self.tables.read().await;
        let mut batches: Vec<ProductionBatch> = tables
            .batches
            .iter()
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect();
        newest_first(&mut batches, |b| b.created_at);
        Ok(batches)
    }

    async fn find_batch(&self, id: Uuid) -> Result<Option<ProductionBatch>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.batches.iter().find(|b| b.id == id).cloned())
    }

    async fn create_batch(
        &self,
        made_by: Uuid,
        payload: &CreateBatchRequest,
        now: DateTime<Utc>,
    ) -> Result<ProductionBatch, AppError> {
        let mut tables = self.tables.write().await;
        let prefix = lot_prefix(now);
        let existing = tables
            .batches
            .iter()
            .filter(|b| b.lot_code.starts_with(&prefix))
            .count() as i64;

        let batch = ProductionBatch {
            id: Uuid::new_v4(),
            product_item_id: payload.product_item_id,
            quantity_made: payload.quantity_made,
            unit: payload.unit.clone(),
            storage_location_id: payload.storage_location_id,
            made_by,
            started_at: now,
            finished_at: None,
            lot_code: lot_code(now, existing),
            notes: payload.notes.clone(),
            status: BatchStatus::InProgress,
            created_at: now,
            updated_at: now,
        };
        tables.adjust_stock(batch.product_item_id, batch.storage_location_id, batch.quantity_made, now);
        tables.batches.push(batch.clone());
        Ok(batch)
    }

    async fn complete_batch(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ProductionBatch>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .batches
            .iter_mut()
            .find(|b| b.id == id && b.status == BatchStatus::InProgress)
            .map(|batch| {
                batch.status = BatchStatus::Completed;
                batch.finished_at = Some(now);
                batch.updated_at = now;
                batch.clone()
            }))
    }

    async fn run_out_batch(&self, id: Uuid) -> Result<Option<ProductionBatch>, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let Some(batch) = tables
            .batches
            .iter_mut()
            .find(|b| b.id == id && b.status == BatchStatus::Completed)
        else {
            return Ok(None);
        };
        batch.status = BatchStatus::RunOut;
        batch.updated_at = now;
        let batch = batch.clone();

        tables.adjust_stock(batch.product_item_id, batch.storage_location_id, -batch.quantity_made, now);
        Ok(Some(batch))
    }

    async fn list_waste(&self, filter: WasteFilter) -> Result<Vec<WasteEvent>, AppError> {
        let tables = self.tables.read().await;
        let mut events: Vec<WasteEvent> = tables
            .waste
            .iter()
            .filter(|w| filter.batch_id.is_none_or(|batch| w.batch_id == Some(batch)))
            .filter(|w| filter.item_id.is_none_or(|item| w.item_id == item))
            .cloned()
            .collect();
        newest_first(&mut events, |w| w.recorded_at);
        Ok(events)
    }

    async fn record_waste(
        &self,
        recorded_by: Uuid,
        payload: &RecordWasteRequest,
    ) -> Result<WasteEvent, AppError> {
        let mut tables = self.tables.write().await;

        let storage_location = match payload.batch_id {
            Some(batch_id) => {
                let batch = tables
                    .batches
                    .iter()
                    .find(|b| b.id == batch_id)
                    .ok_or(AppError::NotFound("Production batch"))?;
                if batch.status == BatchStatus::RunOut {
                    return Err(run_out_waste_error());
                }
                Some(batch.storage_location_id)
            }
            None => None,
        };

        let now = Utc::now();
        let event = WasteEvent {
            id: Uuid::new_v4(),
            batch_id: payload.batch_id,
            item_id: payload.item_id,
            quantity: payload.quantity,
            unit: payload.unit.clone(),
            reason: payload.reason,
            recorded_by,
            recorded_at: now,
            notes: payload.notes.clone(),
        };
        if let Some(location_id) = storage_location {
            tables.adjust_stock(event.item_id, location_id, -event.quantity, now);
        }
        tables.waste.push(event.clone());
        Ok(event)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn record(
        &self,
        recorded_by: Uuid,
        entries: &[RecordSnapshotRequest],
        now: DateTime<Utc>,
    ) -> Result<Vec<InventorySnapshot>, AppError> {
        let mut tables = self.tables.write().await;
        let recorded: Vec<InventorySnapshot> = entries
            .iter()
            .map(|entry| InventorySnapshot {
                id: Uuid::new_v4(),
                item_id: entry.item_id,
                quantity: entry.quantity,
                recorded_by,
                recorded_at: now,
                item: None,
            })
            .collect();
        tables.snapshots.extend(recorded.iter().cloned());
        Ok(recorded)
    }

    async fn list(&self, item_id: Option<Uuid>) -> Result<Vec<InventorySnapshot>, AppError> {
        let tables = self.tables.read().await;
        let mut snapshots: Vec<InventorySnapshot> = tables
            .snapshots
            .iter()
            .filter(|s| item_id.is_none_or(|item| s.item_id == item))
            .cloned()
            .collect();
        newest_first(&mut snapshots, |s| s.recorded_at);
        Ok(snapshots)
    }

    async fn latest_per_item(&self) -> Result<Vec<InventorySnapshot>, AppError> {
        let mut latest: Vec<InventorySnapshot> = Vec::new();
        // Ordenado do mais recente: o primeiro de cada item vence
        for snapshot in SnapshotStore::list(self, None).await? {
            if !latest.iter().any(|s| s.item_id == snapshot.item_id) {
                latest.push(snapshot);
            }
        }
        Ok(latest)
    }

    async fn recorded_minutes(&self) -> Result<Vec<DateTime<Utc>>, AppError> {
        let tables = self.tables.read().await;
        let mut minutes: Vec<DateTime<Utc>> = tables
            .snapshots
            .iter()
            .map(|s| truncate_to_minute(s.recorded_at))
            .collect();
        minutes.sort_by_key(|minute| std::cmp::Reverse(*minute));
        minutes.dedup();
        Ok(minutes)
    }

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InventorySnapshot>, AppError> {
        let tables = self.tables.read().await;
        let mut snapshots: Vec<InventorySnapshot> = tables
            .snapshots
            .iter()
            .filter(|s| s.recorded_at >= from && s.recorded_at < to)
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| s.recorded_at);
        Ok(snapshots)
    }
}
