// src/db.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, Role, User},
        inventory::{
            AddSessionLineRequest, CurrentStock, InventoryItem, InventoryItemRequest,
            InventorySession, InventorySessionLine, InventorySnapshot, RecordSnapshotRequest,
        },
        location::{CreateLocationRequest, Location, LocationType},
        production::{
            BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, ProductionBatch,
            ProductionRequest, RecordWasteRequest, RequestStatus, WasteEvent,
        },
    },
};

pub mod inventory_repo;
pub mod location_repo;
pub mod memory;
pub mod production_repo;
pub mod snapshot_repo;
pub mod user_repo;

pub use inventory_repo::InventoryRepository;
pub use location_repo::LocationRepository;
pub use memory::MemoryStore;
pub use production_repo::ProductionRepository;
pub use snapshot_repo::SnapshotRepository;
pub use user_repo::UserRepository;

// ---
// Filtros de listagem
// ---

#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilter {
    /// `None` = todos; a API usa `Some(true)` por padrão.
    pub active: Option<bool>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WasteFilter {
    pub batch_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
}

// ---
// Contratos dos stores (Postgres ou memória)
// ---

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    /// Falha com `EmailAlreadyExists` se o e-mail já estiver em uso.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError>;
    /// Só altera se o valor atual for diferente; `None` se nada mudou.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn list(&self, location_type: Option<LocationType>) -> Result<Vec<Location>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, AppError>;
    async fn create(&self, payload: &CreateLocationRequest) -> Result<Location, AppError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<InventoryItem>, AppError>;
    async fn find_item(&self, id: Uuid) -> Result<Option<InventoryItem>, AppError>;
    async fn create_item(&self, payload: &InventoryItemRequest) -> Result<InventoryItem, AppError>;
    async fn update_item(
        &self,
        id: Uuid,
        payload: &InventoryItemRequest,
    ) -> Result<Option<InventoryItem>, AppError>;
    /// Soft delete. `false` se o item não existe.
    async fn deactivate_item(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_stock(
        &self,
        location_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<CurrentStock>, AppError>;

    async fn list_sessions(&self, location_id: Option<Uuid>)
        -> Result<Vec<InventorySession>, AppError>;
    /// Sessão com as linhas, em ordem de criação.
    async fn find_session(&self, id: Uuid) -> Result<Option<InventorySession>, AppError>;
    async fn create_session(
        &self,
        location_id: Uuid,
        started_by: Uuid,
    ) -> Result<InventorySession, AppError>;
    /// Adiciona as linhas atomicamente; rejeita sessão fechada.
    async fn add_lines(
        &self,
        session_id: Uuid,
        lines: &[AddSessionLineRequest],
    ) -> Result<Vec<InventorySessionLine>, AppError>;
    /// Fecha a sessão e grava as contagens como saldo atual do local.
    async fn close_session(
        &self,
        session_id: Uuid,
        closed_by: Uuid,
        notes: Option<String>,
    ) -> Result<InventorySession, AppError>;
}

#[async_trait]
pub trait ProductionStore: Send + Sync {
    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<ProductionRequest>, AppError>;
    async fn overdue_requests(&self, now: DateTime<Utc>) -> Result<Vec<ProductionRequest>, AppError>;
    async fn find_request(&self, id: Uuid) -> Result<Option<ProductionRequest>, AppError>;
    async fn create_request(
        &self,
        requested_by: Uuid,
        payload: &CreateProductionRequestRequest,
    ) -> Result<ProductionRequest, AppError>;
    /// Compare-and-set: só aplica se o status atual for `from`.
    async fn transition_request(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        notes: Option<String>,
    ) -> Result<Option<ProductionRequest>, AppError>;
    /// Só apaga pedidos OPEN; `false` se nada foi apagado.
    async fn delete_open_request(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_batches(&self, status: Option<BatchStatus>) -> Result<Vec<ProductionBatch>, AppError>;
    async fn find_batch(&self, id: Uuid) -> Result<Option<ProductionBatch>, AppError>;
    /// Cria o lote (lot code `YYYYMMDD-NNN`) e soma o estoque no local de armazenagem.
    async fn create_batch(
        &self,
        made_by: Uuid,
        payload: &CreateBatchRequest,
        now: DateTime<Utc>,
    ) -> Result<ProductionBatch, AppError>;
    async fn complete_batch(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ProductionBatch>, AppError>;
    /// COMPLETED -> RUN_OUT, descontando o estoque.
    async fn run_out_batch(&self, id: Uuid) -> Result<Option<ProductionBatch>, AppError>;

    async fn list_waste(&self, filter: WasteFilter) -> Result<Vec<WasteEvent>, AppError>;
    async fn record_waste(
        &self,
        recorded_by: Uuid,
        payload: &RecordWasteRequest,
    ) -> Result<WasteEvent, AppError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Grava todas as entradas com o mesmo `recorded_at`.
    async fn record(
        &self,
        recorded_by: Uuid,
        entries: &[RecordSnapshotRequest],
        now: DateTime<Utc>,
    ) -> Result<Vec<InventorySnapshot>, AppError>;
    /// Mais recentes primeiro.
    async fn list(&self, item_id: Option<Uuid>) -> Result<Vec<InventorySnapshot>, AppError>;
    /// O snapshot mais recente de cada item.
    async fn latest_per_item(&self) -> Result<Vec<InventorySnapshot>, AppError>;
    /// Minutos distintos em que houve gravação, do mais recente ao mais antigo.
    async fn recorded_minutes(&self) -> Result<Vec<DateTime<Utc>>, AppError>;
    /// Intervalo semiaberto `[from, to)`.
    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<InventorySnapshot>, AppError>;
}

/// Todos os stores da aplicação, como trait objects.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub locations: Arc<dyn LocationStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub production: Arc<dyn ProductionStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            locations: Arc::new(LocationRepository::new(pool.clone())),
            inventory: Arc::new(InventoryRepository::new(pool.clone())),
            production: Arc::new(ProductionRepository::new(pool.clone())),
            snapshots: Arc::new(SnapshotRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            users: store.clone(),
            locations: store.clone(),
            inventory: store.clone(),
            production: store.clone(),
            snapshots: store,
        }
    }
}

/// `20250101-001`: prefixo da data + sequência de 3 dígitos.
pub fn lot_code(now: DateTime<Utc>, existing_with_prefix: i64) -> String {
    format!("{}-{:03}", lot_prefix(now), existing_with_prefix + 1)
}

pub fn lot_prefix(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Início do minuto: agrupa snapshots gravados na mesma contagem.
pub fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::minutes(1)).unwrap_or(at)
}

pub(crate) fn closed_session_error() -> AppError {
    AppError::Conflict("Cannot modify closed session".into())
}

pub(crate) fn duplicate_sku_error() -> AppError {
    AppError::Conflict("SKU already exists".into())
}

pub(crate) fn run_out_waste_error() -> AppError {
    AppError::Conflict("Cannot record waste for run out batch".into())
}

// Saldo que será gravado por item ao fechar a sessão (a última linha vence)
pub(crate) fn counts_by_item(lines: &[InventorySessionLine]) -> Vec<(Uuid, Decimal)> {
    let mut counts: Vec<(Uuid, Decimal)> = Vec::new();
    for line in lines {
        match counts.iter_mut().find(|(item_id, _)| *item_id == line.item_id) {
            Some(entry) => entry.1 = line.count,
            None => counts.push((line.item_id, line.count)),
        }
    }
    counts
}
