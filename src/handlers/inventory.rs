// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::ItemFilter,
    middleware::rbac::{CanManageInventory, CanViewInventory, RequireCapability},
    models::inventory::{CurrentStock, InventoryItem, InventoryItemRequest},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemQuery {
    /// Padrão: só itens ativos.
    pub active: Option<bool>,
    /// Filtra pelo local padrão do item.
    pub location: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct StockQuery {
    pub location_id: Option<Uuid>,
}

// ---
// Catálogo de itens
// ---

#[utoipa::path(
    get,
    path = "/api/inventory/items",
    tag = "Inventory",
    params(ItemQuery),
    responses((status = 200, description = "Itens do catálogo", body = Vec<InventoryItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let filter = ItemFilter {
        active: Some(query.active.unwrap_or(true)),
        location_id: query.location,
    };
    Ok(Json(app_state.inventory_service.list_items(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/items/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item", body = InventoryItem),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, ApiError> {
    Ok(Json(app_state.inventory_service.get_item(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/inventory/items",
    tag = "Inventory",
    request_body = InventoryItemRequest,
    responses(
        (status = 201, description = "Item criado", body = InventoryItem),
        (status = 422, description = "Campos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageInventory>,
    Json(payload): Json<InventoryItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let item = app_state.inventory_service.create_item(&payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/api/inventory/items/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item")),
    request_body = InventoryItemRequest,
    responses((status = 200, description = "Item atualizado", body = InventoryItem)),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryItemRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    Ok(Json(app_state.inventory_service.update_item(id, &payload).await?))
}

// Soft delete: o item só deixa de aparecer na listagem padrão
#[utoipa::path(
    delete,
    path = "/api/inventory/items/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses((status = 204, description = "Item desativado")),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageInventory>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state.inventory_service.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/inventory/items/{id}/stock",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses((status = 200, description = "Saldo do item por local", body = Vec<CurrentStock>)),
    security(("api_jwt" = []))
)]
pub async fn item_stock(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CurrentStock>>, ApiError> {
    app_state.inventory_service.get_item(id).await?;
    Ok(Json(app_state.inventory_service.current_stock(None, Some(id)).await?))
}

// ---
// Saldo atual
// ---

#[utoipa::path(
    get,
    path = "/api/inventory/current",
    tag = "Inventory",
    params(StockQuery),
    responses((status = 200, description = "Saldo atual com item e local", body = Vec<CurrentStock>)),
    security(("api_jwt" = []))
)]
pub async fn current_stock(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<CurrentStock>>, ApiError> {
    Ok(Json(app_state.inventory_service.current_stock(query.location_id, None).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/current/below-par",
    tag = "Inventory",
    params(StockQuery),
    responses((status = 200, description = "Saldos abaixo do par", body = Vec<CurrentStock>)),
    security(("api_jwt" = []))
)]
pub async fn below_par(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<CurrentStock>>, ApiError> {
    Ok(Json(app_state.inventory_service.below_par(query.location_id).await?))
}
