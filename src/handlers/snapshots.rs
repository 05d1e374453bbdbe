// src/handlers/snapshots.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{CanTakeInventory, CanViewInventory, CanViewReports, RequireCapability},
    },
    models::inventory::{InventorySnapshot, RecordSnapshotBatchRequest, RecordSnapshotRequest},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMinuteQuery {
    /// Qualquer instante dentro do minuto (RFC 3339).
    pub recorded_at: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/inventory/snapshots",
    tag = "Inventory Snapshots",
    request_body = RecordSnapshotRequest,
    responses(
        (status = 201, description = "Snapshot gravado", body = InventorySnapshot),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_snapshot(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanTakeInventory>,
    Json(payload): Json<RecordSnapshotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let snapshot = app_state.snapshot_service.record(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/snapshots/batch",
    tag = "Inventory Snapshots",
    request_body = RecordSnapshotBatchRequest,
    responses(
        (status = 201, description = "Snapshots gravados com o mesmo horário", body = Vec<InventorySnapshot>),
        (status = 400, description = "Lote vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_snapshot_batch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanTakeInventory>,
    Json(payload): Json<RecordSnapshotBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(errors) = payload.snapshots.iter().find_map(|entry| entry.validate().err()) {
        return Err(AppError::ValidationError(errors).into());
    }

    let snapshots = app_state
        .snapshot_service
        .record_batch(user.id, payload.snapshots)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshots)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/snapshots",
    tag = "Inventory Snapshots",
    responses((status = 200, description = "Todos os snapshots (mais recentes primeiro)", body = Vec<InventorySnapshot>)),
    security(("api_jwt" = []))
)]
pub async fn list_snapshots(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
) -> Result<Json<Vec<InventorySnapshot>>, ApiError> {
    Ok(Json(app_state.snapshot_service.list(None).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/snapshots/current",
    tag = "Inventory Snapshots",
    responses((status = 200, description = "Último snapshot de cada item", body = Vec<InventorySnapshot>)),
    security(("api_jwt" = []))
)]
pub async fn current_snapshots(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
) -> Result<Json<Vec<InventorySnapshot>>, ApiError> {
    Ok(Json(app_state.snapshot_service.current().await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/snapshots/{item_id}",
    tag = "Inventory Snapshots",
    params(("item_id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Histórico do item", body = Vec<InventorySnapshot>),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn item_snapshots(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Vec<InventorySnapshot>>, ApiError> {
    Ok(Json(app_state.snapshot_service.history(item_id).await?))
}

// --- Relatórios por contagem ---

#[utoipa::path(
    get,
    path = "/api/inventory/snapshots/sessions",
    tag = "Inventory Snapshots",
    responses((status = 200, description = "Minutos com gravação, do mais recente", body = Vec<DateTime<Utc>>)),
    security(("api_jwt" = []))
)]
pub async fn snapshot_minutes(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewReports>,
) -> Result<Json<Vec<DateTime<Utc>>>, ApiError> {
    Ok(Json(app_state.snapshot_service.recorded_minutes().await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/snapshots/session",
    tag = "Inventory Snapshots",
    params(SnapshotMinuteQuery),
    responses((status = 200, description = "Snapshots do minuto informado", body = Vec<InventorySnapshot>)),
    security(("api_jwt" = []))
)]
pub async fn snapshots_in_minute(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewReports>,
    Query(query): Query<SnapshotMinuteQuery>,
) -> Result<Json<Vec<InventorySnapshot>>, ApiError> {
    Ok(Json(app_state.snapshot_service.in_minute(query.recorded_at).await?))
}
