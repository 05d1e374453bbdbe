// src/handlers/sessions.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::inventory::StockQuery,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{CanTakeInventory, CanViewInventory, RequireCapability},
    },
    models::inventory::{
        AddSessionLineRequest, CloseSessionRequest, CreateSessionRequest, InventorySession,
        InventorySessionLine,
    },
};

#[utoipa::path(
    get,
    path = "/api/inventory/sessions",
    tag = "Inventory Sessions",
    params(StockQuery),
    responses((status = 200, description = "Sessões (mais recentes primeiro)", body = Vec<InventorySession>)),
    security(("api_jwt" = []))
)]
pub async fn list_sessions(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<InventorySession>>, ApiError> {
    Ok(Json(app_state.inventory_service.list_sessions(query.location_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/sessions/{id}",
    tag = "Inventory Sessions",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Sessão com linhas", body = InventorySession),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventorySession>, ApiError> {
    Ok(Json(app_state.inventory_service.get_session(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/sessions/{id}/lines",
    tag = "Inventory Sessions",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses((status = 200, description = "Linhas da sessão", body = Vec<InventorySessionLine>)),
    security(("api_jwt" = []))
)]
pub async fn get_session_lines(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InventorySessionLine>>, ApiError> {
    let session = app_state.inventory_service.get_session(id).await?;
    Ok(Json(session.lines))
}

#[utoipa::path(
    post,
    path = "/api/inventory/sessions",
    tag = "Inventory Sessions",
    request_body = CreateSessionRequest,
    responses((status = 201, description = "Sessão iniciada (DRAFT)", body = InventorySession)),
    security(("api_jwt" = []))
)]
pub async fn start_session(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanTakeInventory>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .inventory_service
        .start_session(payload.location_id, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/sessions/{id}/lines",
    tag = "Inventory Sessions",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = AddSessionLineRequest,
    responses(
        (status = 201, description = "Linha adicionada", body = InventorySessionLine),
        (status = 409, description = "Sessão fechada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_line(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanTakeInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddSessionLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let line = app_state.inventory_service.add_line(id, payload).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/sessions/{id}/lines/batch",
    tag = "Inventory Sessions",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = Vec<AddSessionLineRequest>,
    responses(
        (status = 201, description = "Linhas adicionadas", body = Vec<InventorySessionLine>),
        (status = 409, description = "Sessão fechada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_lines(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanTakeInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Vec<AddSessionLineRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    // Um erro em qualquer linha invalida o lote inteiro
    if let Some(errors) = payload.iter().find_map(|line| line.validate().err()) {
        return Err(AppError::ValidationError(errors).into());
    }

    let lines = app_state.inventory_service.add_lines(id, payload).await?;
    Ok((StatusCode::CREATED, Json(lines)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/sessions/{id}/close",
    tag = "Inventory Sessions",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = CloseSessionRequest,
    responses(
        (status = 200, description = "Sessão fechada; saldo atualizado", body = InventorySession),
        (status = 409, description = "Já fechada ou sem linhas")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_session(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanTakeInventory>,
    Path(id): Path<Uuid>,
    payload: Option<Json<CloseSessionRequest>>,
) -> Result<Json<InventorySession>, ApiError> {
    let notes = payload.and_then(|Json(body)| body.notes);
    let session = app_state
        .inventory_service
        .close_session(id, user.id, notes)
        .await?;
    Ok(Json(session))
}
