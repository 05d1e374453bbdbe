// src/handlers/production.rs

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
    db::{RequestFilter, WasteFilter},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{
            CanCreateProductionRequests, CanManageProduction, CanRecordBatches, CanRecordWaste,
            CanViewProduction, RequireCapability,
        },
    },
    models::production::{
        BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, ProductionBatch,
        ProductionRequest, RecordWasteRequest, RequestStatus, UpdateRequestStatusRequest,
        WasteEvent,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchQuery {
    pub status: Option<BatchStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct WasteQuery {
    pub batch_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
}

// ---
// Pedidos de produção
// ---

#[utoipa::path(
    get,
    path = "/api/production/requests",
    tag = "Production",
    params(RequestQuery),
    responses((status = 200, description = "Pedidos de produção", body = Vec<ProductionRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_requests(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewProduction>,
    Query(query): Query<RequestQuery>,
) -> Result<Json<Vec<ProductionRequest>>, ApiError> {
    let filter = RequestFilter { status: query.status, location_id: query.location_id };
    Ok(Json(app_state.production_service.list_requests(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/production/requests/overdue",
    tag = "Production",
    responses((status = 200, description = "Pedidos abertos com prazo vencido", body = Vec<ProductionRequest>)),
    security(("api_jwt" = []))
)]
pub async fn overdue_requests(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewProduction>,
) -> Result<Json<Vec<ProductionRequest>>, ApiError> {
    Ok(Json(app_state.production_service.overdue_requests().await?))
}

#[utoipa::path(
    get,
    path = "/api/production/requests/{id}",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido", body = ProductionRequest),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewProduction>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductionRequest>, ApiError> {
    Ok(Json(app_state.production_service.get_request(id).await?))
}

// `requestedBy` vem do token
#[utoipa::path(
    post,
    path = "/api/production/requests",
    tag = "Production",
    request_body = CreateProductionRequestRequest,
    responses(
        (status = 201, description = "Pedido criado (OPEN)", body = ProductionRequest),
        (status = 422, description = "Campos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanCreateProductionRequests>,
    Json(payload): Json<CreateProductionRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let request = app_state.production_service.create_request(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    patch,
    path = "/api/production/requests/{id}",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = UpdateRequestStatusRequest,
    responses(
        (status = 200, description = "Status atualizado", body = ProductionRequest),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_request_status(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageProduction>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestStatusRequest>,
) -> Result<Json<ProductionRequest>, ApiError> {
    let request = app_state
        .production_service
        .transition_request(id, payload.status, payload.notes)
        .await?;
    Ok(Json(request))
}

async fn transition(
    app_state: &AppState,
    id: Uuid,
    to: RequestStatus,
) -> Result<Json<ProductionRequest>, ApiError> {
    Ok(Json(app_state.production_service.transition_request(id, to, None).await?))
}

#[utoipa::path(
    post,
    path = "/api/production/requests/{id}/start",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "OPEN -> IN_PROGRESS", body = ProductionRequest)),
    security(("api_jwt" = []))
)]
pub async fn start_request(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageProduction>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductionRequest>, ApiError> {
    transition(&app_state, id, RequestStatus::InProgress).await
}

#[utoipa::path(
    post,
    path = "/api/production/requests/{id}/complete",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "IN_PROGRESS -> COMPLETED", body = ProductionRequest)),
    security(("api_jwt" = []))
)]
pub async fn complete_request(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageProduction>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductionRequest>, ApiError> {
    transition(&app_state, id, RequestStatus::Completed).await
}

#[utoipa::path(
    post,
    path = "/api/production/requests/{id}/archive",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "Pedido arquivado", body = ProductionRequest)),
    security(("api_jwt" = []))
)]
pub async fn archive_request(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageProduction>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductionRequest>, ApiError> {
    transition(&app_state, id, RequestStatus::Archived).await
}

#[utoipa::path(
    delete,
    path = "/api/production/requests/{id}",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 204, description = "Pedido apagado"),
        (status = 409, description = "Só pedidos OPEN podem ser apagados")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_request(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageProduction>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state.production_service.delete_request(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Lotes
// ---

#[utoipa::path(
    get,
    path = "/api/production/batches",
    tag = "Production",
    params(BatchQuery),
    responses((status = 200, description = "Lotes (mais recentes primeiro)", body = Vec<ProductionBatch>)),
    security(("api_jwt" = []))
)]
pub async fn list_batches(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewProduction>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<Vec<ProductionBatch>>, ApiError> {
    Ok(Json(app_state.production_service.list_batches(query.status).await?))
}

#[utoipa::path(
    get,
    path = "/api/production/batches/{id}",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do lote")),
    responses(
        (status = 200, description = "Lote", body = ProductionBatch),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_batch(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewProduction>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductionBatch>, ApiError> {
    Ok(Json(app_state.production_service.get_batch(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/production/batches",
    tag = "Production",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Lote criado; estoque somado", body = ProductionBatch),
        (status = 422, description = "Campos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_batch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanRecordBatches>,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let batch = app_state.production_service.create_batch(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

#[utoipa::path(
    post,
    path = "/api/production/batches/{id}/complete",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do lote")),
    responses(
        (status = 200, description = "IN_PROGRESS -> COMPLETED", body = ProductionBatch),
        (status = 409, description = "Lote não está em produção")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_batch(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanRecordBatches>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductionBatch>, ApiError> {
    Ok(Json(app_state.production_service.complete_batch(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/production/batches/{id}/runout",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do lote")),
    responses(
        (status = 200, description = "COMPLETED -> RUN_OUT; estoque descontado", body = ProductionBatch),
        (status = 409, description = "Lote não está concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn run_out_batch(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanRecordBatches>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductionBatch>, ApiError> {
    Ok(Json(app_state.production_service.run_out_batch(id).await?))
}

// ---
// Desperdício
// ---

#[utoipa::path(
    get,
    path = "/api/production/waste",
    tag = "Production",
    params(WasteQuery),
    responses((status = 200, description = "Eventos de desperdício (mais recentes primeiro)", body = Vec<WasteEvent>)),
    security(("api_jwt" = []))
)]
pub async fn list_waste(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewProduction>,
    Query(query): Query<WasteQuery>,
) -> Result<Json<Vec<WasteEvent>>, ApiError> {
    let filter = WasteFilter { batch_id: query.batch_id, item_id: query.item_id };
    Ok(Json(app_state.production_service.list_waste(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/production/batches/{id}/waste",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do lote")),
    responses((status = 200, description = "Desperdício do lote", body = Vec<WasteEvent>)),
    security(("api_jwt" = []))
)]
pub async fn batch_waste(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewProduction>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<WasteEvent>>, ApiError> {
    app_state.production_service.get_batch(id).await?;
    let filter = WasteFilter { batch_id: Some(id), item_id: None };
    Ok(Json(app_state.production_service.list_waste(filter).await?))
}

#[utoipa::path(
    post,
    path = "/api/production/waste",
    tag = "Production",
    request_body = RecordWasteRequest,
    responses(
        (status = 201, description = "Desperdício registrado", body = WasteEvent),
        (status = 409, description = "Lote esgotado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_waste(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanRecordWaste>,
    Json(payload): Json<RecordWasteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let event = app_state.production_service.record_waste(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

// Atalho: o lote vem da rota e sobrescreve o do corpo
#[utoipa::path(
    post,
    path = "/api/production/batches/{id}/waste",
    tag = "Production",
    params(("id" = Uuid, Path, description = "ID do lote")),
    request_body = RecordWasteRequest,
    responses(
        (status = 201, description = "Desperdício registrado", body = WasteEvent),
        (status = 409, description = "Lote esgotado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_batch_waste(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CanRecordWaste>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<RecordWasteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;
    payload.batch_id = Some(id);

    let event = app_state.production_service.record_waste(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}
