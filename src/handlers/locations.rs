// src/handlers/locations.rs

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
    middleware::rbac::{CanManageLocations, CanViewInventory, RequireCapability},
    models::location::{CreateLocationRequest, Location, LocationType},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
}

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Locations",
    params(LocationQuery),
    responses((status = 200, description = "Locais ativos", body = Vec<Location>)),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Vec<Location>>, ApiError> {
    Ok(Json(app_state.location_service.list(query.location_type).await?))
}

#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "ID do local")),
    responses(
        (status = 200, description = "Local", body = Location),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_location(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanViewInventory>,
    Path(id): Path<Uuid>,
) -> Result<Json<Location>, ApiError> {
    Ok(Json(app_state.location_service.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "Locations",
    request_body = CreateLocationRequest,
    responses((status = 201, description = "Local criado", body = Location)),
    security(("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageLocations>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let location = app_state.location_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(location)))
}
