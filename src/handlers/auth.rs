// src/handlers/auth.rs

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
    middleware::{
        auth::AuthenticatedUser,
        rbac::{CanManageUsers, RequireCapability},
    },
    models::{
        auth::{CreateUserRequest, LoginRequest, LoginResponse, Role, UpdateRoleRequest, User},
        rbac::Capability,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role: Option<Role>,
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login efetuado", body = LoginResponse),
        (status = 401, description = "E-mail ou senha inválidos"),
        (status = 422, description = "Campos inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(response))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Usuário atual", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// ---
// Gestão de usuários (ADMIN)
// ---

#[utoipa::path(
    post,
    path = "/api/auth/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 409, description = "E-mail já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageUsers>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state.auth_service.create_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "Users",
    params(UserQuery),
    responses((status = 200, description = "Lista de usuários", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageUsers>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(app_state.auth_service.list_users(query.role).await?))
}

// Admin vê qualquer um; os demais só a si mesmos
#[utoipa::path(
    get,
    path = "/api/auth/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = User),
        (status = 403, description = "Sem permissão"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    if current.id != id && !Capability::ManageUsers.allows(current.role) {
        return Err(AppError::Forbidden("You can only view your own profile.".into()).into());
    }
    Ok(Json(app_state.auth_service.get_user(id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/auth/users/{id}/role",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdateRoleRequest,
    responses((status = 200, description = "Papel atualizado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageUsers>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(app_state.auth_service.update_role(id, payload.role).await?))
}

#[utoipa::path(
    patch,
    path = "/api/auth/users/{id}/deactivate",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário desativado", body = User),
        (status = 409, description = "Já estava inativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_user(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageUsers>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(app_state.auth_service.set_active(id, false).await?))
}

#[utoipa::path(
    patch,
    path = "/api/auth/users/{id}/activate",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário ativado", body = User),
        (status = 409, description = "Já estava ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn activate_user(
    State(app_state): State<AppState>,
    _guard: RequireCapability<CanManageUsers>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(app_state.auth_service.set_active(id, true).await?))
}
