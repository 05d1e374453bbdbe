// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use crate::{
    common::error::ApiError,
    middleware::auth::AuthenticatedUser,
    models::rbac::Capability,
};

/// 1. O Trait que liga um tipo marcador a uma capacidade
pub trait CapabilityDef: Send + Sync + 'static {
    fn capability() -> Capability;
}

/// 2. O Extractor (Guardião)
pub struct RequireCapability<C>(pub PhantomData<C>);

// 3. Implementação do FromRequestParts
impl<C, S> FromRequestParts<S> for RequireCapability<C>
where
    C: CapabilityDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário (colocado pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(ApiError::new(StatusCode::UNAUTHORIZED, "User is not authenticated."))?;

        // B. Consulta a tabela de capacidades
        let required = C::capability();
        if !required.allows(user.0.role) {
            tracing::warn!(user_id = %user.0.id, role = %user.0.role, capability = %required, "acesso negado");
            return Err(ApiError::new(
                StatusCode::FORBIDDEN,
                format!("You need the '{required}' capability to perform this action."),
            ));
        }

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS CAPACIDADES (TIPOS)
// ---

pub struct CanManageUsers;
impl CapabilityDef for CanManageUsers {
    fn capability() -> Capability { Capability::ManageUsers }
}

pub struct CanManageLocations;
impl CapabilityDef for CanManageLocations {
    fn capability() -> Capability { Capability::ManageLocations }
}

pub struct CanManageInventory;
impl CapabilityDef for CanManageInventory {
    fn capability() -> Capability { Capability::ManageInventory }
}

pub struct CanTakeInventory;
impl CapabilityDef for CanTakeInventory {
    fn capability() -> Capability { Capability::TakeInventory }
}

pub struct CanManageProduction;
impl CapabilityDef for CanManageProduction {
    fn capability() -> Capability { Capability::ManageProduction }
}

pub struct CanCreateProductionRequests;
impl CapabilityDef for CanCreateProductionRequests {
    fn capability() -> Capability { Capability::CreateProductionRequests }
}

pub struct CanRecordBatches;
impl CapabilityDef for CanRecordBatches {
    fn capability() -> Capability { Capability::RecordBatches }
}

pub struct CanRecordWaste;
impl CapabilityDef for CanRecordWaste {
    fn capability() -> Capability { Capability::RecordWaste }
}

pub struct CanViewReports;
impl CapabilityDef for CanViewReports {
    fn capability() -> Capability { Capability::ViewReports }
}

pub struct CanViewInventory;
impl CapabilityDef for CanViewInventory {
    fn capability() -> Capability { Capability::ViewInventory }
}

pub struct CanViewProduction;
impl CapabilityDef for CanViewProduction {
    fn capability() -> Capability { Capability::ViewProduction }
}
