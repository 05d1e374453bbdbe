// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Users ---
        handlers::auth::create_user,
        handlers::auth::list_users,
        handlers::auth::get_user,
        handlers::auth::update_role,
        handlers::auth::deactivate_user,
        handlers::auth::activate_user,

        // --- Locations ---
        handlers::locations::list_locations,
        handlers::locations::get_location,
        handlers::locations::create_location,

        // --- INVENTORY ---
        handlers::inventory::list_items,
        handlers::inventory::get_item,
        handlers::inventory::create_item,
        handlers::inventory::update_item,
        handlers::inventory::delete_item,
        handlers::inventory::item_stock,
        handlers::inventory::current_stock,
        handlers::inventory::below_par,

        // --- SESSIONS ---
        handlers::sessions::list_sessions,
        handlers::sessions::get_session,
        handlers::sessions::get_session_lines,
        handlers::sessions::start_session,
        handlers::sessions::add_line,
        handlers::sessions::add_lines,
        handlers::sessions::close_session,

        // --- SNAPSHOTS ---
        handlers::snapshots::record_snapshot,
        handlers::snapshots::record_snapshot_batch,
        handlers::snapshots::list_snapshots,
        handlers::snapshots::current_snapshots,
        handlers::snapshots::item_snapshots,
        handlers::snapshots::snapshot_minutes,
        handlers::snapshots::snapshots_in_minute,

        // --- PRODUCTION ---
        handlers::production::list_requests,
        handlers::production::overdue_requests,
        handlers::production::get_request,
        handlers::production::create_request,
        handlers::production::update_request_status,
        handlers::production::start_request,
        handlers::production::complete_request,
        handlers::production::archive_request,
        handlers::production::delete_request,
        handlers::production::list_batches,
        handlers::production::get_batch,
        handlers::production::create_batch,
        handlers::production::complete_batch,
        handlers::production::run_out_batch,
        handlers::production::batch_waste,
        handlers::production::record_batch_waste,
        handlers::production::list_waste,
        handlers::production::record_waste,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginRequest,
            models::auth::LoginResponse,
            models::auth::CreateUserRequest,
            models::auth::UpdateRoleRequest,
            models::rbac::Capability,

            // --- Locations ---
            models::location::LocationType,
            models::location::Location,
            models::location::CreateLocationRequest,

            // --- Inventory ---
            models::inventory::InventoryCategory,
            models::inventory::InventoryItem,
            models::inventory::InventoryItemRequest,
            models::inventory::SessionStatus,
            models::inventory::InventorySession,
            models::inventory::InventorySessionLine,
            models::inventory::CreateSessionRequest,
            models::inventory::AddSessionLineRequest,
            models::inventory::CloseSessionRequest,
            models::inventory::CurrentStock,
            models::inventory::InventorySnapshot,
            models::inventory::RecordSnapshotRequest,
            models::inventory::RecordSnapshotBatchRequest,

            // --- Production ---
            models::production::Priority,
            models::production::RequestStatus,
            models::production::BatchStatus,
            models::production::WasteReason,
            models::production::ProductionRequest,
            models::production::CreateProductionRequestRequest,
            models::production::UpdateRequestStatusRequest,
            models::production::ProductionBatch,
            models::production::CreateBatchRequest,
            models::production::WasteEvent,
            models::production::RecordWasteRequest,
        )
    ),
    tags(
        (name = "Health", description = "Verificação do servidor"),
        (name = "Auth", description = "Login e perfil atual"),
        (name = "Users", description = "Gestão de usuários (ADMIN)"),
        (name = "Locations", description = "Lojas, freezers e depósitos"),
        (name = "Inventory", description = "Catálogo de itens e saldo atual"),
        (name = "Inventory Sessions", description = "Contagens de estoque"),
        (name = "Inventory Snapshots", description = "Histórico de contagens avulsas"),
        (name = "Production", description = "Pedidos, lotes e desperdício")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_protected_routes_with_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/production/batches/{id}/runout"));
        assert!(doc.paths.paths.contains_key("/api/inventory/sessions/{id}/close"));
        assert!(doc.paths.paths.contains_key("/api/inventory/snapshots/{item_id}"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
