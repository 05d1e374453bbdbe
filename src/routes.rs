// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Monta o router completo da API (`/api/...`) mais a documentação.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/users",
            post(handlers::auth::create_user).get(handlers::auth::list_users),
        )
        .route("/users/{id}", get(handlers::auth::get_user))
        .route("/users/{id}/role", patch(handlers::auth::update_role))
        .route("/users/{id}/deactivate", patch(handlers::auth::deactivate_user))
        .route("/users/{id}/activate", patch(handlers::auth::activate_user));

    let location_routes = Router::new()
        .route(
            "/locations",
            get(handlers::locations::list_locations).post(handlers::locations::create_location),
        )
        .route("/locations/{id}", get(handlers::locations::get_location));

    let inventory_routes = Router::new()
        .route(
            "/items",
            get(handlers::inventory::list_items).post(handlers::inventory::create_item),
        )
        .route(
            "/items/{id}",
            get(handlers::inventory::get_item)
                .put(handlers::inventory::update_item)
                .delete(handlers::inventory::delete_item),
        )
        .route("/items/{id}/stock", get(handlers::inventory::item_stock))
        .route("/current", get(handlers::inventory::current_stock))
        .route("/current/below-par", get(handlers::inventory::below_par))
        // Sessões de contagem
        .route(
            "/sessions",
            get(handlers::sessions::list_sessions).post(handlers::sessions::start_session),
        )
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        .route(
            "/sessions/{id}/lines",
            get(handlers::sessions::get_session_lines).post(handlers::sessions::add_line),
        )
        .route("/sessions/{id}/lines/batch", post(handlers::sessions::add_lines))
        .route("/sessions/{id}/close", post(handlers::sessions::close_session))
        // Snapshots
        .route(
            "/snapshots",
            get(handlers::snapshots::list_snapshots).post(handlers::snapshots::record_snapshot),
        )
        .route("/snapshots/batch", post(handlers::snapshots::record_snapshot_batch))
        .route("/snapshots/current", get(handlers::snapshots::current_snapshots))
        .route("/snapshots/sessions", get(handlers::snapshots::snapshot_minutes))
        .route("/snapshots/session", get(handlers::snapshots::snapshots_in_minute))
        .route("/snapshots/{item_id}", get(handlers::snapshots::item_snapshots));

    let production_routes = Router::new()
        .route(
            "/requests",
            get(handlers::production::list_requests).post(handlers::production::create_request),
        )
        .route("/requests/overdue", get(handlers::production::overdue_requests))
        .route(
            "/requests/{id}",
            get(handlers::production::get_request)
                .patch(handlers::production::update_request_status)
                .delete(handlers::production::delete_request),
        )
        .route("/requests/{id}/start", post(handlers::production::start_request))
        .route("/requests/{id}/complete", post(handlers::production::complete_request))
        .route("/requests/{id}/archive", post(handlers::production::archive_request))
        .route(
            "/batches",
            get(handlers::production::list_batches).post(handlers::production::create_batch),
        )
        .route("/batches/{id}", get(handlers::production::get_batch))
        .route("/batches/{id}/complete", post(handlers::production::complete_batch))
        .route("/batches/{id}/runout", post(handlers::production::run_out_batch))
        .route(
            "/batches/{id}/waste",
            get(handlers::production::batch_waste).post(handlers::production::record_batch_waste),
        )
        .route(
            "/waste",
            get(handlers::production::list_waste).post(handlers::production::record_waste),
        );

    // Tudo abaixo exige Bearer válido
    let protected_routes = Router::new()
        .nest("/auth", user_routes)
        .merge(location_routes)
        .nest("/inventory", inventory_routes)
        .nest("/production", production_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
