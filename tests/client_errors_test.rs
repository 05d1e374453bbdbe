use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::json;
use sweet_swirls::{
    client::{
        auth::AuthContext,
        pages::{ActionError, InventoryPage, PageState},
        session::{TOKEN_KEY, USER_KEY},
        ApiClient, ClientConfig, ClientError, MemoryStorage, Session,
    },
    models::{
        auth::{LoginRequest, Role, User},
        inventory::{InventoryCategory, InventoryItemRequest},
    },
};
use uuid::Uuid;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: "admin@sweetswirls.com".into(),
        name: "Admin User".into(),
        password_hash: String::new(),
        role: Role::Admin,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Cliente apontando para o mock, já com uma sessão salva.
fn logged_in_client(server: &MockServer) -> ApiClient {
    let user_data = serde_json::to_string(&user()).unwrap();
    let storage = MemoryStorage::default()
        .with(TOKEN_KEY, "stored-token")
        .with(USER_KEY, &user_data);
    let session = Arc::new(Session::hydrate(storage));
    assert!(session.is_authenticated());
    ApiClient::new(&ClientConfig::with_api_url(format!("{}/api", server.uri())), session).unwrap()
}

#[tokio::test]
async fn validation_errors_keep_their_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/inventory/items"))
        .and(header("authorization", "Bearer stored-token"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "Validation failed",
            "details": { "name": ["Name is required."], "parStockLevel": ["Must be greater than zero."] }
        })))
        .mount(&server)
        .await;

    let api = logged_in_client(&server);
    let form = InventoryItemRequest {
        name: "Mango Base".into(),
        category: InventoryCategory::Base,
        unit: "gallons".into(),
        par_stock_level: dec!(4),
        default_location_id: None,
        sku: None,
        notes: None,
    };
    let err = api.create_item(&form).await.unwrap_err();
    let ClientError::Validation { message, fields } = &err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(message, "Validation failed");
    assert_eq!(fields["parStockLevel"], vec!["Must be greater than zero.".to_string()]);

    // Na página os erros do servidor viram erros de formulário
    let mut page = InventoryPage::new(api);
    let Err(ActionError::Form(errors)) = page.create(&form).await else {
        panic!("expected form errors");
    };
    assert_eq!(errors.get("name"), Some("Name is required."));
}

#[tokio::test]
async fn server_errors_become_friendly_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/inventory/items"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Internal server error" })))
        .mount(&server)
        .await;

    let api = logged_in_client(&server);
    let err = api.list_items(None, None).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message("load", "inventory items"), "Failed to load inventory items");

    let mut page = InventoryPage::new(api.clone());
    page.load().await;
    assert_eq!(page.state, PageState::Failed("Failed to load inventory items".into()));
    // Erro 500 não derruba a sessão
    assert!(api.session().is_authenticated());
}

#[tokio::test]
async fn rejected_tokens_clear_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid or missing authentication token" })))
        .mount(&server)
        .await;

    let api = logged_in_client(&server);
    let err = api.me().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!api.session().is_authenticated());
    assert_eq!(api.session().token(), None);
}

#[tokio::test]
async fn wrong_credentials_are_not_a_session_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid email or password" })))
        .mount(&server)
        .await;

    let api = logged_in_client(&server);
    let auth = AuthContext::new(api);
    let credentials = LoginRequest { email: "admin@sweetswirls.com".into(), password: "wrong".into() };
    let err = auth.login(&credentials).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
    assert_eq!(err.user_message("log", "in"), "Invalid email or password");
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn dashboard_fails_when_any_source_fails() {
    let server = MockServer::start().await;
    for endpoint in ["/api/inventory/current", "/api/production/requests", "/api/production/waste"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/production/batches"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let api = logged_in_client(&server);
    let err = api.get_dashboard_data(Utc::now().fixed_offset()).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.user_message("load", "dashboard data"), "Failed to load dashboard data");
}

#[tokio::test]
async fn invalid_forms_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/inventory/items"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut page = InventoryPage::new(logged_in_client(&server));
    let form = InventoryItemRequest {
        name: String::new(),
        category: InventoryCategory::Beverage,
        unit: "cases".into(),
        par_stock_level: dec!(-1),
        default_location_id: None,
        sku: None,
        notes: None,
    };
    let Err(ActionError::Form(errors)) = page.create(&form).await else {
        panic!("expected form errors");
    };
    assert!(errors.get("name").is_some());
    assert!(errors.get("parStockLevel").is_some());
    server.verify().await;
}
