// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

use sweet_swirls::{
    client::{auth::AuthContext, ApiClient, ClientConfig, MemoryStorage, Session},
    config::{AppState, Config},
    db::Stores,
    models::{
        auth::{LoginRequest, LoginResponse},
        inventory::{CurrentStock, InventoryItem, InventorySession, InventorySessionLine},
        location::Location,
        production::{ProductionBatch, ProductionRequest},
    },
    routes,
    services::seed::seed_default_data,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestUser {
    Admin,
    ProductionLead,
    ShiftLead,
    TeamMember,
}

impl TestUser {
    pub const ALL: [TestUser; 4] =
        [TestUser::Admin, TestUser::ProductionLead, TestUser::ShiftLead, TestUser::TeamMember];

    pub fn credentials(self) -> (&'static str, &'static str) {
        match self {
            TestUser::Admin => ("admin@sweetswirls.com", "admin123"),
            TestUser::ProductionLead => ("production@sweetswirls.com", "production123"),
            TestUser::ShiftLead => ("shift@sweetswirls.com", "shift123"),
            TestUser::TeamMember => ("team@sweetswirls.com", "team123"),
        }
    }

    pub fn login_request(self) -> LoginRequest {
        let (email, password) = self.credentials();
        LoginRequest { email: email.into(), password: password.into() }
    }
}

/// Servidor real (store em memória, dados padrão) numa porta efêmera.
pub struct TestApp {
    pub base_url: String,
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = Config {
            database_url: None,
            jwt_secret: "test-secret".into(),
            bind_addr: "127.0.0.1:0".into(),
            seed_default_data: true,
            bcrypt_cost: 4,
        };
        let state = AppState::from_stores(Stores::in_memory(), &config);
        seed_default_data(&state).await.expect("seed default data");

        let router = routes::app(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let server = router.clone();
        tokio::spawn(async move {
            axum::serve(listener, server).await.expect("server error");
        });

        Self { base_url: format!("http://{addr}/api"), router, state }
    }

    /// Cliente novo, com sessão vazia em memória.
    pub fn client(&self) -> ApiClient {
        let session = Arc::new(Session::new(MemoryStorage::default()));
        ApiClient::new(&ClientConfig::with_api_url(&self.base_url), session).expect("api client")
    }

    /// Chamada direta no router, sem rede.
    pub async fn oneshot(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("oneshot");
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn token_for(&self, user: TestUser) -> String {
        let (status, body) = self
            .oneshot(Method::POST, "/api/auth/login", None, Some(json!(user.login_request())))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed for {user:?}: {body}");
        body["token"].as_str().expect("token").to_string()
    }
}

/// Login/logout através do `AuthContext`, como a tela de login faria.
pub struct AuthHelper<'a> {
    app: &'a TestApp,
}

impl<'a> AuthHelper<'a> {
    pub fn new(app: &'a TestApp) -> Self {
        Self { app }
    }

    pub async fn login_as(&self, user: TestUser) -> AuthContext {
        let auth = AuthContext::new(self.app.client());
        auth.login(&user.login_request()).await.expect("login");
        auth
    }

    pub fn logout_and_clear(&self, auth: &AuthContext) {
        auth.logout();
        assert!(!auth.is_authenticated());
    }
}

/// HTTP cru para preparar e inspecionar o estado do servidor.
pub struct TestApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TestApiClient {
    pub async fn new(app: &TestApp, user: TestUser) -> Self {
        let http = reqwest::Client::new();
        let login: LoginResponse = http
            .post(format!("{}/auth/login", app.base_url))
            .json(&user.login_request())
            .send()
            .await
            .expect("login request")
            .json()
            .await
            .expect("login body");
        Self { http, base_url: app.base_url.clone(), token: login.token }
    }

    pub async fn raw(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> reqwest::Response {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        builder.send().await.expect("request")
    }

    async fn expect_json<T: DeserializeOwned>(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> T {
        let response = self.raw(method, path, body).await;
        let status = response.status();
        assert!(status.is_success(), "{path} returned {status}");
        response.json().await.expect("json body")
    }

    pub async fn location(&self, name: &str) -> Location {
        let locations: Vec<Location> = self.expect_json(reqwest::Method::GET, "/locations", None).await;
        locations
            .into_iter()
            .find(|l| l.name == name)
            .unwrap_or_else(|| panic!("location {name} not seeded"))
    }

    pub async fn item_by_sku(&self, sku: &str) -> InventoryItem {
        let items: Vec<InventoryItem> = self.expect_json(reqwest::Method::GET, "/inventory/items", None).await;
        items
            .into_iter()
            .find(|i| i.sku.as_deref() == Some(sku))
            .unwrap_or_else(|| panic!("item {sku} not found"))
    }

    pub async fn create_item(&self, name: &str, sku: &str, par: Decimal) -> InventoryItem {
        let body = json!({
            "name": name,
            "category": "BASE",
            "unit": "gallons",
            "parStockLevel": par,
            "sku": sku,
        });
        self.expect_json(reqwest::Method::POST, "/inventory/items", Some(body)).await
    }

    pub async fn start_session(&self, location_id: Uuid) -> InventorySession {
        self.expect_json(
            reqwest::Method::POST,
            "/inventory/sessions",
            Some(json!({ "locationId": location_id })),
        )
        .await
    }

    pub async fn add_line(&self, session_id: Uuid, item: &InventoryItem, count: Decimal) -> InventorySessionLine {
        self.expect_json(
            reqwest::Method::POST,
            &format!("/inventory/sessions/{session_id}/lines"),
            Some(json!({ "itemId": item.id, "count": count, "unit": item.unit })),
        )
        .await
    }

    pub async fn close_session(&self, session_id: Uuid) -> InventorySession {
        self.expect_json(
            reqwest::Method::POST,
            &format!("/inventory/sessions/{session_id}/close"),
            Some(json!({})),
        )
        .await
    }

    /// Conta `count` do item no local, numa sessão já fechada.
    pub async fn count_stock(&self, location_id: Uuid, item: &InventoryItem, count: Decimal) {
        let session = self.start_session(location_id).await;
        self.add_line(session.id, item, count).await;
        self.close_session(session.id).await;
    }

    pub async fn create_request(&self, item: &InventoryItem, location_id: Uuid) -> ProductionRequest {
        let needed_by = chrono::Utc::now() + chrono::Duration::days(2);
        self.expect_json(
            reqwest::Method::POST,
            "/production/requests",
            Some(json!({
                "productItemId": item.id,
                "locationId": location_id,
                "neededBy": needed_by,
                "targetQuantity": 5,
                "unit": item.unit,
                "priority": "HIGH",
                "reason": "Weekend rush",
            })),
        )
        .await
    }

    pub async fn create_batch(&self, item: &InventoryItem, storage_id: Uuid, quantity: Decimal) -> ProductionBatch {
        self.expect_json(
            reqwest::Method::POST,
            "/production/batches",
            Some(json!({
                "productItemId": item.id,
                "quantityMade": quantity,
                "unit": item.unit,
                "storageLocationId": storage_id,
            })),
        )
        .await
    }

    pub async fn complete_batch(&self, batch_id: Uuid) -> ProductionBatch {
        self.expect_json(reqwest::Method::POST, &format!("/production/batches/{batch_id}/complete"), None)
            .await
    }

    pub async fn run_out(&self, batch_id: Uuid) -> ProductionBatch {
        self.expect_json(reqwest::Method::POST, &format!("/production/batches/{batch_id}/runout"), None)
            .await
    }

    pub async fn stock_of(&self, item_id: Uuid, location_id: Uuid) -> Decimal {
        let stock: Vec<CurrentStock> = self
            .expect_json(reqwest::Method::GET, &format!("/inventory/items/{item_id}/stock"), None)
            .await;
        stock
            .into_iter()
            .find(|s| s.location_id == location_id)
            .map(|s| s.quantity)
            .unwrap_or_default()
    }
}
