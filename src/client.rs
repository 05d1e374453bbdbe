// src/client.rs

//! Cliente HTTP tipado da API, mais o estado de tela usado pelo `swirls`.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod pages;
pub mod session;

use std::{collections::BTreeMap, env, path::PathBuf, sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    auth::{CreateUserRequest, LoginRequest, LoginResponse, Role, UpdateRoleRequest, User},
    inventory::{
        AddSessionLineRequest, CloseSessionRequest, CreateSessionRequest, CurrentStock,
        InventoryItem, InventoryItemRequest, InventorySession, InventorySessionLine,
        InventorySnapshot, RecordSnapshotBatchRequest, RecordSnapshotRequest,
    },
    location::{CreateLocationRequest, Location, LocationType},
    production::{
        BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, ProductionBatch,
        ProductionRequest, RecordWasteRequest, RequestStatus, UpdateRequestStatusRequest,
        WasteEvent,
    },
};

pub use dashboard::DashboardData;
pub use error::ClientError;
pub use session::{FileStorage, MemoryStorage, Session, Storage};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
}

impl ClientConfig {
    /// `SWEETSWIRLS_API_URL` e `SWEETSWIRLS_SESSION_FILE`, com `.env` via dotenvy.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_url = env::var("SWEETSWIRLS_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let session_file = env::var("SWEETSWIRLS_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_file());

        Self { api_url, session_file, timeout: Duration::from_secs(15) }
    }

    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            session_file: default_session_file(),
            timeout: Duration::from_secs(15),
        }
    }
}

fn default_session_file() -> PathBuf {
    let mut path = dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("sweet-swirls");
    path.push("session.json");
    path
}

// Corpo de erro do servidor: { "error": ..., "details": ... }
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Option<BTreeMap<String, Vec<String>>>,
}

/// Um método por operação do servidor. O header `Authorization` sai da
/// `Session` injetada; um 401 limpa a sessão.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.check(builder.send().await?).await?;
        Ok(())
    }

    async fn check(&self, response: Response) -> Result<Response, ClientError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.error_from(response).await)
    }

    async fn error_from(&self, response: Response) -> ClientError {
        let status = response.status();
        let body: ErrorBody = response.json().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::info!("sessão rejeitada pelo servidor, limpando");
                self.session.clear();
                ClientError::Unauthorized
            }
            StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation {
                message: body.error,
                fields: body.details.unwrap_or_default(),
            },
            _ => ClientError::Http {
                status: status.as_u16(),
                message: if body.error.is_empty() {
                    status.canonical_reason().unwrap_or("Request failed").to_string()
                } else {
                    body.error
                },
            },
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
    ) -> Result<T, ClientError> {
        let pairs: Vec<(&str, &String)> = query
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (*key, v)))
            .collect();
        self.send(self.request(Method::GET, path).query(&pairs)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path)).await
    }

    // --- Auth ---

    /// 401 aqui significa credencial errada, não sessão expirada.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(credentials)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::InvalidCredentials);
        }
        let response = self.check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get("/health").await
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        self.get("/auth/me").await
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, ClientError> {
        self.get_with("/auth/users", &[("role", role.map(|r| r.to_string()))]).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ClientError> {
        self.get(&format!("/auth/users/{id}")).await
    }

    pub async fn create_user(&self, payload: &CreateUserRequest) -> Result<User, ClientError> {
        self.post("/auth/users", payload).await
    }

    pub async fn update_user_role(&self, id: Uuid, role: Role) -> Result<User, ClientError> {
        let builder = self
            .request(Method::PATCH, &format!("/auth/users/{id}/role"))
            .json(&UpdateRoleRequest { role });
        self.send(builder).await
    }

    pub async fn deactivate_user(&self, id: Uuid) -> Result<User, ClientError> {
        self.send(self.request(Method::PATCH, &format!("/auth/users/{id}/deactivate"))).await
    }

    pub async fn activate_user(&self, id: Uuid) -> Result<User, ClientError> {
        self.send(self.request(Method::PATCH, &format!("/auth/users/{id}/activate"))).await
    }

    // --- Locais ---

    pub async fn list_locations(
        &self,
        location_type: Option<LocationType>,
    ) -> Result<Vec<Location>, ClientError> {
        self.get_with("/locations", &[("type", location_type.map(|t| t.to_string()))])
            .await
    }

    pub async fn get_location(&self, id: Uuid) -> Result<Location, ClientError> {
        self.get(&format!("/locations/{id}")).await
    }

    pub async fn create_location(
        &self,
        payload: &CreateLocationRequest,
    ) -> Result<Location, ClientError> {
        self.post("/locations", payload).await
    }

    // --- Itens ---

    /// `active = None` deixa o servidor usar o padrão (só ativos).
    pub async fn list_items(
        &self,
        active: Option<bool>,
        location: Option<Uuid>,
    ) -> Result<Vec<InventoryItem>, ClientError> {
        self.get_with(
            "/inventory/items",
            &[
                ("active", active.map(|a| a.to_string())),
                ("location", location.map(|l| l.to_string())),
            ],
        )
        .await
    }

    pub async fn get_item(&self, id: Uuid) -> Result<InventoryItem, ClientError> {
        self.get(&format!("/inventory/items/{id}")).await
    }

    pub async fn create_item(
        &self,
        payload: &InventoryItemRequest,
    ) -> Result<InventoryItem, ClientError> {
        self.post("/inventory/items", payload).await
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        payload: &InventoryItemRequest,
    ) -> Result<InventoryItem, ClientError> {
        let builder = self.request(Method::PUT, &format!("/inventory/items/{id}")).json(payload);
        self.send(builder).await
    }

    pub async fn delete_item(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/inventory/items/{id}")))
            .await
    }

    pub async fn item_stock(&self, id: Uuid) -> Result<Vec<CurrentStock>, ClientError> {
        self.get(&format!("/inventory/items/{id}/stock")).await
    }

    // --- Saldo ---

    pub async fn current_stock(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<CurrentStock>, ClientError> {
        self.get_with("/inventory/current", &[("locationId", location_id.map(|l| l.to_string()))])
            .await
    }

    pub async fn below_par(&self, location_id: Option<Uuid>) -> Result<Vec<CurrentStock>, ClientError> {
        self.get_with(
            "/inventory/current/below-par",
            &[("locationId", location_id.map(|l| l.to_string()))],
        )
        .await
    }

    // --- Sessões de contagem ---

    pub async fn list_sessions(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<InventorySession>, ClientError> {
        self.get_with("/inventory/sessions", &[("locationId", location_id.map(|l| l.to_string()))])
            .await
    }

    pub async fn get_session(&self, id: Uuid) -> Result<InventorySession, ClientError> {
        self.get(&format!("/inventory/sessions/{id}")).await
    }

    pub async fn get_session_lines(&self, id: Uuid) -> Result<Vec<InventorySessionLine>, ClientError> {
        self.get(&format!("/inventory/sessions/{id}/lines")).await
    }

    pub async fn start_session(&self, location_id: Uuid) -> Result<InventorySession, ClientError> {
        self.post("/inventory/sessions", &CreateSessionRequest { location_id }).await
    }

    pub async fn add_session_line(
        &self,
        session_id: Uuid,
        payload: &AddSessionLineRequest,
    ) -> Result<InventorySessionLine, ClientError> {
        self.post(&format!("/inventory/sessions/{session_id}/lines"), payload).await
    }

    pub async fn add_session_lines(
        &self,
        session_id: Uuid,
        payload: &[AddSessionLineRequest],
    ) -> Result<Vec<InventorySessionLine>, ClientError> {
        self.post(&format!("/inventory/sessions/{session_id}/lines/batch"), payload)
            .await
    }

    pub async fn close_session(
        &self,
        session_id: Uuid,
        notes: Option<String>,
    ) -> Result<InventorySession, ClientError> {
        self.post(
            &format!("/inventory/sessions/{session_id}/close"),
            &CloseSessionRequest { notes },
        )
        .await
    }

    // --- Snapshots ---

    pub async fn record_snapshot(
        &self,
        payload: &RecordSnapshotRequest,
    ) -> Result<InventorySnapshot, ClientError> {
        self.post("/inventory/snapshots", payload).await
    }

    pub async fn record_snapshots(
        &self,
        snapshots: Vec<RecordSnapshotRequest>,
    ) -> Result<Vec<InventorySnapshot>, ClientError> {
        self.post("/inventory/snapshots/batch", &RecordSnapshotBatchRequest { snapshots })
            .await
    }

    pub async fn list_snapshots(&self) -> Result<Vec<InventorySnapshot>, ClientError> {
        self.get("/inventory/snapshots").await
    }

    pub async fn current_snapshots(&self) -> Result<Vec<InventorySnapshot>, ClientError> {
        self.get("/inventory/snapshots/current").await
    }

    pub async fn item_snapshots(&self, item_id: Uuid) -> Result<Vec<InventorySnapshot>, ClientError> {
        self.get(&format!("/inventory/snapshots/{item_id}")).await
    }

    pub async fn snapshot_minutes(&self) -> Result<Vec<DateTime<Utc>>, ClientError> {
        self.get("/inventory/snapshots/sessions").await
    }

    pub async fn snapshots_in_minute(
        &self,
        recorded_at: DateTime<Utc>,
    ) -> Result<Vec<InventorySnapshot>, ClientError> {
        self.get_with(
            "/inventory/snapshots/session",
            &[("recordedAt", Some(recorded_at.to_rfc3339()))],
        )
        .await
    }

    // --- Pedidos de produção ---

    pub async fn list_requests(
        &self,
        status: Option<RequestStatus>,
        location_id: Option<Uuid>,
    ) -> Result<Vec<ProductionRequest>, ClientError> {
        self.get_with(
            "/production/requests",
            &[
                ("status", status.map(|s| s.to_string())),
                ("locationId", location_id.map(|l| l.to_string())),
            ],
        )
        .await
    }

    pub async fn overdue_requests(&self) -> Result<Vec<ProductionRequest>, ClientError> {
        self.get("/production/requests/overdue").await
    }

    pub async fn get_request(&self, id: Uuid) -> Result<ProductionRequest, ClientError> {
        self.get(&format!("/production/requests/{id}")).await
    }

    pub async fn create_request(
        &self,
        payload: &CreateProductionRequestRequest,
    ) -> Result<ProductionRequest, ClientError> {
        self.post("/production/requests", payload).await
    }

    pub async fn update_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        notes: Option<String>,
    ) -> Result<ProductionRequest, ClientError> {
        let builder = self
            .request(Method::PATCH, &format!("/production/requests/{id}"))
            .json(&UpdateRequestStatusRequest { status, notes });
        self.send(builder).await
    }

    pub async fn start_request(&self, id: Uuid) -> Result<ProductionRequest, ClientError> {
        self.post_empty(&format!("/production/requests/{id}/start")).await
    }

    pub async fn complete_request(&self, id: Uuid) -> Result<ProductionRequest, ClientError> {
        self.post_empty(&format!("/production/requests/{id}/complete")).await
    }

    pub async fn archive_request(&self, id: Uuid) -> Result<ProductionRequest, ClientError> {
        self.post_empty(&format!("/production/requests/{id}/archive")).await
    }

    pub async fn delete_request(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/production/requests/{id}")))
            .await
    }

    // --- Lotes ---

    pub async fn list_batches(
        &self,
        status: Option<BatchStatus>,
    ) -> Result<Vec<ProductionBatch>, ClientError> {
        self.get_with("/production/batches", &[("status", status.map(|s| s.to_string()))])
            .await
    }

    pub async fn get_batch(&self, id: Uuid) -> Result<ProductionBatch, ClientError> {
        self.get(&format!("/production/batches/{id}")).await
    }

    pub async fn create_batch(
        &self,
        payload: &CreateBatchRequest,
    ) -> Result<ProductionBatch, ClientError> {
        self.post("/production/batches", payload).await
    }

    pub async fn complete_batch(&self, id: Uuid) -> Result<ProductionBatch, ClientError> {
        self.post_empty(&format!("/production/batches/{id}/complete")).await
    }

    pub async fn run_out_batch(&self, id: Uuid) -> Result<ProductionBatch, ClientError> {
        self.post_empty(&format!("/production/batches/{id}/runout")).await
    }

    pub async fn batch_waste(&self, id: Uuid) -> Result<Vec<WasteEvent>, ClientError> {
        self.get(&format!("/production/batches/{id}/waste")).await
    }

    // --- Desperdício ---

    pub async fn list_waste(
        &self,
        batch_id: Option<Uuid>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<WasteEvent>, ClientError> {
        self.get_with(
            "/production/waste",
            &[
                ("batchId", batch_id.map(|b| b.to_string())),
                ("itemId", item_id.map(|i| i.to_string())),
            ],
        )
        .await
    }

    pub async fn record_waste(&self, payload: &RecordWasteRequest) -> Result<WasteEvent, ClientError> {
        self.post("/production/waste", payload).await
    }

    // --- Dashboard ---

    /// Quatro buscas em paralelo; qualquer falha derruba o painel inteiro.
    pub async fn get_dashboard_data(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<DashboardData, ClientError> {
        let (stock, requests, batches, waste) = tokio::try_join!(
            self.current_stock(None),
            self.list_requests(Some(RequestStatus::Open), None),
            self.list_batches(None),
            self.list_waste(None, None),
        )?;
        Ok(dashboard::summarize(stock, requests, batches, waste, now))
    }
}
