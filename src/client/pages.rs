// src/client/pages.rs

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    client::{
        dashboard::DashboardData,
        error::ClientError,
        forms::{validate_form, validate_production_request, FormErrors},
        session::Session,
        ApiClient,
    },
    models::{
        auth::User,
        inventory::{
            AddSessionLineRequest, InventoryItem, InventoryItemRequest, InventorySession,
            InventorySessionLine,
        },
        location::Location,
        production::{
            BatchStatus, CreateBatchRequest, CreateProductionRequestRequest, ProductionBatch,
            ProductionRequest, RecordWasteRequest, RequestStatus, WasteEvent,
        },
        rbac::Capability,
    },
};

pub const IMMUTABLE_NOTICE: &str = "This session is closed. Counts can no longer be changed.";

/// Estado de carregamento de uma página.
#[derive(Debug, Clone, PartialEq)]
pub enum PageState<T> {
    Loading,
    Ready(T),
    Failed(String),
    RedirectToLogin,
}

impl<T> PageState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            PageState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            PageState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, PageState::RedirectToLogin)
    }

    fn from_result(result: Result<T, ClientError>, action: &str, subject: &str) -> Self {
        match result {
            Ok(data) => PageState::Ready(data),
            Err(ClientError::Unauthorized) => PageState::RedirectToLogin,
            Err(e) => {
                tracing::warn!(error = %e, "falha ao carregar {subject}");
                PageState::Failed(e.user_message(action, subject))
            }
        }
    }
}

/// Falha de uma ação (criar, fechar, transicionar...).
#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    Form(FormErrors),
    Failed(String),
    RedirectToLogin,
}

impl ActionError {
    fn from_client(err: ClientError, action: &str, subject: &str) -> Self {
        match err {
            ClientError::Unauthorized => ActionError::RedirectToLogin,
            ClientError::Validation { fields, .. } if !fields.is_empty() => {
                ActionError::Form(FormErrors::from_server(&fields))
            }
            e => ActionError::Failed(e.user_message(action, subject)),
        }
    }
}

impl From<FormErrors> for ActionError {
    fn from(errors: FormErrors) -> Self {
        ActionError::Form(errors)
    }
}

// Um 401 numa ação também derruba a página para o login
fn settle<T, U>(
    state: &mut PageState<U>,
    result: Result<T, ClientError>,
    action: &str,
    subject: &str,
) -> Result<T, ActionError> {
    result.map_err(|e| {
        let err = ActionError::from_client(e, action, subject);
        if err == ActionError::RedirectToLogin {
            *state = PageState::RedirectToLogin;
        }
        err
    })
}

fn current_user_can(api: &ApiClient, capability: Capability) -> bool {
    api.session().user().is_some_and(|user| capability.allows(user.role))
}

/// "8 gallons" (sem zeros à direita).
pub fn format_quantity(quantity: Decimal, unit: &str) -> String {
    format!("{} {}", quantity.normalize(), unit)
}

// ---
// Inventário
// ---

pub struct InventoryPage {
    api: ApiClient,
    pub state: PageState<Vec<InventoryItem>>,
}

impl InventoryPage {
    pub fn new(api: ApiClient) -> Self {
        Self { api, state: PageState::Loading }
    }

    pub async fn load(&mut self) {
        self.state = PageState::Loading;
        let result = self.api.list_items(None, None).await;
        self.state = PageState::from_result(result, "load", "inventory items");
    }

    pub fn items(&self) -> &[InventoryItem] {
        self.state.data().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn search(&self, query: &str) -> Vec<&InventoryItem> {
        search_items(self.items(), query)
    }

    pub fn can_manage(&self) -> bool {
        current_user_can(&self.api, Capability::ManageInventory)
    }

    pub async fn create(&mut self, form: &InventoryItemRequest) -> Result<InventoryItem, ActionError> {
        validate_form(form)?;
        let result = self.api.create_item(form).await;
        let item = settle(&mut self.state, result, "create", "inventory item")?;

        if let Some(items) = self.state.data_mut() {
            items.push(item.clone());
            items.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(item)
    }

    pub async fn update(
        &mut self,
        id: Uuid,
        form: &InventoryItemRequest,
    ) -> Result<InventoryItem, ActionError> {
        validate_form(form)?;
        let result = self.api.update_item(id, form).await;
        let item = settle(&mut self.state, result, "update", "inventory item")?;

        if let Some(slot) = self
            .state
            .data_mut()
            .and_then(|items| items.iter_mut().find(|i| i.id == id))
        {
            *slot = item.clone();
        }
        Ok(item)
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<(), ActionError> {
        let result = self.api.delete_item(id).await;
        settle(&mut self.state, result, "delete", "inventory item")?;

        if let Some(items) = self.state.data_mut() {
            items.retain(|i| i.id != id);
        }
        Ok(())
    }
}

/// Busca sem diferenciar maiúsculas em nome, SKU e categoria.
pub fn search_items<'a>(items: &'a [InventoryItem], query: &str) -> Vec<&'a InventoryItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.sku.as_deref().is_some_and(|sku| sku.to_lowercase().contains(&needle))
                || item.category.as_str().to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn item_card(item: &InventoryItem) -> String {
    let mut card = format!("{} ({})", item.name, item.category);
    if let Some(sku) = &item.sku {
        card.push_str(&format!("\n  SKU: {sku}"));
    }
    card.push_str(&format!("\n  Par: {}", format_quantity(item.par_stock_level, &item.unit)));
    if let Some(notes) = &item.notes {
        card.push_str(&format!("\n  {notes}"));
    }
    card
}

// ---
// Sessões de contagem
// ---

#[derive(Debug, Clone, PartialEq)]
pub struct SessionsData {
    pub sessions: Vec<InventorySession>,
    pub items: Vec<InventoryItem>,
    pub locations: Vec<Location>,
}

pub struct SessionsPage {
    api: ApiClient,
    pub state: PageState<SessionsData>,
    pub current: Option<InventorySession>,
}

/// Sessões fechadas são somente leitura.
pub fn can_edit(session: &InventorySession) -> bool {
    !session.is_closed()
}

pub fn session_notice(session: &InventorySession) -> Option<&'static str> {
    session.is_closed().then_some(IMMUTABLE_NOTICE)
}

impl SessionsPage {
    pub fn new(api: ApiClient) -> Self {
        Self { api, state: PageState::Loading, current: None }
    }

    pub async fn load(&mut self) {
        self.state = PageState::Loading;
        let result = tokio::try_join!(
            self.api.list_sessions(None),
            self.api.list_items(None, None),
            self.api.list_locations(None),
        )
        .map(|(sessions, items, locations)| SessionsData { sessions, items, locations });
        self.state = PageState::from_result(result, "load", "inventory sessions");
    }

    pub fn sessions(&self) -> &[InventorySession] {
        self.state.data().map(|d| d.sessions.as_slice()).unwrap_or_default()
    }

    pub fn can_take_inventory(&self) -> bool {
        current_user_can(&self.api, Capability::TakeInventory)
    }

    pub fn item_name(&self, id: Uuid) -> Option<&str> {
        self.state
            .data()
            .and_then(|d| d.items.iter().find(|i| i.id == id))
            .map(|i| i.name.as_str())
    }

    pub fn location_name(&self, id: Uuid) -> Option<&str> {
        self.state
            .data()
            .and_then(|d| d.locations.iter().find(|l| l.id == id))
            .map(|l| l.name.as_str())
    }

    pub async fn start(&mut self, location_id: Uuid) -> Result<InventorySession, ActionError> {
        let result = self.api.start_session(location_id).await;
        let session = settle(&mut self.state, result, "start", "inventory session")?;

        if let Some(data) = self.state.data_mut() {
            data.sessions.insert(0, session.clone());
        }
        self.current = Some(session.clone());
        Ok(session)
    }

    pub async fn open(&mut self, id: Uuid) -> Result<&InventorySession, ActionError> {
        let result = self.api.get_session(id).await;
        let session = settle(&mut self.state, result, "load", "inventory session")?;
        Ok(self.current.insert(session))
    }

    fn editable_current(&self) -> Result<Uuid, ActionError> {
        match &self.current {
            None => Err(ActionError::Failed("Select a session first.".into())),
            Some(session) if !can_edit(session) => Err(ActionError::Failed(IMMUTABLE_NOTICE.into())),
            Some(session) => Ok(session.id),
        }
    }

    pub async fn add_line(
        &mut self,
        form: &AddSessionLineRequest,
    ) -> Result<InventorySessionLine, ActionError> {
        let session_id = self.editable_current()?;
        validate_form(form)?;

        let result = self.api.add_session_line(session_id, form).await;
        let line = settle(&mut self.state, result, "add", "count line")?;

        if let Some(current) = self.current.as_mut() {
            current.lines.push(line.clone());
        }
        Ok(line)
    }

    pub async fn close(&mut self, notes: Option<String>) -> Result<InventorySession, ActionError> {
        let session_id = self.editable_current()?;

        let result = self.api.close_session(session_id, notes).await;
        let closed = settle(&mut self.state, result, "close", "inventory session")?;

        if let Some(slot) = self
            .state
            .data_mut()
            .and_then(|d| d.sessions.iter_mut().find(|s| s.id == session_id))
        {
            *slot = closed.clone();
        }
        self.current = Some(closed.clone());
        Ok(closed)
    }
}

// ---
// Produção
// ---

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionData {
    pub requests: Vec<ProductionRequest>,
    pub batches: Vec<ProductionBatch>,
}

pub struct ProductionPage {
    api: ApiClient,
    pub state: PageState<ProductionData>,
}

/// Próximos status oferecidos na tela para um pedido.
pub fn request_actions(request: &ProductionRequest) -> Vec<RequestStatus> {
    [RequestStatus::InProgress, RequestStatus::Completed, RequestStatus::Archived]
        .into_iter()
        .filter(|next| request.status.can_transition_to(*next))
        .collect()
}

impl ProductionPage {
    pub fn new(api: ApiClient) -> Self {
        Self { api, state: PageState::Loading }
    }

    pub async fn load(&mut self) {
        self.state = PageState::Loading;
        let result = tokio::try_join!(self.api.list_requests(None, None), self.api.list_batches(None))
            .map(|(requests, batches)| ProductionData { requests, batches });
        self.state = PageState::from_result(result, "load", "production data");
    }

    pub fn can_manage(&self) -> bool {
        current_user_can(&self.api, Capability::ManageProduction)
    }

    pub fn can_record_batches(&self) -> bool {
        current_user_can(&self.api, Capability::RecordBatches)
    }

    pub async fn create_request(
        &mut self,
        form: &CreateProductionRequestRequest,
        now: DateTime<Utc>,
    ) -> Result<ProductionRequest, ActionError> {
        validate_production_request(form, now)?;
        let result = self.api.create_request(form).await;
        let request = settle(&mut self.state, result, "create", "production request")?;

        if let Some(data) = self.state.data_mut() {
            data.requests.insert(0, request.clone());
        }
        Ok(request)
    }

    pub async fn transition_request(
        &mut self,
        id: Uuid,
        to: RequestStatus,
    ) -> Result<ProductionRequest, ActionError> {
        let result = match to {
            RequestStatus::InProgress => self.api.start_request(id).await,
            RequestStatus::Completed => self.api.complete_request(id).await,
            RequestStatus::Archived => self.api.archive_request(id).await,
            RequestStatus::Open => self.api.update_request_status(id, to, None).await,
        };
        let request = settle(&mut self.state, result, "update", "production request")?;
        self.replace_request(&request);
        Ok(request)
    }

    pub async fn delete_request(&mut self, id: Uuid) -> Result<(), ActionError> {
        let result = self.api.delete_request(id).await;
        settle(&mut self.state, result, "delete", "production request")?;
        if let Some(data) = self.state.data_mut() {
            data.requests.retain(|r| r.id != id);
        }
        Ok(())
    }

    pub async fn create_batch(&mut self, form: &CreateBatchRequest) -> Result<ProductionBatch, ActionError> {
        validate_form(form)?;
        let result = self.api.create_batch(form).await;
        let batch = settle(&mut self.state, result, "record", "production batch")?;

        if let Some(data) = self.state.data_mut() {
            data.batches.insert(0, batch.clone());
        }
        Ok(batch)
    }

    pub async fn complete_batch(&mut self, id: Uuid) -> Result<ProductionBatch, ActionError> {
        let result = self.api.complete_batch(id).await;
        let batch = settle(&mut self.state, result, "complete", "production batch")?;
        self.replace_batch(&batch);
        Ok(batch)
    }

    pub async fn run_out_batch(&mut self, id: Uuid) -> Result<ProductionBatch, ActionError> {
        let result = self.api.run_out_batch(id).await;
        let batch = settle(&mut self.state, result, "mark", "production batch as run out")?;
        self.replace_batch(&batch);
        Ok(batch)
    }

    fn replace_request(&mut self, request: &ProductionRequest) {
        if let Some(slot) = self
            .state
            .data_mut()
            .and_then(|d| d.requests.iter_mut().find(|r| r.id == request.id))
        {
            *slot = request.clone();
        }
    }

    fn replace_batch(&mut self, batch: &ProductionBatch) {
        if let Some(slot) = self
            .state
            .data_mut()
            .and_then(|d| d.batches.iter_mut().find(|b| b.id == batch.id))
        {
            *slot = batch.clone();
        }
    }
}

// ---
// Desperdício
// ---

#[derive(Debug, Clone, PartialEq)]
pub struct WasteData {
    pub events: Vec<WasteEvent>,
    pub batches: Vec<ProductionBatch>,
}

pub struct WastePage {
    api: ApiClient,
    pub state: PageState<WasteData>,
}

impl WastePage {
    pub fn new(api: ApiClient) -> Self {
        Self { api, state: PageState::Loading }
    }

    pub async fn load(&mut self) {
        self.state = PageState::Loading;
        let result = tokio::try_join!(self.api.list_waste(None, None), self.api.list_batches(None))
            .map(|(events, batches)| WasteData { events, batches });
        self.state = PageState::from_result(result, "load", "waste events");
    }

    /// Lotes esgotados não aparecem no seletor.
    pub fn selectable_batches(&self) -> Vec<&ProductionBatch> {
        self.state
            .data()
            .map(|d| d.batches.iter().filter(|b| b.status != BatchStatus::RunOut).collect())
            .unwrap_or_default()
    }

    pub async fn record(&mut self, form: &RecordWasteRequest) -> Result<WasteEvent, ActionError> {
        validate_form(form)?;
        let result = self.api.record_waste(form).await;
        let event = settle(&mut self.state, result, "record", "waste")?;

        if let Some(data) = self.state.data_mut() {
            data.events.insert(0, event.clone());
        }
        Ok(event)
    }
}

// ---
// Dashboard
// ---

pub struct DashboardPage {
    api: ApiClient,
    pub state: PageState<DashboardData>,
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    }
}

impl DashboardPage {
    pub fn new(api: ApiClient) -> Self {
        Self { api, state: PageState::Loading }
    }

    pub async fn load(&mut self, now: DateTime<FixedOffset>) {
        self.state = PageState::Loading;
        let result = self.api.get_dashboard_data(now).await;
        self.state = PageState::from_result(result, "load", "dashboard data");
    }

    pub fn headline(&self, now: DateTime<FixedOffset>) -> String {
        match self.api.session().user() {
            Some(user) => format!("{}, {}", greeting(now.hour()), user.name),
            None => greeting(now.hour()).to_string(),
        }
    }
}

// ---
// Navegação e rotas
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const NAV_ITEMS: &[(NavItem, Option<Capability>)] = &[
    (NavItem { label: "Dashboard", path: "/dashboard" }, None),
    (NavItem { label: "Inventory", path: "/inventory" }, Some(Capability::ViewInventory)),
    (NavItem { label: "Production", path: "/production" }, Some(Capability::ViewProduction)),
    (NavItem { label: "Users", path: "/users" }, Some(Capability::ManageUsers)),
    (NavItem { label: "Settings", path: "/settings" }, Some(Capability::ManageUsers)),
];

/// Entradas visíveis para o usuário; vazio quando ninguém está logado.
pub fn navigation(user: Option<&User>) -> Vec<NavItem> {
    let Some(user) = user else {
        return Vec::new();
    };
    NAV_ITEMS
        .iter()
        .filter(|(_, capability)| capability.is_none_or(|c| c.allows(user.role)))
        .map(|(item, _)| *item)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/inventory", "/production", "/users", "/settings"];

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

pub fn route_access(path: &str, session: &Session) -> RouteDecision {
    let user = session.user();

    if path == "/login" {
        return match user {
            Some(_) => RouteDecision::Redirect("/dashboard"),
            None => RouteDecision::Allow,
        };
    }
    if path == "/" {
        return RouteDecision::Redirect(if user.is_some() { "/dashboard" } else { "/login" });
    }
    if !PROTECTED_PREFIXES.iter().any(|prefix| matches_prefix(path, prefix)) {
        return RouteDecision::Allow;
    }

    let Some(user) = user else {
        return RouteDecision::Redirect("/login");
    };
    let admin_only = matches_prefix(path, "/users") || matches_prefix(path, "/settings");
    if admin_only && !Capability::ManageUsers.allows(user.role) {
        return RouteDecision::Redirect("/dashboard");
    }
    RouteDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::MemoryStorage,
        models::{auth::Role, inventory::{InventoryCategory, SessionStatus}},
    };
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Someone".into(),
            email: "someone@sweetswirls.com".into(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(name: &str, sku: Option<&str>, category: InventoryCategory) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            unit: "gallons".into(),
            par_stock_level: dec!(8.000),
            default_location_id: None,
            sku: sku.map(Into::into),
            notes: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn session(status: SessionStatus) -> InventorySession {
        InventorySession {
            id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            started_by: Uuid::new_v4(),
            started_at: Utc::now(),
            closed_by: None,
            closed_at: None,
            status,
            notes: None,
            lines: vec![],
        }
    }

    #[test]
    fn search_matches_name_sku_and_category_ignoring_case() {
        let items = vec![
            item("Vanilla Base", Some("VAN-BASE-001"), InventoryCategory::Base),
            item("Chocolate Chips", Some("CHOC-CHIP-001"), InventoryCategory::MixIn),
            item("Pint Containers", None, InventoryCategory::Packaging),
        ];
        assert_eq!(search_items(&items, "vanilla").len(), 1);
        assert_eq!(search_items(&items, "choc-chip")[0].name, "Chocolate Chips");
        assert_eq!(search_items(&items, "packaging")[0].name, "Pint Containers");
        assert_eq!(search_items(&items, "  ").len(), 3);
        assert!(search_items(&items, "strawberry").is_empty());
    }

    #[test]
    fn item_card_shows_sku_and_par_with_unit() {
        let card = item_card(&item("Test Strawberry Base", Some("STRAWB-001"), InventoryCategory::Base));
        assert!(card.contains("STRAWB-001"));
        assert!(card.contains("8 gallons"));
    }

    #[test]
    fn closed_sessions_are_read_only() {
        let draft = session(SessionStatus::Draft);
        let closed = session(SessionStatus::Closed);
        assert!(can_edit(&draft));
        assert_eq!(session_notice(&draft), None);
        assert!(!can_edit(&closed));
        assert_eq!(session_notice(&closed), Some(IMMUTABLE_NOTICE));
    }

    #[test]
    fn greeting_follows_the_hour() {
        assert_eq!(greeting(7), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(20), "Good evening");
    }

    #[test]
    fn only_admin_sees_users_and_settings() {
        for role in Role::ALL {
            let user = user(role);
            let labels: Vec<_> = navigation(Some(&user)).iter().map(|n| n.label).collect();
            assert_eq!(labels[..3], ["Dashboard", "Inventory", "Production"]);
            assert_eq!(labels.contains(&"Users"), role == Role::Admin, "{role}");
            assert_eq!(labels.contains(&"Settings"), role == Role::Admin, "{role}");
        }
        assert!(navigation(None).is_empty());
    }

    #[test]
    fn protected_routes_redirect_to_login() {
        let anonymous = Session::new(MemoryStorage::default());
        assert_eq!(route_access("/login", &anonymous), RouteDecision::Allow);
        assert_eq!(route_access("/dashboard", &anonymous), RouteDecision::Redirect("/login"));
        assert_eq!(route_access("/inventory/sessions", &anonymous), RouteDecision::Redirect("/login"));
        assert_eq!(route_access("/production", &anonymous), RouteDecision::Redirect("/login"));
        assert_eq!(route_access("/inventoryx", &anonymous), RouteDecision::Allow);
    }

    #[test]
    fn logged_in_users_skip_the_login_page() {
        let session = Session::new(MemoryStorage::default());
        session.establish("jwt".into(), user(Role::TeamMember)).unwrap();
        assert_eq!(route_access("/login", &session), RouteDecision::Redirect("/dashboard"));
        assert_eq!(route_access("/inventory", &session), RouteDecision::Allow);
        assert_eq!(route_access("/users", &session), RouteDecision::Redirect("/dashboard"));
    }

    #[test]
    fn request_actions_follow_the_lifecycle() {
        let now = Utc::now();
        let mut request = ProductionRequest {
            id: Uuid::new_v4(),
            product_item_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            requested_by: Uuid::new_v4(),
            needed_by: now,
            target_quantity: dec!(5),
            unit: "gallons".into(),
            priority: Default::default(),
            reason: "Restock".into(),
            status: RequestStatus::Open,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(request_actions(&request), vec![RequestStatus::InProgress, RequestStatus::Archived]);
        request.status = RequestStatus::Archived;
        assert!(request_actions(&request).is_empty());
    }

    #[test]
    fn unauthorized_becomes_redirect_and_422_becomes_form_errors() {
        assert_eq!(
            ActionError::from_client(ClientError::Unauthorized, "load", "items"),
            ActionError::RedirectToLogin
        );

        let mut fields = BTreeMap::new();
        fields.insert("unit".to_string(), vec!["Unit is required.".to_string()]);
        let err = ActionError::from_client(
            ClientError::Validation { message: "invalid".into(), fields },
            "create",
            "item",
        );
        match err {
            ActionError::Form(errors) => assert_eq!(errors.get("unit"), Some("Unit is required.")),
            other => panic!("unexpected {other:?}"),
        }

        let state: PageState<()> = PageState::from_result(Err(ClientError::Unauthorized), "load", "items");
        assert!(state.is_redirect());
    }
}
