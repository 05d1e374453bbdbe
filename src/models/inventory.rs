// src/models/inventory.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_not_negative, validate_positive};
use super::location::Location;

// --- 1. Categorias do catálogo ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "inventory_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryCategory {
    Base,
    MixIn, // Vira "MIX_IN"
    Packaging,
    Beverage,
}

impl InventoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCategory::Base => "BASE",
            InventoryCategory::MixIn => "MIX_IN",
            InventoryCategory::Packaging => "PACKAGING",
            InventoryCategory::Beverage => "BEVERAGE",
        }
    }
}

impl fmt::Display for InventoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- 2. Itens do catálogo ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: InventoryCategory,
    pub unit: String,
    pub par_stock_level: Decimal,
    pub default_location_id: Option<Uuid>,
    pub sku: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Payload de criação e de atualização (PUT substitui os campos editáveis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemRequest {
    #[validate(custom(function = "validate_not_blank", message = "Name is required."))]
    pub name: String,

    pub category: InventoryCategory,

    #[validate(custom(function = "validate_not_blank", message = "Unit is required."))]
    pub unit: String,

    #[validate(custom(function = "validate_positive"))]
    pub par_stock_level: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// --- 3. Sessões de contagem ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "session_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Draft,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Draft => "DRAFT",
            SessionStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySession {
    pub id: Uuid,
    pub location_id: Uuid,
    pub started_by: Uuid,
    pub started_at: DateTime<Utc>,
    pub closed_by: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub notes: Option<String>,

    // Preenchido pelo service, não é coluna
    #[sqlx(skip)]
    #[serde(default)]
    pub lines: Vec<InventorySessionLine>,
}

impl InventorySession {
    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySessionLine {
    pub id: Uuid,
    pub session_id: Uuid,
    pub item_id: Uuid,
    pub count: Decimal,
    pub unit: String,
    pub note: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub location_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionLineRequest {
    pub item_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub count: Decimal,

    #[validate(custom(function = "validate_not_blank", message = "Unit is required."))]
    pub unit: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// --- 4. Saldo atual (item x local) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStock {
    pub id: Uuid,
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub quantity: Decimal,
    pub last_updated: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<InventoryItem>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl CurrentStock {
    /// Abaixo do par: só faz sentido quando o item veio junto.
    pub fn is_below_par(&self) -> bool {
        self.item
            .as_ref()
            .is_some_and(|item| self.quantity < item.par_stock_level)
    }
}

// --- 5. Snapshots (histórico de contagens avulsas) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub recorded_by: Uuid,
    pub recorded_at: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<InventoryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshotRequest {
    pub item_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshotBatchRequest {
    pub snapshots: Vec<RecordSnapshotRequest>,
}
