// src/models/production.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_not_negative, validate_positive};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "production_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Open,
    InProgress,
    Completed,
    Archived,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "OPEN",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Archived => "ARCHIVED",
        }
    }

    // OPEN -> IN_PROGRESS -> COMPLETED; tudo menos ARCHIVED pode ser arquivado
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Open, InProgress)
                | (InProgress, Completed)
                | (Open, Archived)
                | (InProgress, Archived)
                | (Completed, Archived)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "batch_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    InProgress,
    Completed,
    RunOut, // Vira "RUN_OUT"
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::InProgress => "IN_PROGRESS",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::RunOut => "RUN_OUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "waste_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WasteReason {
    Spoilage,
    TemperatureExcursion,
    QaFailure,
    Accident,
    Other,
}

impl WasteReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteReason::Spoilage => "SPOILAGE",
            WasteReason::TemperatureExcursion => "TEMPERATURE_EXCURSION",
            WasteReason::QaFailure => "QA_FAILURE",
            WasteReason::Accident => "ACCIDENT",
            WasteReason::Other => "OTHER",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Priority, RequestStatus, BatchStatus, WasteReason);

// --- Pedidos de produção ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRequest {
    pub id: Uuid,
    pub product_item_id: Uuid,
    pub location_id: Uuid,
    pub requested_by: Uuid,
    pub needed_by: DateTime<Utc>,
    pub target_quantity: Decimal,
    pub unit: String,
    pub priority: Priority,
    pub reason: String,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// `requestedBy` vem do token, não do payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductionRequestRequest {
    pub product_item_id: Uuid,
    pub location_id: Uuid,
    pub needed_by: DateTime<Utc>,

    #[validate(custom(function = "validate_not_negative"))]
    pub target_quantity: Decimal,

    #[validate(custom(function = "validate_not_blank", message = "Unit is required."))]
    pub unit: String,

    #[serde(default)]
    pub priority: Priority,

    #[validate(custom(function = "validate_not_blank", message = "Reason is required."))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestStatusRequest {
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// --- Lotes de produção ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionBatch {
    pub id: Uuid,
    pub product_item_id: Uuid,
    pub quantity_made: Decimal,
    pub unit: String,
    pub storage_location_id: Uuid,
    pub made_by: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub lot_code: String,
    pub notes: Option<String>,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    pub product_item_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    pub quantity_made: Decimal,

    #[validate(custom(function = "validate_not_blank", message = "Unit is required."))]
    pub unit: String,

    pub storage_location_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// --- Desperdício ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasteEvent {
    pub id: Uuid,
    pub batch_id: Option<Uuid>,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
    pub reason: WasteReason,
    pub recorded_by: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordWasteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,

    pub item_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_not_blank", message = "Unit is required."))]
    pub unit: String,

    pub reason: WasteReason,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    #[test]
    fn request_status_follows_the_forward_path() {
        assert!(Open.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!Open.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
    }

    #[test]
    fn archived_is_terminal() {
        for next in [Open, InProgress, Completed, Archived] {
            assert!(!Archived.can_transition_to(next));
        }
        for from in [Open, InProgress, Completed] {
            assert!(from.can_transition_to(Archived));
        }
    }

    #[test]
    fn waste_reasons_use_the_long_names() {
        let json = serde_json::to_string(&WasteReason::TemperatureExcursion).unwrap();
        assert_eq!(json, "\"TEMPERATURE_EXCURSION\"");
        let parsed: WasteReason = serde_json::from_str("\"QA_FAILURE\"").unwrap();
        assert_eq!(parsed, WasteReason::QaFailure);
    }

    #[test]
    fn priority_defaults_to_normal_when_missing() {
        let payload = serde_json::json!({
            "productItemId": Uuid::nil(),
            "locationId": Uuid::nil(),
            "neededBy": "2030-01-01T12:00:00Z",
            "targetQuantity": 4,
            "unit": "gallons",
            "reason": "Weekend rush"
        });
        let request: CreateProductionRequestRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(request.priority, Priority::Normal);
    }
}
