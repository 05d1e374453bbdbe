// src/models/location.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::validate_not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "location_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Shop,
    Truck,
    Freezer,
    Storage,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Shop => "SHOP",
            LocationType::Truck => "TRUCK",
            LocationType::Freezer => "FREEZER",
            LocationType::Storage => "STORAGE",
        }
    }

    // Lotes só podem ser guardados em freezers ou no estoque
    pub fn holds_batches(&self) -> bool {
        matches!(self, LocationType::Freezer | LocationType::Storage)
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// O local físico (loja, caminhão, freezer, estoque)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    #[validate(custom(function = "validate_not_blank", message = "Name is required."))]
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub parent_id: Option<Uuid>,
}
