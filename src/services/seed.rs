// src/services/seed.rs

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    config::AppState,
    db::ItemFilter,
    models::{
        auth::{CreateUserRequest, Role},
        inventory::{InventoryCategory, InventoryItemRequest},
        location::{CreateLocationRequest, LocationType},
    },
};

const LOCATIONS: &[(&str, LocationType)] = &[
    ("Main Shop", LocationType::Shop),
    ("Truck 1", LocationType::Truck),
    ("Truck 2", LocationType::Truck),
    ("Freezer A", LocationType::Freezer),
    ("Freezer B", LocationType::Freezer),
    ("Main Storage", LocationType::Storage),
];

// (nome, e-mail, senha, papel)
pub const DEFAULT_USERS: &[(&str, &str, &str, Role)] = &[
    ("Admin User", "admin@sweetswirls.com", "admin123", Role::Admin),
    ("Production Lead", "production@sweetswirls.com", "production123", Role::ProductionLead),
    ("Shift Lead", "shift@sweetswirls.com", "shift123", Role::ShiftLead),
    ("Team Member", "team@sweetswirls.com", "team123", Role::TeamMember),
];

// (nome, categoria, unidade, par, sku, notas)
const ITEMS: &[(&str, InventoryCategory, &str, i64, &str, Option<&str>)] = &[
    ("Vanilla Base", InventoryCategory::Base, "gallons", 10, "VAN-BASE-001", Some("Primary vanilla ice cream base")),
    ("Chocolate Base", InventoryCategory::Base, "gallons", 8, "CHOC-BASE-001", Some("Rich chocolate ice cream base")),
    ("Chocolate Chips", InventoryCategory::MixIn, "lbs", 5, "CHOC-CHIP-001", None),
    ("Caramel Swirl", InventoryCategory::MixIn, "quarts", 12, "CAR-SWIRL-001", None),
    ("Pint Containers", InventoryCategory::Packaging, "pieces", 200, "PINT-CONT-001", None),
    ("Quart Containers", InventoryCategory::Packaging, "pieces", 100, "QUART-CONT-001", None),
    ("Bottled Water", InventoryCategory::Beverage, "cases", 5, "WATER-001", None),
];

/// Quantas linhas de cada tipo foram criadas.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub locations: usize,
    pub users: usize,
    pub items: usize,
}

/// Popula locais, usuários e itens de exemplo. Cada grupo só é criado se a
/// tabela correspondente estiver vazia, então rodar de novo não duplica nada.
pub async fn seed_default_data(state: &AppState) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    if state.location_service.list(None).await?.is_empty() {
        for (name, location_type) in LOCATIONS {
            state
                .location_service
                .create(&CreateLocationRequest {
                    name: name.to_string(),
                    location_type: *location_type,
                    parent_id: None,
                })
                .await?;
            report.locations += 1;
        }
        tracing::info!("Initialized {} locations", report.locations);
    }

    if !state.auth_service.has_users().await? {
        for (name, email, password, role) in DEFAULT_USERS {
            state
                .auth_service
                .create_user(&CreateUserRequest {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    role: *role,
                })
                .await?;
            report.users += 1;
        }
        tracing::info!("Initialized {} users", report.users);
    }

    let existing_items = state.inventory_service.list_items(ItemFilter::default()).await?;
    if existing_items.is_empty() {
        let main_shop = state
            .location_service
            .list(Some(LocationType::Shop))
            .await?
            .into_iter()
            .next();

        if let Some(main_shop) = main_shop {
            for (name, category, unit, par, sku, notes) in ITEMS {
                state
                    .inventory_service
                    .create_item(&InventoryItemRequest {
                        name: name.to_string(),
                        category: *category,
                        unit: unit.to_string(),
                        par_stock_level: Decimal::from(*par),
                        default_location_id: Some(main_shop.id),
                        sku: Some(sku.to_string()),
                        notes: notes.map(str::to_string),
                    })
                    .await?;
                report.items += 1;
            }
            tracing::info!("Initialized {} sample inventory items", report.items);
        }
    }

    Ok(report)
}
