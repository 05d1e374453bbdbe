// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::Stores,
    services::{
        auth::AuthService, inventory_service::InventoryService,
        location_service::LocationService, production_service::ProductionService,
        snapshot_service::SnapshotService,
    },
};

/// Configuração do servidor, lida do ambiente (com `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub seed_default_data: bool,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let seed_default_data = match env::var("SEED_DEFAULT_DATA") {
            Ok(value) => parse_flag(&value)
                .with_context(|| format!("SEED_DEFAULT_DATA inválido: {value}"))?,
            Err(_) => true,
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("BCRYPT_COST inválido: {value}"))?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            seed_default_data,
            bcrypt_cost,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Clone)]
pub struct AppState {
    // Só existe quando DATABASE_URL foi informada
    pub db_pool: Option<PgPool>,
    pub stores: Stores,
    pub auth_service: AuthService,
    pub location_service: LocationService,
    pub inventory_service: InventoryService,
    pub production_service: ProductionService,
    pub snapshot_service: SnapshotService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let Some(database_url) = &config.database_url else {
            tracing::warn!("DATABASE_URL não definida, usando armazenamento em memória");
            return Ok(Self::from_stores(Stores::in_memory(), config));
        };

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let mut state = Self::from_stores(Stores::postgres(db_pool.clone()), config);
        state.db_pool = Some(db_pool);
        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_stores(stores: Stores, config: &Config) -> Self {
        let auth_service = AuthService::new(
            stores.users.clone(),
            config.jwt_secret.clone(),
            config.bcrypt_cost,
        );
        let location_service = LocationService::new(stores.locations.clone());
        let inventory_service =
            InventoryService::new(stores.inventory.clone(), stores.locations.clone());
        let production_service = ProductionService::new(
            stores.production.clone(),
            stores.inventory.clone(),
            stores.locations.clone(),
        );
        let snapshot_service =
            SnapshotService::new(stores.snapshots.clone(), stores.inventory.clone());

        Self {
            db_pool: None,
            stores,
            auth_service,
            location_service,
            inventory_service,
            production_service,
            snapshot_service,
        }
    }
}
