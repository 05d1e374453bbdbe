// src/db/location_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::LocationStore;
use crate::{
    common::error::AppError,
    models::location::{CreateLocationRequest, Location, LocationType},
};

#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for LocationRepository {
    async fn list(&self, location_type: Option<LocationType>) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT * FROM locations
            WHERE is_active AND ($1::location_type IS NULL OR location_type = $1)
            ORDER BY name ASC
            "#,
        )
        .bind(location_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(location)
    }

    async fn create(&self, payload: &CreateLocationRequest) -> Result<Location, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, location_type, parent_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.location_type)
        .bind(payload.parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }
}
