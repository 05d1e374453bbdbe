// src/services/location_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LocationStore,
    models::location::{CreateLocationRequest, Location, LocationType},
};

#[derive(Clone)]
pub struct LocationService {
    location_repo: Arc<dyn LocationStore>,
}

impl LocationService {
    pub fn new(location_repo: Arc<dyn LocationStore>) -> Self {
        Self { location_repo }
    }

    pub async fn list(&self, location_type: Option<LocationType>) -> Result<Vec<Location>, AppError> {
        self.location_repo.list(location_type).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Location, AppError> {
        self.location_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Location"))
    }

    pub async fn create(&self, payload: &CreateLocationRequest) -> Result<Location, AppError> {
        if let Some(parent_id) = payload.parent_id {
            self.get(parent_id).await?;
        }
        let location = self.location_repo.create(payload).await?;
        tracing::info!(location_id = %location.id, kind = %location.location_type, "local criado");
        Ok(location)
    }
}
