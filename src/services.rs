pub mod auth;
pub mod inventory_service;
pub mod location_service;
pub mod production_service;
pub mod seed;
pub mod snapshot_service;
