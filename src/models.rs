pub mod auth;
pub mod inventory;
pub mod location;
pub mod production;
pub mod rbac;
