//! HTTP API handlers

pub mod auth;
pub mod buildinfo;
pub mod checkin;
pub mod email;
pub mod export;
pub mod health;
pub mod import;
pub mod profiles;
pub mod register;
pub mod stats;
pub mod upload;
pub mod users;

pub use auth::{auth_middleware, CurrentUser};
pub use buildinfo::get_build_info;
pub use health::health_routes;
