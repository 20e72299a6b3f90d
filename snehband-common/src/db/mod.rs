//! Database models and queries

pub mod init;
pub mod models;
pub mod profiles;
pub mod users;

pub use init::*;
pub use models::*;
