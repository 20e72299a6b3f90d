//! # Snehband Common Library
//!
//! Shared code for the Snehband Pandharpur 2025 registration service:
//! - Configuration loading (TOML + environment)
//! - Database schema, models and queries
//! - CSV import with Marathi/English header mapping and field normalisation
//! - PDF roster and detail-sheet export
//! - QR payload and registration e-mail template

pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod export;
pub mod import;
pub mod qr;

pub use error::{Error, Result};
