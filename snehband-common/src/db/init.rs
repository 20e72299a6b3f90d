//! Database initialization
//!
//! Creates the database file and schema on first run; safe to call on an
//! existing database (all statements are idempotent).

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `settings`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the concurrent import upserts proceed alongside readers
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table and index used by the service
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_profiles_table(pool).await?;
    create_users_table(pool).await?;
    record_schema_version(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores application key-value pairs (schema version).
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the profiles table
pub async fn create_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            anubandh_id INTEGER PRIMARY KEY,
            id_synthetic INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL,
            mobile TEXT NOT NULL,
            gender TEXT CHECK (gender IN ('MALE', 'FEMALE')),
            attendee_count INTEGER NOT NULL DEFAULT 0,
            approved INTEGER NOT NULL DEFAULT 0,
            introduction INTEGER NOT NULL DEFAULT 0,
            checked_in_at TEXT,
            email TEXT,
            birth_date TEXT,
            birth_time TEXT,
            birth_place TEXT,
            education TEXT,
            occupation TEXT,
            current_address TEXT,
            permanent_address TEXT,
            photo_url TEXT,
            gotra TEXT,
            marital_status TEXT,
            complexion TEXT,
            height TEXT,
            blood_group TEXT,
            father_name TEXT,
            father_occupation TEXT,
            mother_name TEXT,
            mother_occupation TEXT,
            parent_mobile TEXT,
            partner_education TEXT,
            partner_location TEXT,
            partner_expectations TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_profiles_approved ON profiles(approved)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_profiles_mobile ON profiles(mobile)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the users table
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            role TEXT NOT NULL DEFAULT 'default'
                CHECK (role IN ('admin', 'user', 'readOnly', 'default')),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn record_schema_version(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES ('schema_version', ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(SCHEMA_VERSION.to_string())
    .execute(pool)
    .await?;

    Ok(())
}
