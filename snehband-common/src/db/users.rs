//! User account queries

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::models::{Role, User};
use crate::{Error, Result};

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Return the account for `email`, creating it on first sign-in
///
/// New accounts get `initial_role`. Existing accounts keep their role; a
/// missing display name is filled in.
pub async fn sign_in(
    pool: &SqlitePool,
    email: &str,
    name: Option<&str>,
    initial_role: Role,
) -> Result<User> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::InvalidInput("Empty e-mail".to_string()));
    }
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    if let Some(user) = find_by_email(pool, email).await? {
        if user.name.is_none() && name.is_some() {
            sqlx::query("UPDATE users SET name = ? WHERE id = ?")
                .bind(name)
                .bind(&user.id)
                .execute(pool)
                .await?;
            return get_user(pool, &user.id)
                .await?
                .ok_or_else(|| Error::Internal(format!("User {} vanished", user.id)));
        }
        return Ok(user);
    }

    // Concurrent first sign-ins race on the unique e-mail; the loser re-reads
    let inserted = sqlx::query(
        r#"
        INSERT INTO users (id, name, email, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(email) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(email)
    .bind(initial_role)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let user = find_by_email(pool, email)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} vanished after sign-in", email)))?;

    if inserted.rows_affected() > 0 {
        info!(email = %user.email, role = ?user.role, "Created user account on first sign-in");
    }

    Ok(user)
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

/// Reassign a user's role
pub async fn update_role(pool: &SqlitePool, id: &str, role: Role) -> Result<Option<User>> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    info!(user_id = %id, role = ?role, "User role updated");
    get_user(pool, id).await
}
