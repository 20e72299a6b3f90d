//! Profile queries

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::db::models::{
    GenderFilter, Profile, ProfileDraft, ProfileFilter, ProfileStats, DETAIL_COLUMNS,
};
use crate::import::{SyntheticIds, SYNTHETIC_ID_START};
use crate::{Error, Result};

/// How an insert treats an existing row with the same identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnExisting {
    Fail,
    Overwrite,
}

fn insert_sql(on_existing: OnExisting) -> String {
    let detail_cols = DETAIL_COLUMNS.join(", ");
    let placeholders = vec!["?"; 6 + DETAIL_COLUMNS.len() + 2].join(", ");
    let mut sql = format!(
        "INSERT INTO profiles (anubandh_id, id_synthetic, name, mobile, gender, attendee_count, \
         {detail_cols}, created_at, updated_at) VALUES ({placeholders})"
    );

    if on_existing == OnExisting::Overwrite {
        let detail_updates: Vec<String> = DETAIL_COLUMNS
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        sql.push_str(&format!(
            " ON CONFLICT(anubandh_id) DO UPDATE SET id_synthetic = excluded.id_synthetic, \
             name = excluded.name, mobile = excluded.mobile, gender = excluded.gender, \
             attendee_count = excluded.attendee_count, {}, updated_at = excluded.updated_at",
            detail_updates.join(", ")
        ));
    }

    sql
}

async fn write_profile(
    pool: &SqlitePool,
    anubandh_id: i64,
    synthetic: bool,
    draft: &ProfileDraft,
    on_existing: OnExisting,
) -> std::result::Result<(), sqlx::Error> {
    let sql = insert_sql(on_existing);
    let now = Utc::now();

    let mut query = sqlx::query(&sql)
        .bind(anubandh_id)
        .bind(synthetic)
        .bind(&draft.name)
        .bind(&draft.mobile)
        .bind(draft.gender)
        .bind(draft.attendee_count);
    for value in draft.details.values() {
        query = query.bind(value);
    }
    query.bind(now).bind(now).execute(pool).await?;

    Ok(())
}

/// Insert a new profile; an existing identifier is a conflict
pub async fn insert_profile(
    pool: &SqlitePool,
    anubandh_id: i64,
    synthetic: bool,
    draft: &ProfileDraft,
) -> Result<Profile> {
    write_profile(pool, anubandh_id, synthetic, draft, OnExisting::Fail)
        .await
        .map_err(|e| Error::from_insert(e, format!("Profile with Anubandh ID {}", anubandh_id)))?;

    get_profile(pool, anubandh_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Profile {} vanished after insert", anubandh_id)))
}

/// Create the profile, or overwrite its imported fields when the identifier exists
///
/// Approval, introduction, check-in and creation time are preserved on overwrite.
pub async fn upsert_profile(
    pool: &SqlitePool,
    anubandh_id: i64,
    synthetic: bool,
    draft: &ProfileDraft,
) -> Result<()> {
    write_profile(pool, anubandh_id, synthetic, draft, OnExisting::Overwrite).await?;
    Ok(())
}

pub async fn get_profile(pool: &SqlitePool, anubandh_id: i64) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE anubandh_id = ?")
        .bind(anubandh_id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

/// Replace the editable fields of a profile
pub async fn update_profile(
    pool: &SqlitePool,
    anubandh_id: i64,
    draft: &ProfileDraft,
) -> Result<Option<Profile>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE profiles SET name = ");
    qb.push_bind(&draft.name)
        .push(", mobile = ")
        .push_bind(&draft.mobile)
        .push(", gender = ")
        .push_bind(draft.gender)
        .push(", attendee_count = ")
        .push_bind(draft.attendee_count);
    for (column, value) in DETAIL_COLUMNS.iter().zip(draft.details.values()) {
        qb.push(format!(", {column} = ")).push_bind(value);
    }
    qb.push(", updated_at = ")
        .push_bind(Utc::now())
        .push(" WHERE anubandh_id = ")
        .push_bind(anubandh_id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_profile(pool, anubandh_id).await
}

/// Store approval and introduction flags
pub async fn update_status(
    pool: &SqlitePool,
    anubandh_id: i64,
    approved: bool,
    introduction: bool,
) -> Result<Option<Profile>> {
    let result = sqlx::query(
        "UPDATE profiles SET approved = ?, introduction = ?, updated_at = ? WHERE anubandh_id = ?",
    )
    .bind(approved)
    .bind(introduction)
    .bind(Utc::now())
    .bind(anubandh_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_profile(pool, anubandh_id).await
}

/// Record a venue check-in; the first timestamp wins
pub async fn mark_checked_in(
    pool: &SqlitePool,
    anubandh_id: i64,
    at: DateTime<Utc>,
) -> Result<Option<Profile>> {
    let result = sqlx::query(
        "UPDATE profiles SET checked_in_at = COALESCE(checked_in_at, ?) WHERE anubandh_id = ?",
    )
    .bind(at)
    .bind(anubandh_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_profile(pool, anubandh_id).await
}

/// Delete one profile, returning whether it existed
pub async fn delete_profile(pool: &SqlitePool, anubandh_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM profiles WHERE anubandh_id = ?")
        .bind(anubandh_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Administrative bulk clear
pub async fn clear_profiles(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM profiles").execute(pool).await?;
    Ok(result.rows_affected())
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a ProfileFilter) {
    let mut first = true;
    let mut clause = |qb: &mut QueryBuilder<'a, Sqlite>| {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
    };

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term);
        clause(qb);
        qb.push("(name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR mobile LIKE ")
            .push_bind(pattern.clone())
            .push(" OR email LIKE ")
            .push_bind(pattern.clone())
            .push(" OR CAST(anubandh_id AS TEXT) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(approved) = filter.approved {
        clause(qb);
        qb.push("approved = ").push_bind(approved);
    }
    if let Some(introduction) = filter.introduction {
        clause(qb);
        qb.push("introduction = ").push_bind(introduction);
    }
    if let Some(gender) = filter.gender {
        clause(qb);
        match gender {
            GenderFilter::Male => qb.push("gender = 'MALE'"),
            GenderFilter::Female => qb.push("gender = 'FEMALE'"),
            GenderFilter::Unknown => qb.push("gender IS NULL"),
        };
    }
    if let Some(checked_in) = filter.checked_in {
        clause(qb);
        qb.push(if checked_in {
            "checked_in_at IS NOT NULL"
        } else {
            "checked_in_at IS NULL"
        });
    }
}

pub async fn count_profiles(pool: &SqlitePool, filter: &ProfileFilter) -> Result<i64> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM profiles");
    push_filter(&mut qb, filter);
    let count: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Profiles matching `filter`, ordered by identifier; `limit = None` returns all
pub async fn list_profiles(
    pool: &SqlitePool,
    filter: &ProfileFilter,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<Profile>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM profiles");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY anubandh_id ASC");
    if let Some(limit) = limit {
        qb.push(" LIMIT ").push_bind(limit).push(" OFFSET ").push_bind(offset);
    }
    let profiles = qb.build_query_as::<Profile>().fetch_all(pool).await?;
    Ok(profiles)
}

/// Profiles for the given identifiers; unknown identifiers are skipped
pub async fn profiles_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Profile>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM profiles WHERE anubandh_id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY anubandh_id ASC");
    let profiles = qb.build_query_as::<Profile>().fetch_all(pool).await?;
    Ok(profiles)
}

/// Dashboard statistics
pub async fn profile_stats(pool: &SqlitePool) -> Result<ProfileStats> {
    let stats = sqlx::query_as::<_, ProfileStats>(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(approved = 1), 0) AS approved,
            COALESCE(SUM(approved = 0), 0) AS pending,
            COALESCE(SUM(gender = 'MALE'), 0) AS male,
            COALESCE(SUM(gender = 'FEMALE'), 0) AS female,
            COALESCE(SUM(gender IS NULL), 0) AS unknown_gender,
            COALESCE(SUM(introduction = 1), 0) AS introduction,
            COALESCE(SUM(checked_in_at IS NOT NULL), 0) AS checked_in,
            COALESCE(SUM(attendee_count), 0) AS expected_attendees,
            COALESCE(SUM(CASE WHEN approved = 1 THEN attendee_count ELSE 0 END), 0)
                AS approved_attendees
        FROM profiles
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// Synthetic identifier allocator for a new batch
///
/// Starts at [`SYNTHETIC_ID_START`] and continues below any synthetic
/// identifier already stored. Every stored identifier at or below the seed is
/// reserved, so an explicitly numbered profile is never overwritten.
pub async fn synthetic_ids(pool: &SqlitePool) -> Result<SyntheticIds> {
    let lowest: Option<i64> =
        sqlx::query_scalar("SELECT MIN(anubandh_id) FROM profiles WHERE id_synthetic = 1")
            .fetch_one(pool)
            .await?;
    let seed = match lowest {
        Some(lowest) => (lowest - 1).min(SYNTHETIC_ID_START),
        None => SYNTHETIC_ID_START,
    };

    let occupied: Vec<i64> =
        sqlx::query_scalar("SELECT anubandh_id FROM profiles WHERE anubandh_id <= ?")
            .bind(seed)
            .fetch_all(pool)
            .await?;

    Ok(SyntheticIds::starting_at(seed).reserving(occupied))
}

/// First free synthetic identifier
pub async fn next_synthetic_id(pool: &SqlitePool) -> Result<i64> {
    Ok(synthetic_ids(pool).await?.peek())
}
