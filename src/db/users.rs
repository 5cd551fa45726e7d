//! User queries
//!
//! Friendship symmetry is maintained here: `add_friendship` writes both
//! directions in one transaction with INSERT OR IGNORE, so duplicate
//! acceptance never duplicates entries.

use crate::error::{ApiError, ApiResult};
use crate::models::{ProfileFields, PublicUser, SubscriptionPlan, User};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, full_name, bio, native_language, \
     learning_language, location, profile_pic, is_onboarded, is_premium, \
     subscription_type, valid_till, created_at, updated_at";

/// Create a new user. The unique email index makes a duplicate signup a
/// constraint violation, surfaced to the caller as a conflict.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    full_name: &str,
    profile_pic: &str,
) -> ApiResult<User> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, full_name, profile_pic, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(profile_pic)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "Email already exists. Please use a different one".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::Internal("user vanished after insert".to_string()))
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> ApiResult<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_user(&r)).transpose()
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> ApiResult<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_user(&r)).transpose()
}

/// Persist the allow-listed profile fields. Caller validates presence first;
/// by this point every field is known to be non-blank.
pub async fn update_profile(
    pool: &SqlitePool,
    id: Uuid,
    fields: &ProfileFields,
    set_onboarded: bool,
) -> ApiResult<Option<User>> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET full_name = ?,
            bio = ?,
            native_language = ?,
            learning_language = ?,
            location = ?,
            is_onboarded = CASE WHEN ? THEN 1 ELSE is_onboarded END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.full_name.as_deref().unwrap_or_default())
    .bind(fields.bio.as_deref().unwrap_or_default())
    .bind(fields.native_language.as_deref().unwrap_or_default())
    .bind(fields.learning_language.as_deref().unwrap_or_default())
    .bind(fields.location.as_deref().unwrap_or_default())
    .bind(set_onboarded)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    find_by_id(pool, id).await
}

/// Flip subscription state from a verified payment webhook. Returns false
/// when no user matches the email (the event is still acknowledged upstream).
pub async fn set_premium_by_email(
    pool: &SqlitePool,
    email: &str,
    plan: SubscriptionPlan,
    valid_till: DateTime<Utc>,
) -> ApiResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_premium = 1,
            subscription_type = ?,
            valid_till = ?,
            updated_at = ?
        WHERE email = ?
        "#,
    )
    .bind(plan.as_str())
    .bind(valid_till.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Recommendation query: onboarded users excluding self and current friends.
/// Plain exclusion filter, no ranking.
pub async fn recommended_users(pool: &SqlitePool, user_id: Uuid) -> ApiResult<Vec<PublicUser>> {
    let rows = sqlx::query(
        r#"
        SELECT id, full_name, profile_pic, native_language, learning_language, is_premium
        FROM users
        WHERE id != ?
          AND is_onboarded = 1
          AND id NOT IN (SELECT friend_id FROM friendships WHERE user_id = ?)
        ORDER BY created_at
        "#,
    )
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_public_user).collect()
}

pub async fn friends_of(pool: &SqlitePool, user_id: Uuid) -> ApiResult<Vec<PublicUser>> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.full_name, u.profile_pic, u.native_language, u.learning_language, u.is_premium
        FROM friendships f
        JOIN users u ON u.id = f.friend_id
        WHERE f.user_id = ?
        ORDER BY u.full_name
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_public_user).collect()
}

/// Add each user to the other's friend set. INSERT OR IGNORE gives set
/// semantics: repeating the operation never duplicates entries.
pub async fn add_friendship(pool: &SqlitePool, a: Uuid, b: Uuid) -> ApiResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT OR IGNORE INTO friendships (user_id, friend_id) VALUES (?, ?)")
        .bind(a.to_string())
        .bind(b.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT OR IGNORE INTO friendships (user_id, friend_id) VALUES (?, ?)")
        .bind(b.to_string())
        .bind(a.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn are_friends(pool: &SqlitePool, a: Uuid, b: Uuid) -> ApiResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM friendships WHERE user_id = ? AND friend_id = ?",
    )
    .bind(a.to_string())
    .bind(b.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map_or(false, |db| db.is_unique_violation())
}

fn row_to_user(row: &SqliteRow) -> ApiResult<User> {
    Ok(User {
        id: parse_uuid(row.get("id"))?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        full_name: row.get("full_name"),
        bio: row.get("bio"),
        native_language: row.get("native_language"),
        learning_language: row.get("learning_language"),
        location: row.get("location"),
        profile_pic: row.get("profile_pic"),
        is_onboarded: row.get::<i64, _>("is_onboarded") != 0,
        is_premium: row.get::<i64, _>("is_premium") != 0,
        subscription_type: row.get("subscription_type"),
        valid_till: row
            .get::<Option<String>, _>("valid_till")
            .map(|s| parse_timestamp(&s))
            .transpose()?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub(crate) fn row_to_public_user(row: &SqliteRow) -> ApiResult<PublicUser> {
    Ok(PublicUser {
        id: parse_uuid(row.get("id"))?,
        full_name: row.get("full_name"),
        profile_pic: row.get("profile_pic"),
        native_language: row.get("native_language"),
        learning_language: row.get("learning_language"),
        is_premium: row.get::<i64, _>("is_premium") != 0,
    })
}

pub(crate) fn parse_uuid(value: String) -> ApiResult<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|e| ApiError::Internal(format!("Failed to parse stored uuid: {}", e)))
}

pub(crate) fn parse_timestamp(value: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("Failed to parse stored timestamp: {}", e)))
}
