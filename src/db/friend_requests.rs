//! Friend request queries
//!
//! The unique (pair_lo, pair_hi) index is the duplicate guard: two racing
//! sends for the same pair cannot both commit, in either direction.

use crate::db::users::{parse_timestamp, parse_uuid, row_to_public_user};
use crate::error::{ApiError, ApiResult};
use crate::models::friend_request::pair_key;
use crate::models::{FriendRequest, RequestStatus, RequestWithCounterpart};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert a pending request. A unique violation means a request already
/// exists between the pair (in either direction, any status) and maps to a
/// conflict.
pub async fn create_request(
    pool: &SqlitePool,
    sender: Uuid,
    recipient: Uuid,
) -> ApiResult<FriendRequest> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    let (pair_lo, pair_hi) = pair_key(sender, recipient);

    let result = sqlx::query(
        r#"
        INSERT INTO friend_requests (id, sender, recipient, status, pair_lo, pair_hi, created_at)
        VALUES (?, ?, ?, 'pending', ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(sender.to_string())
    .bind(recipient.to_string())
    .bind(&pair_lo)
    .bind(&pair_hi)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(FriendRequest {
            id,
            sender,
            recipient,
            status: RequestStatus::Pending,
            created_at,
        }),
        Err(e) if crate::db::users::is_unique_violation(&e) => Err(ApiError::Conflict(
            "A friend request already exists with this user".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> ApiResult<Option<FriendRequest>> {
    let row = sqlx::query(
        "SELECT id, sender, recipient, status, created_at FROM friend_requests WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_request(&r)).transpose()
}

pub async fn set_accepted(pool: &SqlitePool, id: Uuid) -> ApiResult<()> {
    sqlx::query("UPDATE friend_requests SET status = 'accepted' WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Pending requests addressed to `recipient`, enriched with each sender's
/// public profile. Drives the notification list.
pub async fn incoming_pending(
    pool: &SqlitePool,
    recipient: Uuid,
) -> ApiResult<Vec<RequestWithCounterpart>> {
    let rows = sqlx::query(
        r#"
        SELECT r.id AS request_id, r.status, r.created_at AS requested_at,
               u.id, u.full_name, u.profile_pic, u.native_language, u.learning_language, u.is_premium
        FROM friend_requests r
        JOIN users u ON u.id = r.sender
        WHERE r.recipient = ? AND r.status = 'pending'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(recipient.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_enriched).collect()
}

/// Pending requests `sender` has sent, enriched with each recipient's public
/// profile. The frontend uses this to suppress re-sending.
pub async fn outgoing_pending(
    pool: &SqlitePool,
    sender: Uuid,
) -> ApiResult<Vec<RequestWithCounterpart>> {
    let rows = sqlx::query(
        r#"
        SELECT r.id AS request_id, r.status, r.created_at AS requested_at,
               u.id, u.full_name, u.profile_pic, u.native_language, u.learning_language, u.is_premium
        FROM friend_requests r
        JOIN users u ON u.id = r.recipient
        WHERE r.sender = ? AND r.status = 'pending'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(sender.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_enriched).collect()
}

/// Accepted requests `sender` originated. There is no separate notification
/// entity; the accepted row itself is the "request accepted" notification.
pub async fn accepted_for_sender(
    pool: &SqlitePool,
    sender: Uuid,
) -> ApiResult<Vec<RequestWithCounterpart>> {
    let rows = sqlx::query(
        r#"
        SELECT r.id AS request_id, r.status, r.created_at AS requested_at,
               u.id, u.full_name, u.profile_pic, u.native_language, u.learning_language, u.is_premium
        FROM friend_requests r
        JOIN users u ON u.id = r.recipient
        WHERE r.sender = ? AND r.status = 'accepted'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(sender.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_enriched).collect()
}

fn row_to_request(row: &SqliteRow) -> ApiResult<FriendRequest> {
    let status: String = row.get("status");
    let status = RequestStatus::parse(&status)
        .ok_or_else(|| ApiError::Internal(format!("Unknown request status: {}", status)))?;

    Ok(FriendRequest {
        id: parse_uuid(row.get("id"))?,
        sender: parse_uuid(row.get("sender"))?,
        recipient: parse_uuid(row.get("recipient"))?,
        status,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn row_to_enriched(row: &SqliteRow) -> ApiResult<RequestWithCounterpart> {
    let status: String = row.get("status");
    let status = RequestStatus::parse(&status)
        .ok_or_else(|| ApiError::Internal(format!("Unknown request status: {}", status)))?;

    Ok(RequestWithCounterpart {
        id: parse_uuid(row.get("request_id"))?,
        status,
        created_at: parse_timestamp(&row.get::<String, _>("requested_at"))?,
        user: row_to_public_user(row)?,
    })
}
