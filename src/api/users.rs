//! Social graph endpoints: recommendations, friends, friend requests
//!
//! All routes require an authenticated session. Duplicate-request and
//! acceptance races are closed at the database (unique pair index, set
//! semantics on the friendship table) rather than with read-then-write
//! checks here.

use crate::api::session::AuthUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{FriendRequest, PublicUser, RequestWithCounterpart, User};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// GET /api/users — onboarded users who are neither self nor current friends
pub async fn recommended_users(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = db::users::recommended_users(&state.db, user.id).await?;
    Ok(Json(users))
}

/// GET /api/users/friends
pub async fn my_friends(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let friends = db::users::friends_of(&state.db, user.id).await?;
    Ok(Json(friends))
}

/// GET /api/users/me
pub async fn my_data(AuthUser(user): AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "user": user }))
}

/// POST /api/users/friend-request/:id
pub async fn send_friend_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipient_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<FriendRequest>)> {
    if user.id == recipient_id {
        return Err(ApiError::Validation(
            "You can't send a friend request to yourself".to_string(),
        ));
    }

    let recipient: User = db::users::find_by_id(&state.db, recipient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipient not found".to_string()))?;

    if db::users::are_friends(&state.db, user.id, recipient.id).await? {
        return Err(ApiError::Conflict(
            "You are already friends with this user".to_string(),
        ));
    }

    // Duplicate detection (either direction, any status) happens inside the
    // insert via the unique pair index.
    let request = db::friend_requests::create_request(&state.db, user.id, recipient.id).await?;

    tracing::info!(sender = %user.id, recipient = %recipient.id, "Friend request sent");
    Ok((StatusCode::CREATED, Json(request)))
}

/// PUT /api/users/friend-request/:id/accept
pub async fn accept_friend_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let request = db::friend_requests::find_by_id(&state.db, request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Friend request not found".to_string()))?;

    if request.recipient != user.id {
        return Err(ApiError::Forbidden(
            "You are not authorized to accept this request".to_string(),
        ));
    }

    db::friend_requests::set_accepted(&state.db, request.id).await?;

    // Set semantics: accepting twice never duplicates friend entries
    db::users::add_friendship(&state.db, request.sender, request.recipient).await?;

    tracing::info!(request = %request.id, "Friend request accepted");
    Ok(Json(json!({ "success": true, "message": "Friend request accepted" })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestsResponse {
    /// Pending requests addressed to the caller
    pub incoming_reqs: Vec<RequestWithCounterpart>,
    /// Requests the caller sent that were accepted — the notification feed
    pub accepted_reqs: Vec<RequestWithCounterpart>,
}

/// GET /api/users/friend-requests
pub async fn friend_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<FriendRequestsResponse>> {
    let incoming_reqs = db::friend_requests::incoming_pending(&state.db, user.id).await?;
    let accepted_reqs = db::friend_requests::accepted_for_sender(&state.db, user.id).await?;

    Ok(Json(FriendRequestsResponse {
        incoming_reqs,
        accepted_reqs,
    }))
}

/// GET /api/users/outgoing-friend-requests
pub async fn outgoing_friend_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RequestWithCounterpart>>> {
    let outgoing = db::friend_requests::outgoing_pending(&state.db, user.id).await?;
    Ok(Json(outgoing))
}

/// Build user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(recommended_users))
        .route("/api/users/friends", get(my_friends))
        .route("/api/users/me", get(my_data))
        .route("/api/users/friend-request/:id", post(send_friend_request))
        .route(
            "/api/users/friend-request/:id/accept",
            put(accept_friend_request),
        )
        .route("/api/users/friend-requests", get(friend_requests))
        .route(
            "/api/users/outgoing-friend-requests",
            get(outgoing_friend_requests),
        )
}
