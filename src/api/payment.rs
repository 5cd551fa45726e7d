//! Payment endpoints: checkout session creation and the Stripe webhook
//!
//! The webhook consumes the raw, unparsed body — signature verification is
//! over the exact bytes Stripe signed. Verification failures answer 400
//! before any state change; every later failure is logged and swallowed so
//! the endpoint still acknowledges 200 and the provider stops retrying.

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::SubscriptionPlan;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::{Months, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub plan: Option<String>,
}

/// POST /api/payment/create-checkout-session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let plan = SubscriptionPlan::from_metadata(payload.plan.as_deref());

    let url = state
        .stripe
        .create_checkout_session(&payload.email, plan)
        .await
        .map_err(|e| {
            error!(error = %e, "Stripe session creation failed");
            ApiError::Upstream("Failed to create Stripe session".to_string())
        })?;

    Ok(Json(json!({ "url": url })))
}

/// POST /api/payment/webhook
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let event = match state
        .stripe
        .verify_and_parse(&body, signature, Utc::now().timestamp())
    {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "Stripe webhook rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": format!("Webhook error: {}", e) })),
            );
        }
    };

    if event.event_type == "checkout.session.completed" {
        let session = event.data.object;
        let plan = SubscriptionPlan::from_metadata(session.metadata.plan.as_deref());

        let months = match plan {
            SubscriptionPlan::Annual => 12,
            SubscriptionPlan::Monthly => 1,
        };
        let valid_till = Utc::now()
            .checked_add_months(Months::new(months))
            .unwrap_or_else(Utc::now);

        match session.customer_email {
            Some(email) => {
                // Internal failures are logged but still acknowledged:
                // suppressing provider retries takes priority here
                match db::users::set_premium_by_email(&state.db, &email, plan, valid_till).await {
                    Ok(true) => {
                        info!(email = %email, plan = plan.as_str(), "User upgraded to premium")
                    }
                    Ok(false) => warn!(email = %email, "No user found for completed checkout"),
                    Err(e) => error!(error = %e, "Failed to update premium status"),
                }
            }
            None => warn!("Completed checkout carried no customer email"),
        }
    }

    (StatusCode::OK, Json(json!({ "received": true })))
}

/// Build payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/payment/create-checkout-session",
            post(create_checkout_session),
        )
        .route("/api/payment/webhook", post(stripe_webhook))
}
