//! User model
//!
//! The full row (including the bcrypt hash) stays internal to the crate; API
//! responses serialize `User` with the hash skipped, or project down to
//! [`PublicUser`] for counterpart listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription plan purchased through the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Monthly,
    Annual,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Monthly => "monthly",
            SubscriptionPlan::Annual => "annual",
        }
    }

    /// Resolve a plan from client input or webhook metadata.
    /// Anything unrecognized falls back to monthly.
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("annual") => SubscriptionPlan::Annual,
            _ => SubscriptionPlan::Monthly,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub bio: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
    pub profile_pic: String,
    pub is_onboarded: bool,
    pub is_premium: bool,
    pub subscription_type: Option<String>,
    pub valid_till: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public profile projection used for friend lists, recommendations and
/// friend-request enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
    pub is_premium: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            full_name: user.full_name.clone(),
            profile_pic: user.profile_pic.clone(),
            native_language: user.native_language.clone(),
            learning_language: user.learning_language.clone(),
            is_premium: user.is_premium,
        }
    }
}

/// Allow-listed profile fields accepted from onboarding and profile-update
/// requests. Nothing outside this set ever reaches the database, so a
/// client-supplied premium flag is simply ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub location: Option<String>,
}

impl ProfileFields {
    /// Names of the required fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.full_name) {
            missing.push("fullName");
        }
        if is_blank(&self.bio) {
            missing.push("bio");
        }
        if is_blank(&self.native_language) {
            missing.push("nativeLanguage");
        }
        if is_blank(&self.learning_language) {
            missing.push("learningLanguage");
        }
        if is_blank(&self.location) {
            missing.push("location");
        }
        missing
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}
