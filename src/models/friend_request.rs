//! Friend request model
//!
//! A request lives on exactly one unordered {sender, recipient} pair and only
//! ever moves pending → accepted. The accepted row doubles as the
//! "request accepted" notification record for the sender.

use super::PublicUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Friend request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RequestStatus::Pending),
            "accepted" => Some(RequestStatus::Accepted),
            _ => None,
        }
    }
}

/// A friend request row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: Uuid,
    pub sender: Uuid,
    pub recipient: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A request enriched with the counterpart's public profile: the sender for
/// incoming lists, the recipient for outgoing and accepted lists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWithCounterpart {
    pub id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub user: PublicUser,
}

/// Canonical unordered pair key for the uniqueness constraint: the two user
/// ids sorted lexicographically.
pub fn pair_key(a: Uuid, b: Uuid) -> (String, String) {
    let (a, b) = (a.to_string(), b.to_string());
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(pair_key(a, b), pair_key(b, a));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [RequestStatus::Pending, RequestStatus::Accepted] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("rejected"), None);
    }
}
