//! Domain models for lingua-link

pub mod friend_request;
pub mod test_result;
pub mod user;

pub use friend_request::{FriendRequest, RequestStatus, RequestWithCounterpart};
pub use test_result::{Evaluation, TestHistoryEntry, TestResult};
pub use user::{ProfileFields, PublicUser, SubscriptionPlan, User};
