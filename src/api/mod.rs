//! API layer: one module per route group, plus the session extractor

pub mod auth;
pub mod chat;
pub mod health;
pub mod payment;
pub mod session;
pub mod speech;
pub mod users;

pub use auth::auth_routes;
pub use chat::chat_routes;
pub use health::health_routes;
pub use payment::payment_routes;
pub use session::AuthUser;
pub use speech::speech_routes;
pub use users::user_routes;
