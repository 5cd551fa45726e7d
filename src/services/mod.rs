//! External provider clients and the speech evaluation pipeline
//!
//! Each client wraps one outbound integration behind a struct holding a
//! single `reqwest::Client`. They are constructed once at startup and shared
//! read-only through `AppState` (stateless clients, no teardown).

pub mod evaluation;
pub mod speech_pipeline;
pub mod stream_client;
pub mod stripe_client;
pub mod transcription;

pub use evaluation::EvaluationClient;
pub use speech_pipeline::{SpeechReport, SpeechSubmission};
pub use stream_client::StreamClient;
pub use stripe_client::StripeClient;
pub use transcription::TranscriptionClient;
