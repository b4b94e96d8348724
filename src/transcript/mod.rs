// Transcript acquisition: normalization, provider chain, retry and diagnostics

pub mod backends;
pub mod diagnostics;
pub mod errors;
pub mod language;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod retry;
pub mod tools;
pub mod traits;
pub mod utils;
pub mod video_id;

pub use errors::ProviderError;
pub use models::{ErrorInfo, ErrorKind, LanguagePreference, ProviderAttempt, TranscriptResult, VideoRef};
pub use orchestrator::TranscriptOrchestrator;
pub use retry::RetryPolicy;
pub use traits::TranscriptProvider;
