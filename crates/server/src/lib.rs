//! Server crate for the moodtunes service.
//!
//! Wires the pipeline stages behind an HTTP endpoint: configuration,
//! request-scoped upload storage, the request orchestrator and the axum
//! router.

pub mod config;
pub mod http;
pub mod orchestrator;
pub mod storage;

pub use config::AppConfig;
pub use http::{AppState, create_router};
pub use orchestrator::RequestOrchestrator;
pub use storage::{TransientImage, TransientStorage};
