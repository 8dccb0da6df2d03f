pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::ServiceConfig;
pub use crate::error::ServiceError;
pub use crate::models::{ServiceOutcome, ServiceRequest, ServiceResult};
pub use crate::services::host::{ArtifactSink, LocalArtifactStore};
pub use crate::services::service::AcceService;
