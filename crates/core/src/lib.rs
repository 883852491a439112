//! rechunk core library
//!
//! Foundational utilities shared by every rechunk crate:
//! - Error handling (`ChunkError`, `AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, ChunkError};
