//! Error types for settings, session setup and operator input.
//!
//! Provider failures are not represented here: they are folded into a
//! degraded reply before they reach any caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("settings error: {0}")]
    Settings(String),

    #[error("location unavailable: {0}")]
    Location(String),

    #[error("unknown operation mode: {0}")]
    UnknownMode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
