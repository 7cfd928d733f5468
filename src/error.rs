//! Error types for Wakabeat
//!
//! This module defines all error types used throughout the crate. Uses
//! `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Delivery outcomes of individual heartbeats (2xx/401/5xx/transport
//! failure) are deliberately NOT errors. They are terminal, logged results
//! modeled by [`crate::heartbeat::DeliveryOutcome`]. Only conditions that
//! prevent the service from operating at all live here.

use thiserror::Error;

/// The primary error type for Wakabeat operations.
#[derive(Error, Debug)]
pub enum WakabeatError {
    /// Configuration-related errors (unreadable config file, invalid fields)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event feed errors (malformed event lines, closed input)
    #[error("Feed error: {0}")]
    Feed(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction/request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized `Result` type for Wakabeat operations.
pub type Result<T> = std::result::Result<T, WakabeatError>;
