use thiserror::Error;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Permanent payload-shape failure.
///
/// A payload that fails to decode will never decode successfully, so the
/// message is dead-lettered immediately and never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Terminal dispatch failure, surfaced after the retry budget is exhausted.
///
/// Carries the number of attempts made and the reason from the last one.
#[derive(Debug, Error)]
#[error("mail dispatch failed after {attempts} attempts: {reason}")]
pub struct DispatchError {
    pub attempts: u32,
    pub reason: String,
}
