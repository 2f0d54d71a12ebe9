//! Backend the demo's effect handlers call
//!
//! The store treats these calls as opaque: a handler awaits one and turns
//! the outcome into a follow-up action.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Errors from backend calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an error status.
    #[error("{status_text}")]
    Status { status: u16, status_text: String },

    /// The request never got an answer.
    #[error("Request failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Profile {
    pub name: String,
}

/// Asynchronous calls available to effect handlers
#[async_trait]
pub trait Backend: Send + Sync {
    /// GET /profile
    async fn fetch_profile(&self) -> Result<Profile, ApiError>;

    /// POST /game/save
    async fn save_game(&self, score: i64) -> Result<(), ApiError>;
}

/// In-process backend with a fixed latency
pub struct SimulatedBackend {
    latency: Duration,
    profile_name: String,
    offline: AtomicBool,
}

impl SimulatedBackend {
    pub fn new(profile_name: impl Into<String>, latency: Duration) -> Self {
        Self {
            latency,
            profile_name: profile_name.into(),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every following call fail with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn round_trip(&self) -> Result<(), ApiError> {
        tokio::time::sleep(self.latency).await;
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        self.round_trip().await?;
        let body = serde_json::json!({ "name": self.profile_name });
        serde_json::from_value(body).map_err(|e| ApiError::Transport(e.to_string()))
    }

    async fn save_game(&self, score: i64) -> Result<(), ApiError> {
        self.round_trip().await?;
        if score < 0 {
            return Err(ApiError::Status {
                status: 422,
                status_text: "Unprocessable Entity".to_string(),
            });
        }
        log::info!("Saved game with score {}", score);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_backend_profile() {
        let backend = SimulatedBackend::new("Ada", Duration::from_millis(1));
        assert_eq!(
            backend.fetch_profile().await.unwrap(),
            Profile {
                name: "Ada".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_simulated_backend_offline() {
        let backend = SimulatedBackend::new("Ada", Duration::from_millis(1));
        backend.set_offline(true);
        let err = backend.fetch_profile().await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed: connection refused");
    }

    #[tokio::test]
    async fn test_negative_score_rejected() {
        let backend = SimulatedBackend::new("Ada", Duration::from_millis(1));
        let err = backend.save_game(-1).await.unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.to_string(), "Unprocessable Entity");
    }
}
