//! Backend platform facade.
//!
//! One explicitly constructed `Platform` bundles the four external
//! capabilities (sessions, blob storage, key-value, AI) and tracks whether
//! they are usable. It is cloned into `AppState`; nothing here is global.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::llm_client::LlmError;

pub mod ai;
pub mod auth;
pub mod fs;
pub mod kv;

#[cfg(test)]
pub mod testing;

pub use ai::AiService;
pub use auth::SessionStore;
pub use fs::BlobStore;
pub use kv::KvStore;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("KV error: {0}")]
    Kv(#[from] redis::RedisError),

    #[error("AI error: {0}")]
    Ai(#[from] LlmError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Username {0} is already registered")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Lifecycle of the platform connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum Readiness {
    Uninitialized,
    Initializing,
    Ready,
    Error(String),
}

#[derive(Clone)]
pub struct Platform {
    pub auth: Arc<dyn SessionStore>,
    pub fs: Arc<dyn BlobStore>,
    pub kv: Arc<dyn KvStore>,
    pub ai: Arc<dyn AiService>,
    readiness: Arc<watch::Sender<Readiness>>,
}

impl Platform {
    pub fn new(
        auth: Arc<dyn SessionStore>,
        fs: Arc<dyn BlobStore>,
        kv: Arc<dyn KvStore>,
        ai: Arc<dyn AiService>,
    ) -> Self {
        let (readiness, _) = watch::channel(Readiness::Uninitialized);
        Self {
            auth,
            fs,
            kv,
            ai,
            readiness: Arc::new(readiness),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.readiness.borrow(), Readiness::Ready)
    }

    /// Receiver that observes every readiness change.
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.readiness.subscribe()
    }

    /// True when the platform is usable. A platform stuck in `Error` is
    /// probed again, so a backend that comes back is picked up without a
    /// restart.
    pub async fn ensure_ready(&self) -> bool {
        if self.is_ready() {
            return true;
        }
        match self.readiness() {
            Readiness::Error(_) => self.initialize().await == Readiness::Ready,
            _ => false,
        }
    }

    /// Probes each backend once. Ends in `Ready` or `Error`; never panics.
    pub async fn initialize(&self) -> Readiness {
        self.readiness.send_replace(Readiness::Initializing);

        let outcome = async {
            self.auth.ping().await?;
            self.kv.ping().await?;
            self.fs.ping().await?;
            Ok::<_, PlatformError>(())
        }
        .await;

        let state = match outcome {
            Ok(()) => {
                info!("Platform ready");
                Readiness::Ready
            }
            Err(e) => {
                warn!("Platform initialization failed: {e}");
                Readiness::Error(e.to_string())
            }
        };
        self.readiness.send_replace(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakePlatform;
    use super::*;

    #[tokio::test]
    async fn test_initialize_reaches_ready() {
        let fake = FakePlatform::new();
        let platform = fake.platform();
        assert_eq!(platform.readiness(), Readiness::Uninitialized);

        let mut rx = platform.subscribe();
        assert_eq!(platform.initialize().await, Readiness::Ready);
        assert!(platform.is_ready());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Readiness::Ready);
    }

    #[tokio::test]
    async fn test_initialize_reports_backend_failure() {
        let fake = FakePlatform::new();
        fake.kv.fail_ping();
        let platform = fake.platform();

        let state = platform.initialize().await;
        assert!(matches!(state, Readiness::Error(_)), "{state:?}");
        assert!(!platform.is_ready());
    }

    #[tokio::test]
    async fn test_recovers_after_backend_returns() {
        let fake = FakePlatform::new();
        fake.kv.fail_ping();
        let platform = fake.platform();
        platform.initialize().await;

        assert!(!platform.ensure_ready().await);
        assert!(matches!(platform.readiness(), Readiness::Error(_)));

        fake.kv.restore_ping();
        assert!(platform.ensure_ready().await);
        assert_eq!(platform.readiness(), Readiness::Ready);
    }

    #[tokio::test]
    async fn test_ensure_ready_waits_for_first_initialize() {
        let fake = FakePlatform::new();
        let platform = fake.platform();
        assert!(!platform.ensure_ready().await);
        assert_eq!(platform.readiness(), Readiness::Uninitialized);
    }

    #[test]
    fn test_readiness_serialization() {
        let json = serde_json::to_value(Readiness::Error("down".into())).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["reason"], "down");
        let json = serde_json::to_value(Readiness::Ready).unwrap();
        assert_eq!(json["state"], "ready");
    }
}
