//! Operator token override store
//!
//! A remote key-value document store can hold a token that overrides the
//! login flow, letting an operator rotate credentials without shipping a
//! build. The concrete document-store backend lives outside this crate;
//! this is the seam it plugs into, plus an in-memory implementation used
//! in tests and for local seeding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

/// Remote store holding an operator-supplied token override.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Fetch the stored override, if any.
    async fn get(&self) -> Option<String>;

    /// Persist a new override. Returns false when the write fails.
    async fn set(&self, token: &str) -> bool;
}

struct StoredToken {
    token: String,
    updated_at: DateTime<Utc>,
}

/// In-memory token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    entry: RwLock<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When the override was last written.
    pub async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.entry.read().await.as_ref().map(|entry| entry.updated_at)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Option<String> {
        self.entry.read().await.as_ref().map(|entry| entry.token.clone())
    }

    async fn set(&self, token: &str) -> bool {
        *self.entry.write().await = Some(StoredToken {
            token: token.to_string(),
            updated_at: Utc::now(),
        });
        debug!("token override stored");
        true
    }
}
