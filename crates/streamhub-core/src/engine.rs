//! Adaptive engine seam
//!
//! The playback session drives an external adaptive-bitrate engine
//! through this interface and reacts to the closed set of events it
//! emits. Fatal errors arrive pre-classified so the session can recover
//! the transient classes in place and only tear down on the rest.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use url::Url;

/// Events an adaptive engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Index fetched and parsed; playback may begin
    ManifestParsed,
    /// Fatal network-class error; recoverable by reloading the index
    FatalNetworkError,
    /// Fatal media-decode error; recoverable via decoder recovery
    FatalMediaError,
    /// Unclassified fatal error; the engine must be destroyed
    FatalOtherError,
    /// The surface started rendering frames
    Playing,
    /// The surface paused
    Paused,
}

/// One adaptive engine instance bound to one playback surface.
///
/// Instances are never shared: each attempt within a session gets a
/// fresh one, and `detach` must be idempotent.
#[async_trait]
pub trait AdaptiveEngine: Send + Sync {
    /// Attach a source URL and begin loading its index.
    async fn attach(&self, url: &Url) -> Result<()>;

    /// Begin playback. Errors when the runtime rejects autoplay.
    async fn play(&self, muted: bool) -> Result<()>;

    /// Pause playback.
    async fn pause(&self);

    /// Re-request the index after a fatal network error.
    async fn reload_index(&self);

    /// Attempt decoder recovery after a fatal media error.
    async fn recover_decoder(&self);

    /// Destroy the engine and clear the surface source.
    async fn detach(&self);

    /// Subscribe to engine events.
    fn events(&self) -> broadcast::Receiver<EngineEvent>;
}

/// Creates one engine instance per playback attempt.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Arc<dyn AdaptiveEngine>;
}
