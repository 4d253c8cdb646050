//! Streamhub Core - Media-Hub Client Library
//!
//! This crate provides the core functionality for a media-hub client:
//! - Gateway authentication with coalesced token refresh
//! - Encrypted response-envelope decoding
//! - Catalog normalization (channels, home carousels, genre programs)
//! - Slug-to-stream URL resolution across the gateway trust boundary
//! - Playback session state machine with failure recovery
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Streamhub Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │    Token     │  │   Gateway    │  │    Stream    │          │
//! │  │    Broker    │  │    Client    │  │   Resolver   │          │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘          │
//! │         │                 │                 │                   │
//! │         └────────┬────────┘                 │                   │
//! │                  │                          │                   │
//! │           ┌──────┴──────┐            ┌──────┴──────┐            │
//! │           │   Cipher    │            │   Player    │            │
//! │           │   Codec     │            │   Session   │            │
//! │           └─────────────┘            └──────┬──────┘            │
//! │                                             │                   │
//! │                                      ┌──────┴──────┐            │
//! │                                      │  Adaptive   │            │
//! │                                      │   Engine    │            │
//! │                                      └─────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cipher;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod resolver;
pub mod session;
pub mod store;
pub mod token;
pub mod types;

pub use engine::{AdaptiveEngine, EngineEvent, EngineFactory};
pub use error::{Error, Result};
pub use gateway::GatewayClient;
pub use resolver::{StreamLocator, StreamResolver};
pub use session::PlayerSession;
pub use store::{MemoryTokenStore, TokenStore};
pub use token::{HttpLoginTransport, LoginTransport, TokenBroker};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the client library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Streamhub Core initialized");
}
