//! Gateway authentication token broker
//!
//! The upstream issues a bearer token from its login endpoint against
//! fixed credential blobs. The broker caches that token for the lifetime
//! of the process and coalesces concurrent refreshes: N callers hitting a
//! cold cache produce exactly one login round-trip, all resolving to the
//! same value. Login failures resolve to an empty token and are never
//! cached, so the next caller retries from scratch.

use crate::error::Result;
use crate::store::TokenStore;
use crate::types::GatewayConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

/// Credential blobs the login endpoint expects verbatim.
const LOGIN_STATE: &str = "S29Pb3Q3eTl4dnUxRk5HME9sa0dXdVh0QjZmNXpoRDBAd2ViLmNvbQ==";
const LOGIN_CITY: &str = "S29Pb3Q3eTl4dnUxRk5HME9sa0dXdVh0QjZmNXpoRDA";

/// One login round-trip. Injectable so the broker's coalescing can be
/// exercised without a network.
#[async_trait]
pub trait LoginTransport: Send + Sync {
    /// Perform a login and return the issued token.
    async fn login(&self) -> Result<String>;
}

/// Login transport backed by the real gateway endpoint.
pub struct HttpLoginTransport {
    client: Client,
    login_url: String,
    referer: String,
}

impl HttpLoginTransport {
    pub fn new(config: &GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            login_url: config.login_url.clone(),
            referer: config.login_referer.clone(),
        }
    }
}

#[async_trait]
impl LoginTransport for HttpLoginTransport {
    async fn login(&self) -> Result<String> {
        let response = self
            .client
            .post(&self.login_url)
            .header("Accept", "application/json, text/plain, */*")
            .header("Referer", &self.referer)
            .json(&json!({ "state": LOGIN_STATE, "city": LOGIN_CITY }))
            .send()
            .await?;

        // Login is the one endpoint that answers in plaintext; the token
        // sits at the top level of the body.
        let body: Value = response.json().await?;
        let token = body
            .get("token")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        debug!(empty = token.is_empty(), "login round-trip finished");
        Ok(token)
    }
}

struct BrokerState {
    cached: Option<String>,
    /// Pending flight other callers can join: (flight id, result channel).
    in_flight: Option<(u64, watch::Receiver<Option<String>>)>,
    next_flight: u64,
}

/// Process-wide token cache with single-flight refresh.
pub struct TokenBroker {
    transport: Arc<dyn LoginTransport>,
    state: Mutex<BrokerState>,
}

impl TokenBroker {
    pub fn new(transport: Arc<dyn LoginTransport>) -> Self {
        Self {
            transport,
            state: Mutex::new(BrokerState {
                cached: None,
                in_flight: None,
                next_flight: 0,
            }),
        }
    }

    /// Broker against the real login endpoint.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(Arc::new(HttpLoginTransport::new(config)))
    }

    /// Fetch the current token.
    ///
    /// With a warm cache and `force_refresh == false` this returns
    /// immediately. A refresh already in flight is joined rather than
    /// duplicated. `force_refresh == true` always issues a fresh login and
    /// replaces the cache on success. Failures resolve to `""` and are
    /// never cached or raised.
    #[instrument(skip(self))]
    pub async fn token(&self, force_refresh: bool) -> String {
        let (flight_id, result_tx) = {
            let mut state = self.state.lock().await;
            if !force_refresh {
                if let Some(token) = &state.cached {
                    return token.clone();
                }
                if let Some((_, result_rx)) = &state.in_flight {
                    let result_rx = result_rx.clone();
                    drop(state);
                    return Self::join_flight(result_rx).await;
                }
            }

            let flight_id = state.next_flight;
            state.next_flight += 1;
            let (result_tx, result_rx) = watch::channel(None);
            // Late arrivals join this flight, including one a forced
            // refresh starts over an older pending one.
            state.in_flight = Some((flight_id, result_rx));
            (flight_id, result_tx)
        };

        // The lock is not held across the network call; coalescing works
        // by sharing the flight's result channel.
        let token = match self.transport.login().await {
            Ok(token) => token,
            Err(err) => {
                warn!(%err, "login failed");
                String::new()
            }
        };

        let mut state = self.state.lock().await;
        if !token.is_empty() {
            state.cached = Some(token.clone());
            info!("gateway token refreshed");
        }
        if matches!(state.in_flight, Some((id, _)) if id == flight_id) {
            state.in_flight = None;
        }
        drop(state);

        let _ = result_tx.send(Some(token.clone()));
        token
    }

    async fn join_flight(mut result_rx: watch::Receiver<Option<String>>) -> String {
        loop {
            let settled = result_rx.borrow().clone();
            if let Some(token) = settled {
                return token;
            }
            if result_rx.changed().await.is_err() {
                return String::new();
            }
        }
    }

    /// Cached token, if any, without triggering a refresh.
    pub async fn current_token(&self) -> Option<String> {
        self.state.lock().await.cached.clone()
    }

    /// Install an externally supplied token (operator override). Empty
    /// tokens are ignored.
    pub async fn seed(&self, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        self.state.lock().await.cached = Some(token);
        info!("gateway token seeded");
    }

    /// Seed from the remote override store, if it holds one.
    pub async fn seed_from(&self, store: &dyn TokenStore) -> bool {
        match store.get().await {
            Some(token) if !token.is_empty() => {
                self.seed(token).await;
                true
            }
            _ => false,
        }
    }

    /// Drop the cached token. Test isolation hook; the next caller logs
    /// in from scratch.
    pub async fn reset(&self) {
        self.state.lock().await.cached = None;
    }
}
