//! Stream URL resolution
//!
//! Maps a content slug to a directly playable URL via the media gateway.
//! Unlike the catalog endpoints this one sits on the other side of a
//! trust boundary: the upstream rejects requests carrying the bearer
//! token with a signature error, so the request is deliberately
//! unauthenticated. The returned URL already embeds short-lived edge
//! tokens in its query string; their expiry is not managed here.

use crate::cipher;
use crate::error::Result;
use crate::gateway::pick;
use crate::types::{ContentKind, GatewayConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

/// URL fields the resolver payload may carry, in precedence order.
const STREAM_URL_FIELDS: &[&str] = &["ChannelStreamingUrls", "HlsUrl"];

/// Sentinel subscriber identity the media gateway expects for anonymous
/// resolution.
const SENTINEL_SUBSCRIBER: &str = "9999999999";

/// Resolves a content slug to a playable URL.
///
/// The playback session depends on this seam, not the HTTP
/// implementation, so failure paths can be driven in tests.
#[async_trait]
pub trait StreamLocator: Send + Sync {
    /// Resolve `slug` to a playable URL. An empty string means the
    /// stream is offline or unknown; implementations swallow transport
    /// failures into that same shape.
    async fn resolve(&self, slug: &str, kind: ContentKind) -> Result<String>;
}

/// First non-empty stream URL in a decrypted resolver payload.
fn stream_url_from(payload: &Value) -> String {
    payload
        .get("data")
        .and_then(|data| pick(data, STREAM_URL_FIELDS))
        .unwrap_or_default()
}

/// Unwrap a raw response envelope down to the stream URL.
fn url_from_envelope(envelope: &Value) -> String {
    envelope
        .get("eData")
        .and_then(Value::as_str)
        .and_then(cipher::decrypt_envelope)
        .map(|payload| stream_url_from(&payload))
        .unwrap_or_default()
}

/// Locator backed by the real media gateway.
pub struct StreamResolver {
    http: Client,
    config: GatewayConfig,
}

impl StreamResolver {
    pub fn new(config: GatewayConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");

        Self { http, config }
    }
}

#[async_trait]
impl StreamLocator for StreamResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, slug: &str, kind: ContentKind) -> Result<String> {
        let body = json!({
            "slug": slug,
            "phone_details": self.config.user_agent,
            "ip": "",
            "type": kind.stream_kind(),
            "user_id": SENTINEL_SUBSCRIBER,
            "mobile": SENTINEL_SUBSCRIBER,
        });

        // No bearer header: see the module docs.
        let url = format!("{}get-channel-url", self.config.media_base);
        let response = match self.http.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(slug, %err, "resolver request failed");
                return Ok(String::new());
            }
        };

        let envelope: Value = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(slug, %err, "resolver response was not JSON");
                return Ok(String::new());
            }
        };

        let stream_url = url_from_envelope(&envelope);
        debug!(slug, found = !stream_url.is_empty(), "stream resolved");
        Ok(stream_url)
    }
}
