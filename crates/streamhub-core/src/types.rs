//! Core types for Streamhub

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of playable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Channel,
    Vod,
    Episode,
}

impl ContentKind {
    /// Map an upstream kind string onto the domain kind, falling back to
    /// `default` when the field is absent or unrecognized. Upstream uses
    /// `movie` and `vod` interchangeably.
    pub fn parse_or(raw: Option<&str>, default: ContentKind) -> ContentKind {
        match raw {
            Some("vod") | Some("movie") => ContentKind::Vod,
            Some("episode") => ContentKind::Episode,
            Some("channel") => ContentKind::Channel,
            _ => default,
        }
    }

    /// The kind string the stream resolver endpoint accepts. It only
    /// distinguishes live channels from on-demand content, so movies and
    /// episodes collapse to `vod`.
    pub fn stream_kind(&self) -> &'static str {
        match self {
            ContentKind::Channel => "channel",
            ContentKind::Vod | ContentKind::Episode => "vod",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Channel => write!(f, "channel"),
            ContentKind::Vod => write!(f, "vod"),
            ContentKind::Episode => write!(f, "episode"),
        }
    }
}

/// Canonical catalog record produced by the gateway client.
///
/// Upstream payloads spell the same attribute several different ways per
/// endpoint; records are built by applying an ordered candidate-field list
/// per attribute (see the gateway module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Namespaced identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Artwork reference (logo or poster URL)
    pub art: Option<String>,
    /// Upstream slug used for stream resolution
    pub slug: Option<String>,
    /// Content kind
    pub kind: ContentKind,
}

/// Item in the home-screen hero carousel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderItem {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub slug: Option<String>,
    pub kind: ContentKind,
}

/// Titled row of catalog records on the home screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeSection {
    pub title: String,
    pub items: Vec<ContentRecord>,
}

/// Everything the home endpoint produces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeContent {
    pub slider: Vec<SliderItem>,
    pub sections: Vec<HomeSection>,
}

/// Reference to content the UI wants played.
///
/// Either a direct URL (resolution is skipped) or a slug the stream
/// resolver can map to a playable URL.
#[derive(Debug, Clone)]
pub struct ContentRef {
    /// Directly playable URL, if already known
    pub url: Option<Url>,
    /// Upstream slug for resolution
    pub slug: Option<String>,
    /// Content kind
    pub kind: ContentKind,
    /// Name shown while loading
    pub display_name: Option<String>,
}

impl ContentRef {
    /// Reference content by an already-resolved URL.
    pub fn direct(url: Url) -> Self {
        Self {
            url: Some(url),
            slug: None,
            kind: ContentKind::Channel,
            display_name: None,
        }
    }

    /// Reference content by slug; the session resolves it on start.
    pub fn by_slug(slug: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            url: None,
            slug: Some(slug.into()),
            kind,
            display_name: None,
        }
    }

    /// Attach a display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// How decoded frames are scaled into the display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    Contain,
    Cover,
    Fill,
}

impl FitMode {
    /// Next mode in the fixed user-facing cycle.
    pub fn next(self) -> FitMode {
        match self {
            FitMode::Contain => FitMode::Cover,
            FitMode::Cover => FitMode::Fill,
            FitMode::Fill => FitMode::Contain,
        }
    }
}

impl std::fmt::Display for FitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitMode::Contain => write!(f, "contain"),
            FitMode::Cover => write!(f, "cover"),
            FitMode::Fill => write!(f, "fill"),
        }
    }
}

/// Observed viewport dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Taller than wide
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// Surface placement derived from the viewport.
///
/// The upstream streams carry a landscape-only layout; on a portrait
/// viewport the surface renders rotated a quarter turn with its
/// dimensions swapped, so the video fills the long axis of the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceLayout {
    pub rotated: bool,
    pub width: u32,
    pub height: u32,
}

impl SurfaceLayout {
    pub fn for_viewport(viewport: Viewport) -> Self {
        if viewport.is_portrait() {
            Self {
                rotated: true,
                width: viewport.height,
                height: viewport.width,
            }
        } else {
            Self {
                rotated: false,
                width: viewport.width,
                height: viewport.height,
            }
        }
    }
}

/// Why a playback attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackFault {
    /// The resolver did not answer within the watchdog window
    GatewayTimeout,
    /// The resolver answered with no URL
    StreamOffline,
    /// Resolution or attach failed outright
    LinkExpired,
    /// The engine hit an unrecoverable fatal error
    BufferStalled,
}

impl PlaybackFault {
    /// User-facing label for the error overlay.
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackFault::GatewayTimeout => "Gateway Timeout",
            PlaybackFault::StreamOffline => "Stream Offline",
            PlaybackFault::LinkExpired => "Link Expired",
            PlaybackFault::BufferStalled => "Buffer Error",
        }
    }
}

impl std::fmt::Display for PlaybackFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Playback session state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// Session created, nothing started
    Idle,
    /// Waiting on the stream resolver
    Resolving,
    /// Engine holds a source; playing/paused tracked orthogonally
    Attached,
    /// Failed; exits only via retry or close
    Failed(PlaybackFault),
    /// Torn down
    Closed,
}

impl PlaybackPhase {
    /// Check if transition to target phase is valid
    pub fn can_transition_to(&self, target: PlaybackPhase) -> bool {
        use PlaybackPhase::*;
        match (self, target) {
            (Closed, _) => false,
            // Teardown is reachable from every live phase.
            (_, Closed) => true,
            // Direct URLs skip resolution, so Attached is reachable from
            // Idle and (on retry) from Failed.
            (Idle, Resolving) | (Idle, Attached) | (Idle, Failed(_)) => true,
            (Resolving, Attached) | (Resolving, Failed(_)) => true,
            (Attached, Failed(_)) => true,
            (Failed(_), Resolving) | (Failed(_), Attached) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::Idle => write!(f, "idle"),
            PlaybackPhase::Resolving => write!(f, "resolving"),
            PlaybackPhase::Attached => write!(f, "attached"),
            PlaybackPhase::Failed(fault) => write!(f, "failed({})", fault),
            PlaybackPhase::Closed => write!(f, "closed"),
        }
    }
}

/// Gateway client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the v5 catalog API (home/genre carousels)
    pub carousel_base: String,
    /// Base URL of the v3 catalog API (channel list)
    pub channels_base: String,
    /// Base URL of the media gateway (stream resolution, unauthenticated)
    pub media_base: String,
    /// Login endpoint issuing the bearer token
    pub login_url: String,
    /// Referer the login endpoint expects
    pub login_referer: String,
    /// Fixed project discriminator sent with every catalog request
    pub project_id: String,
    /// Fixed platform discriminator sent with every catalog request
    pub platform: String,
    /// User agent for gateway requests and resolver phone_details
    pub user_agent: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            carousel_base: "https://web.jazztv.pk/alpha/api_gateway/v5/web/".to_string(),
            channels_base: "https://web.jazztv.pk/alpha/api_gateway/v3/web/".to_string(),
            media_base: "https://jazztv.pk/alpha/api_gateway/index.php/media/".to_string(),
            login_url: "https://web.jazztv.pk/alpha/api_gateway/v5/auth/login".to_string(),
            login_referer: "https://www.tamashaweb.com/live-tv".to_string(),
            project_id: "2".to_string(),
            platform: "web".to_string(),
            user_agent: concat!("streamhub/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Playback session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Watchdog window for stream resolution
    pub resolve_timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            resolve_timeout: Duration::from_secs(12),
        }
    }
}

/// Timing constants the UI shell consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiTimings {
    /// How long the splash screen stays up
    pub splash_duration: Duration,
    /// Hero carousel auto-rotation interval
    pub slider_rotation: Duration,
}

impl Default for UiTimings {
    fn default() -> Self {
        Self {
            splash_duration: Duration::from_millis(4500),
            slider_rotation: Duration::from_secs(5),
        }
    }
}
