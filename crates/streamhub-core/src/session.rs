//! Playback session - orchestrator for one playback attempt chain
//!
//! Coordinates:
//! - Stream URL resolution raced against a watchdog timer
//! - Adaptive engine lifecycle and safe playback start
//! - Fatal-error classification with in-place recovery
//! - Orientation-aware surface layout
//! - Teardown, stale-result suppression, and retry

use crate::{
    engine::{AdaptiveEngine, EngineEvent, EngineFactory},
    resolver::StreamLocator,
    types::*,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Playback session managing a single content reference.
///
/// Created when the UI presents content, destroyed on close. The session
/// owns its engine instances exclusively; every attempt gets a fresh one.
pub struct PlayerSession {
    /// Self-handle for spawning the event pump
    handle: Weak<PlayerSession>,
    /// Unique session ID
    id: SessionId,
    /// What to play
    content: ContentRef,
    /// Session configuration
    config: PlaybackConfig,
    /// Stream resolver
    locator: Arc<dyn StreamLocator>,
    /// Engine factory, one instance per attempt
    engines: Arc<dyn EngineFactory>,
    /// Current phase
    phase: RwLock<PlaybackPhase>,
    /// Phase change broadcaster
    phase_tx: watch::Sender<PlaybackPhase>,
    /// Engine for the current attempt
    engine: RwLock<Option<Arc<dyn AdaptiveEngine>>>,
    /// Surface fit mode
    fit: RwLock<FitMode>,
    /// Surface layout derived from the observed viewport
    layout: RwLock<SurfaceLayout>,
    /// Orthogonal playing/paused flag while attached
    playing: AtomicBool,
    /// Liveness flag; once false, pending async results are discarded
    alive: AtomicBool,
    /// User retry counter
    attempt: AtomicU32,
    /// Spawned event pumps, aborted on close
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PlayerSession {
    /// Create a new session for a content reference.
    pub fn new(
        content: ContentRef,
        config: PlaybackConfig,
        locator: Arc<dyn StreamLocator>,
        engines: Arc<dyn EngineFactory>,
    ) -> Arc<Self> {
        let (phase_tx, _) = watch::channel(PlaybackPhase::Idle);

        Arc::new_cyclic(|handle| Self {
            handle: handle.clone(),
            id: SessionId::new(),
            content,
            config,
            locator,
            engines,
            phase: RwLock::new(PlaybackPhase::Idle),
            phase_tx,
            engine: RwLock::new(None),
            fit: RwLock::new(FitMode::Contain),
            layout: RwLock::new(SurfaceLayout::default()),
            playing: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            attempt: AtomicU32::new(0),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The content reference this session plays
    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    /// Get current phase
    pub async fn phase(&self) -> PlaybackPhase {
        *self.phase.read().await
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<PlaybackPhase> {
        self.phase_tx.subscribe()
    }

    /// Current fault, if the session is in a failed phase
    pub async fn fault(&self) -> Option<PlaybackFault> {
        match *self.phase.read().await {
            PlaybackPhase::Failed(fault) => Some(fault),
            _ => None,
        }
    }

    /// Whether the surface is currently rendering
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// How many user retries this session has seen
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }

    /// Current fit mode
    pub async fn fit(&self) -> FitMode {
        *self.fit.read().await
    }

    /// Current surface layout
    pub async fn layout(&self) -> SurfaceLayout {
        *self.layout.read().await
    }

    fn live(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Transition to a new phase, rejecting invalid transitions.
    async fn set_phase(&self, next: PlaybackPhase) {
        let current = {
            let mut phase = self.phase.write().await;
            let current = *phase;
            if !current.can_transition_to(next) {
                warn!(from = %current, to = %next, "rejected playback transition");
                return;
            }
            *phase = next;
            current
        };
        self.phase_tx.send_replace(next);
        info!(from = %current, to = %next, "playback transition");
    }

    async fn fail(&self, fault: PlaybackFault) {
        if !self.live() {
            return;
        }
        self.set_phase(PlaybackPhase::Failed(fault)).await;
    }

    /// Begin the playback attempt.
    ///
    /// A direct URL skips resolution; a slug is resolved with the
    /// watchdog racing the resolver. Resolution outcomes: timeout ->
    /// gateway-timeout fault, empty URL -> stream-offline fault (without
    /// waiting for the watchdog), resolver error or unparseable URL ->
    /// link-expired fault.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn start(&self) {
        if !self.live() {
            return;
        }

        let url = if let Some(url) = self.content.url.clone() {
            url
        } else if let Some(slug) = self.content.slug.clone() {
            self.set_phase(PlaybackPhase::Resolving).await;

            // The watchdog races the resolver; the losing future is
            // dropped, which also clears the timer.
            let outcome = timeout(
                self.config.resolve_timeout,
                self.locator.resolve(&slug, self.content.kind),
            )
            .await;

            if !self.live() {
                return;
            }
            match outcome {
                Err(_) => {
                    self.fail(PlaybackFault::GatewayTimeout).await;
                    return;
                }
                Ok(Err(err)) => {
                    warn!(%slug, %err, "stream resolution failed");
                    self.fail(PlaybackFault::LinkExpired).await;
                    return;
                }
                Ok(Ok(raw)) if raw.is_empty() => {
                    self.fail(PlaybackFault::StreamOffline).await;
                    return;
                }
                Ok(Ok(raw)) => match Url::parse(&raw) {
                    Ok(url) => url,
                    Err(err) => {
                        warn!(%slug, %err, "resolver returned an unparseable URL");
                        self.fail(PlaybackFault::LinkExpired).await;
                        return;
                    }
                },
            }
        } else {
            self.fail(PlaybackFault::StreamOffline).await;
            return;
        };

        self.attach(url).await;
    }

    async fn attach(&self, url: Url) {
        let engine = self.engines.create();
        let events = engine.events();
        *self.engine.write().await = Some(engine.clone());

        if let Some(session) = self.handle.upgrade() {
            let pump = tokio::spawn(session.pump_events(events));
            self.tasks.lock().await.push(pump);
        }

        if let Err(err) = engine.attach(&url).await {
            warn!(%err, "engine attach failed");
            engine.detach().await;
            *self.engine.write().await = None;
            self.fail(PlaybackFault::LinkExpired).await;
            return;
        }

        if !self.live() {
            // Closed while attaching; close() may have missed this engine.
            engine.detach().await;
            return;
        }

        self.set_phase(PlaybackPhase::Attached).await;
        info!(%url, "engine attached");
    }

    /// React to engine events until the engine goes away.
    async fn pump_events(self: Arc<Self>, mut events: broadcast::Receiver<EngineEvent>) {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "engine events lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return,
            };
            if !self.live() {
                return;
            }
            self.apply_engine_event(event).await;
        }
    }

    async fn apply_engine_event(&self, event: EngineEvent) {
        let engine = self.engine.read().await.clone();
        let Some(engine) = engine else { return };

        match event {
            EngineEvent::ManifestParsed => {
                debug!("manifest parsed, starting playback");
                safe_play(engine.as_ref()).await;
            }
            // Transient fatal classes recover in place; the phase does
            // not change and the user sees nothing.
            EngineEvent::FatalNetworkError => {
                debug!("fatal network error, reloading index");
                engine.reload_index().await;
            }
            EngineEvent::FatalMediaError => {
                debug!("fatal media error, attempting decoder recovery");
                engine.recover_decoder().await;
            }
            EngineEvent::FatalOtherError => {
                warn!("unclassified fatal engine error");
                engine.detach().await;
                *self.engine.write().await = None;
                self.fail(PlaybackFault::BufferStalled).await;
            }
            EngineEvent::Playing => self.playing.store(true, Ordering::SeqCst),
            EngineEvent::Paused => self.playing.store(false, Ordering::SeqCst),
        }
    }

    /// Toggle play/pause from user input.
    pub async fn toggle_play(&self) {
        if !self.live() {
            return;
        }
        let engine = self.engine.read().await.clone();
        let Some(engine) = engine else { return };
        if self.is_playing() {
            engine.pause().await;
        } else {
            safe_play(engine.as_ref()).await;
        }
    }

    /// Cycle the fit mode: contain -> cover -> fill -> contain.
    pub async fn cycle_fit(&self) -> FitMode {
        let mut fit = self.fit.write().await;
        *fit = fit.next();
        debug!(fit = %*fit, "fit mode cycled");
        *fit
    }

    /// Update the observed viewport. Portrait viewports rotate the
    /// surface with swapped dimensions; the engine is not touched.
    pub async fn set_viewport(&self, viewport: Viewport) {
        *self.layout.write().await = SurfaceLayout::for_viewport(viewport);
    }

    /// Retry after a failure. Ignored outside a failed phase; increments
    /// the attempt counter and re-runs the attempt from scratch with a
    /// fresh engine.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn retry(&self) {
        let phase = self.phase().await;
        if !matches!(phase, PlaybackPhase::Failed(_)) {
            warn!(%phase, "retry ignored outside a failed phase");
            return;
        }

        if let Some(engine) = self.engine.write().await.take() {
            engine.detach().await;
        }
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        info!(attempt, "retrying playback");
        self.start().await;
    }

    /// Tear the session down. Idempotent and callable from any phase:
    /// flips the liveness flag so in-flight resolution and engine
    /// callbacks become no-ops, aborts the event pumps, destroys the
    /// engine, and clears the surface.
    pub async fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);

        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        if let Some(engine) = self.engine.write().await.take() {
            engine.detach().await;
        }
        self.playing.store(false, Ordering::SeqCst);

        let previous = {
            let mut phase = self.phase.write().await;
            std::mem::replace(&mut *phase, PlaybackPhase::Closed)
        };
        if previous != PlaybackPhase::Closed {
            self.phase_tx.send_replace(PlaybackPhase::Closed);
            info!(session_id = %self.id, "session closed");
        }
    }
}

/// Attempt playback unmuted first; fall back to a muted attempt when the
/// runtime blocks autoplay. A doubly blocked session stays silently
/// paused rather than surfacing an error.
async fn safe_play(engine: &dyn AdaptiveEngine) {
    if engine.play(false).await.is_ok() {
        return;
    }
    debug!("unmuted autoplay blocked, retrying muted");
    if let Err(err) = engine.play(true).await {
        warn!(%err, "playback could not start");
    }
}
