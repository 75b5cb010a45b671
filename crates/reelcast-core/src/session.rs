//! Playback Session - binds one source to one rendering surface
//!
//! Coordinates:
//! - Source resolution and playback path detection
//! - Engine lifecycle (create, attach, destroy) on the owned surface
//! - Fault classification and recovery
//! - State machine transitions and the observable snapshot
//!
//! ```text
//! Idle ──start──▶ Loading ──parsed──▶ Playing ◀──progress── Recovering
//!                    │                   │ ───non-fatal fault──▶ │
//!                    └──── fatal ────────┴───────▶ Failed ◀──────┘
//! ```
//!
//! The session is synchronous and single-owner. Notifications are handed in
//! through [`PlaybackSession::handle_event`] in the order the engine emitted
//! them; anything tagged with a handle other than the current one is dropped.

use crate::{
    capability::{self, PlaybackPath, RuntimeEnvironment},
    engine::{EngineEvent, EngineFactory, PlaybackEvent, RenderingSurface, StreamingEngine, SurfaceEvent},
    fault::{self, RawFault, RecoveryAction},
    types::*,
    EngineConfig, PlayerConfig, Result, SourceResolver,
};
use chrono::Utc;
use std::collections::VecDeque;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Reason recorded when neither engine nor native playback is available
pub const UNSUPPORTED_REASON: &str = "playback not supported";

/// Reason recorded when a natively playing surface reports an error
pub const NATIVE_LOAD_FAILED: &str = "Failed to load video";

const UNSUPPORTED_MESSAGE: &str = "HLS is not supported in this environment";
const AUTOPLAY_BLOCKED_MESSAGE: &str = "Failed to play video. User interaction may be required.";
const MAX_HISTORY: usize = 64;

/// The binding currently attached to the surface
enum ActivePlayback {
    Engine {
        id: EngineHandleId,
        engine: Box<dyn StreamingEngine>,
    },
    Native {
        id: EngineHandleId,
    },
}

impl ActivePlayback {
    fn id(&self) -> EngineHandleId {
        match self {
            ActivePlayback::Engine { id, .. } | ActivePlayback::Native { id } => *id,
        }
    }
}

/// Playback session for a single rendering surface
pub struct PlaybackSession<S: RenderingSurface> {
    /// Unique session ID
    id: SessionId,
    /// Manifest URL builder
    resolver: SourceResolver,
    /// Engine constructor for the engine-managed path
    factory: Box<dyn EngineFactory>,
    /// Options passed to each engine instance
    engine_config: EngineConfig,
    /// Host-owned surface, returned by `dispose`
    surface: S,
    /// Content selected by the last `start`
    content: Option<ContentRef>,
    /// At most one live handle
    active: Option<ActivePlayback>,
    status: PlaybackStatus,
    loading: bool,
    message: Option<String>,
    /// Status broadcaster
    status_tx: watch::Sender<PlaybackStatus>,
    /// Recent transitions, oldest first
    history: VecDeque<StatusChange>,
}

impl<S: RenderingSurface> PlaybackSession<S> {
    /// Create a session bound to `surface`
    pub fn new(
        resolver: SourceResolver,
        factory: Box<dyn EngineFactory>,
        engine_config: EngineConfig,
        surface: S,
    ) -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::Idle);

        Self {
            id: SessionId::new(),
            resolver,
            factory,
            engine_config,
            surface,
            content: None,
            active: None,
            status: PlaybackStatus::Idle,
            loading: false,
            message: None,
            status_tx,
            history: VecDeque::new(),
        }
    }

    /// Create a session from a player config
    pub fn from_config(config: &PlayerConfig, factory: Box<dyn EngineFactory>, surface: S) -> Self {
        Self::new(
            SourceResolver::new(config.api_base_url.clone()),
            factory,
            config.engine.clone(),
            surface,
        )
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> &PlaybackStatus {
        &self.status
    }

    pub fn content(&self) -> Option<&ContentRef> {
        self.content.as_ref()
    }

    /// Id of the live handle, if any. Hosts tag surface notifications with it.
    pub fn engine_handle(&self) -> Option<EngineHandleId> {
        self.active.as_ref().map(ActivePlayback::id)
    }

    /// True when an engine instance (not a native source) is attached
    pub fn has_engine(&self) -> bool {
        matches!(self.active, Some(ActivePlayback::Engine { .. }))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status.clone(),
            loading: self.loading,
            message: self.message.clone(),
            content: self.content.clone(),
        }
    }

    /// Recent status transitions, oldest first
    pub fn history(&self) -> impl Iterator<Item = &StatusChange> {
        self.history.iter()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    fn set_status(&mut self, new_status: PlaybackStatus) {
        if self.status == new_status {
            return;
        }

        let from = std::mem::replace(&mut self.status, new_status.clone());
        info!(session_id = %self.id, from = %from, to = %new_status, "State transition");

        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(StatusChange {
            from,
            to: new_status.clone(),
            at: Utc::now(),
        });
        self.status_tx.send_replace(new_status);
    }

    /// Start playing `content`, replacing whatever was bound before.
    ///
    /// Fails fast with [`crate::Error::InvalidContentRef`] when the content
    /// cannot be resolved; the session is then left idle. Playback problems
    /// never surface here: they become session status.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn start(&mut self, content: ContentRef) -> Result<()> {
        self.teardown();
        self.content = None;
        self.message = None;
        self.loading = false;
        self.set_status(PlaybackStatus::Idle);

        let url = self.resolver.resolve(&content)?;
        let env = RuntimeEnvironment::probe(self.factory.as_ref(), &self.surface);
        let path = capability::detect(&env);

        info!(content = %content, url = %url, path = %path, "Starting playback");
        self.content = Some(content);

        match path {
            PlaybackPath::EngineManaged => {
                let id = EngineHandleId::new();
                let mut engine = self.factory.create(id, &self.engine_config);
                engine.load_source(&url);
                engine.attach_media(&mut self.surface);
                self.active = Some(ActivePlayback::Engine { id, engine });
                self.loading = true;
                self.set_status(PlaybackStatus::Loading);
            }
            PlaybackPath::NativeManaged => {
                let id = EngineHandleId::new();
                self.surface.set_source(Some(&url));
                self.active = Some(ActivePlayback::Native { id });
                self.loading = true;
                self.set_status(PlaybackStatus::Loading);
            }
            PlaybackPath::Unsupported => {
                warn!("No playback path available");
                self.message = Some(UNSUPPORTED_MESSAGE.to_string());
                self.set_status(PlaybackStatus::Failed(UNSUPPORTED_REASON.to_string()));
            }
        }

        Ok(())
    }

    /// Tear down the current binding and return to idle.
    ///
    /// Idempotent: with nothing attached and the session idle or failed this
    /// does nothing, so a failure message stays visible until the next start.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn stop(&mut self) {
        if self.active.is_none()
            && matches!(self.status, PlaybackStatus::Idle | PlaybackStatus::Failed(_))
        {
            return;
        }

        info!("Stopping playback");
        self.teardown();
        self.loading = false;
        self.message = None;
        self.set_status(PlaybackStatus::Idle);
    }

    /// Stop and hand the surface back to its owner
    pub fn dispose(mut self) -> S {
        self.stop();
        self.surface
    }

    /// Detach and destroy whatever is bound to the surface
    fn teardown(&mut self) {
        match self.active.take() {
            Some(ActivePlayback::Engine { id, mut engine }) => {
                debug!(handle = %id, "Destroying engine");
                engine.detach_media(&mut self.surface);
                engine.destroy();
            }
            Some(ActivePlayback::Native { id }) => {
                debug!(handle = %id, "Clearing native source");
                self.surface.set_source(None);
            }
            None => {}
        }
    }

    /// Apply one notification from the engine or the surface
    pub fn handle_event(&mut self, event: PlaybackEvent) {
        let handle = event.handle();
        let current = self.engine_handle();

        if current != Some(handle) {
            debug!(handle = %handle, current = ?current, "Ignoring event from stale handle");
            return;
        }
        if !self.status.is_active() {
            debug!(status = %self.status, "Ignoring event outside active playback");
            return;
        }

        match (event, self.has_engine()) {
            (PlaybackEvent::Engine { event, .. }, true) => self.on_engine_event(event),
            (PlaybackEvent::Surface { event, .. }, false) => self.on_surface_event(event),
            (event, _) => debug!(?event, "Ignoring event for the other playback path"),
        }
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::ManifestParsed => self.on_ready(),
            EngineEvent::FragmentBuffered => self.on_progress(),
            EngineEvent::Error(raw) => self.on_engine_error(raw),
        }
    }

    fn on_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::MetadataLoaded => self.on_ready(),
            SurfaceEvent::TimeUpdate => self.on_progress(),
            SurfaceEvent::Error(detail) => {
                warn!(detail = %detail, "Native playback failed");
                self.teardown();
                self.loading = false;
                self.message = Some(NATIVE_LOAD_FAILED.to_string());
                self.set_status(PlaybackStatus::Failed(NATIVE_LOAD_FAILED.to_string()));
            }
        }
    }

    /// Manifest or metadata ready: start playing
    fn on_ready(&mut self) {
        if !matches!(self.status, PlaybackStatus::Loading | PlaybackStatus::Recovering(_)) {
            return;
        }

        self.loading = false;
        self.message = None;
        self.set_status(PlaybackStatus::Playing);

        if let Err(rejected) = self.surface.play() {
            warn!(reason = %rejected.reason, "Play request rejected");
            self.message = Some(AUTOPLAY_BLOCKED_MESSAGE.to_string());
        }
    }

    fn on_progress(&mut self) {
        if matches!(self.status, PlaybackStatus::Recovering(_)) {
            info!("Recovered");
            self.message = None;
            self.set_status(PlaybackStatus::Playing);
        }
    }

    fn on_engine_error(&mut self, raw: RawFault) {
        let Some(fault) = fault::classify(&raw) else {
            debug!(error_type = %raw.error_type, detail = %raw.detail, "Informational engine error");
            return;
        };

        let action = fault::decide(&fault);
        warn!(kind = %fault.kind, detail = %fault.detail, action = ?action, "Playback fault");
        self.message = Some(fault.user_message().to_string());

        match action {
            RecoveryAction::ResumeLoading | RecoveryAction::RecoverMedia => {
                self.set_status(PlaybackStatus::Recovering(fault.kind));
                if let Some(ActivePlayback::Engine { engine, .. }) = self.active.as_mut() {
                    if action == RecoveryAction::ResumeLoading {
                        engine.start_load();
                    } else {
                        engine.recover_media_error();
                    }
                }
            }
            RecoveryAction::Teardown => {
                self.teardown();
                self.loading = false;
                self.set_status(PlaybackStatus::Failed(fault.detail));
            }
        }
    }
}
