//! Seams to the host environment: rendering surface and streaming engine
//!
//! The session never fetches segments or decodes anything itself. It drives
//! a [`StreamingEngine`] (or the surface's own native HLS support) and reacts
//! to the notifications they emit, delivered as [`PlaybackEvent`]s.

use crate::{fault::RawFault, EngineConfig, EngineHandleId};
use url::Url;

/// MIME type a surface must accept to play HLS manifests natively
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Returned by [`RenderingSurface::play`] when the host refuses to start
/// playback, typically an autoplay policy waiting for a user gesture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("play request rejected: {reason}")]
pub struct PlayRejected {
    pub reason: String,
}

impl PlayRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// A media element the session binds sources to. Owned by the host.
pub trait RenderingSurface {
    /// Whether the surface can play `mime_type` without an engine
    fn can_play_type(&self, mime_type: &str) -> bool;

    /// Point the surface at a source, or clear it with `None`
    fn set_source(&mut self, url: Option<&Url>);

    /// Ask the surface to begin playback
    fn play(&mut self) -> std::result::Result<(), PlayRejected>;
}

/// A software adaptive-streaming engine instance.
///
/// Loading, buffering and decoding happen inside the engine; results come
/// back asynchronously as [`EngineEvent`]s tagged with the instance id.
pub trait StreamingEngine {
    fn id(&self) -> EngineHandleId;

    /// Request the manifest at `url`
    fn load_source(&mut self, url: &Url);

    /// Bind the engine's output to `surface`
    fn attach_media(&mut self, surface: &mut dyn RenderingSurface);

    /// Unbind from `surface`; a no-op when not attached
    fn detach_media(&mut self, surface: &mut dyn RenderingSurface);

    /// Resume loading from the current position after a network fault
    fn start_load(&mut self);

    /// Attempt in-place decoder/pipeline recovery after a media fault
    fn recover_media_error(&mut self);

    /// Release every resource; the instance is unusable afterwards
    fn destroy(&mut self);
}

/// Creates engine instances and reports whether the runtime can run them
pub trait EngineFactory {
    fn is_supported(&self) -> bool;

    fn create(&self, id: EngineHandleId, config: &EngineConfig) -> Box<dyn StreamingEngine>;
}

/// Notifications emitted by a streaming engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Manifest fetched and parsed
    ManifestParsed,
    /// A fragment was appended to the surface's buffer
    FragmentBuffered,
    /// The engine reported an error
    Error(RawFault),
}

/// Notifications emitted by a surface playing a source natively
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Manifest and media metadata are available
    MetadataLoaded,
    /// Playback position advanced
    TimeUpdate,
    /// The surface failed to load or decode the source
    Error(String),
}

/// One notification for a session, tagged with the handle that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Engine {
        handle: EngineHandleId,
        event: EngineEvent,
    },
    Surface {
        handle: EngineHandleId,
        event: SurfaceEvent,
    },
}

impl PlaybackEvent {
    pub fn engine(handle: EngineHandleId, event: EngineEvent) -> Self {
        PlaybackEvent::Engine { handle, event }
    }

    pub fn surface(handle: EngineHandleId, event: SurfaceEvent) -> Self {
        PlaybackEvent::Surface { handle, event }
    }

    pub fn handle(&self) -> EngineHandleId {
        match self {
            PlaybackEvent::Engine { handle, .. } | PlaybackEvent::Surface { handle, .. } => *handle,
        }
    }
}
