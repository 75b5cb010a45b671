//! Core types for Reelcast

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
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

/// Identity of one engine instance, or of one native source attachment.
///
/// Every notification carries the id of the handle that produced it, so
/// callbacks from a torn-down handle can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineHandleId(pub Uuid);

impl EngineHandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineHandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EngineHandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// On-demand recording or live stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Vod,
    Live,
}

impl ContentKind {
    /// Path segment of the endpoint family serving this kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            ContentKind::Vod => "videos",
            ContentKind::Live => "live",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Vod => write!(f, "vod"),
            ContentKind::Live => write!(f, "live"),
        }
    }
}

/// A playable item in the catalog.
///
/// Identity is `(identifier, kind)`: the same identifier under a different
/// kind addresses a different manifest endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    identifier: String,
    kind: ContentKind,
}

impl ContentRef {
    pub fn new(identifier: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
        }
    }

    /// Pre-recorded video
    pub fn vod(identifier: impl Into<String>) -> Self {
        Self::new(identifier, ContentKind::Vod)
    }

    /// Active live stream
    pub fn live(identifier: impl Into<String>) -> Self {
        Self::new(identifier, ContentKind::Live)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        self.kind == ContentKind::Live
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.identifier)
    }
}

/// Fault taxonomy used by the recovery policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Transient transport failure
    Network,
    /// Decoder or pipeline failure, sometimes self-healing
    Media,
    /// Anything else the engine declares fatal
    Fatal,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::Network => write!(f, "network"),
            FaultKind::Media => write!(f, "media"),
            FaultKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// Observable status of a playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Initial state, nothing bound to the surface
    Idle,
    /// Source requested, waiting for the manifest or metadata
    Loading,
    /// Manifest parsed and playback requested
    Playing,
    /// Recovery action issued for a non-fatal fault
    Recovering(FaultKind),
    /// Unrecoverable; carries the reason
    Failed(String),
}

impl PlaybackStatus {
    /// Check if the session can still react to engine notifications
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PlaybackStatus::Loading | PlaybackStatus::Playing | PlaybackStatus::Recovering(_)
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackStatus::Failed(_))
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Loading => write!(f, "loading"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Recovering(kind) => write!(f, "recovering({})", kind),
            PlaybackStatus::Failed(reason) => write!(f, "failed({})", reason),
        }
    }
}

/// Recorded status transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: PlaybackStatus,
    pub to: PlaybackStatus,
    pub at: DateTime<Utc>,
}

/// What the caller of a session renders: status, spinner, banner text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: PlaybackStatus,
    /// True until the manifest or metadata arrives
    pub loading: bool,
    /// Warning or error text for the user, if any
    pub message: Option<String>,
    pub content: Option<ContentRef>,
}
