//! Capability detection: which playback path the runtime can use

use crate::engine::{EngineFactory, RenderingSurface, HLS_MIME_TYPE};
use serde::{Deserialize, Serialize};

/// How a session will play a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPath {
    /// A software streaming engine drives the surface
    EngineManaged,
    /// The surface parses the manifest itself
    NativeManaged,
    /// Neither is available
    Unsupported,
}

impl std::fmt::Display for PlaybackPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPath::EngineManaged => write!(f, "engine"),
            PlaybackPath::NativeManaged => write!(f, "native"),
            PlaybackPath::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// What the current runtime offers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEnvironment {
    pub engine_supported: bool,
    pub native_manifest_support: bool,
}

impl RuntimeEnvironment {
    /// Query an engine factory and a surface
    pub fn probe(factory: &dyn EngineFactory, surface: &dyn RenderingSurface) -> Self {
        Self {
            engine_supported: factory.is_supported(),
            native_manifest_support: surface.can_play_type(HLS_MIME_TYPE),
        }
    }
}

/// Pick the playback path.
///
/// Engine-managed playback wins whenever it is available since only the
/// engine reports classified faults and exposes recovery hooks; native
/// playback is the fallback for runtimes where the engine cannot run.
pub fn detect(env: &RuntimeEnvironment) -> PlaybackPath {
    if env.engine_supported {
        PlaybackPath::EngineManaged
    } else if env.native_manifest_support {
        PlaybackPath::NativeManaged
    } else {
        PlaybackPath::Unsupported
    }
}
