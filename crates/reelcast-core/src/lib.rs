//! Reelcast Core - Playback session manager for VOD and live HLS sources
//!
//! This crate provides:
//! - Source resolution from catalog identifiers to manifest URLs
//! - Playback path detection (software engine, native, unsupported)
//! - A playback session binding one engine to one rendering surface
//! - Fault classification and recovery for engine errors
//! - Catalog listing and upload client (`catalog` feature)
//! - A headless HTTP engine for display-less hosts (`headless` feature)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Reelcast Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │    Source    │  │  Capability  │  │    Fault     │           │
//! │  │   Resolver   │  │   Detector   │  │    Policy    │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │  Playback   │◀──── PlaybackEvent           │
//! │                    │   Session   │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │   Catalog    │  │  Streaming  │  │  Rendering   │            │
//! │  │    Client    │  │   Engine    │  │   Surface    │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod resolver;
pub mod capability;
pub mod fault;
pub mod engine;
pub mod session;
pub mod manifest;
#[cfg(feature = "catalog")]
pub mod catalog;
#[cfg(feature = "headless")]
pub mod headless;

pub use error::{Error, Result};
pub use types::*;
pub use config::{EngineConfig, PlayerConfig};
pub use resolver::SourceResolver;
pub use capability::{detect, PlaybackPath, RuntimeEnvironment};
pub use fault::{classify, decide, EngineErrorType, Fault, RawFault, RecoveryAction};
pub use engine::{
    EngineEvent, EngineFactory, PlayRejected, PlaybackEvent, RenderingSurface, StreamingEngine,
    SurfaceEvent, HLS_MIME_TYPE,
};
pub use session::PlaybackSession;
#[cfg(feature = "catalog")]
pub use catalog::{Catalog, CatalogApi, HttpCatalogClient, UploadReceipt};
#[cfg(feature = "headless")]
pub use headless::{HeadlessEngine, HeadlessEngineFactory, HeadlessSurface};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Reelcast Core initialized");
}
