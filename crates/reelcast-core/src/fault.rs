//! Fault classification and recovery policy
//!
//! | Fault   | Action                         | Status               |
//! |---------|--------------------------------|----------------------|
//! | Network | resume loading                 | `Recovering(Network)`|
//! | Media   | recover decoder in place       | `Recovering(Media)`  |
//! | Fatal   | destroy engine, detach surface | `Failed(detail)`     |
//!
//! The policy keeps no counters and applies no backoff: each fault
//! notification gets exactly one table lookup.

use crate::FaultKind;
use serde::{Deserialize, Serialize};

/// Error category as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorType {
    Network,
    Media,
    /// Any other engine category (mux, key system, internal...)
    Other(String),
}

impl std::fmt::Display for EngineErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrorType::Network => write!(f, "networkError"),
            EngineErrorType::Media => write!(f, "mediaError"),
            EngineErrorType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Error payload exactly as the engine emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFault {
    pub error_type: EngineErrorType,
    /// `None` when the engine did not declare fatality
    pub fatal: Option<bool>,
    pub detail: String,
}

impl RawFault {
    pub fn new(error_type: EngineErrorType, fatal: Option<bool>, detail: impl Into<String>) -> Self {
        Self {
            error_type,
            fatal,
            detail: detail.into(),
        }
    }

    pub fn network(fatal: bool, detail: impl Into<String>) -> Self {
        Self::new(EngineErrorType::Network, Some(fatal), detail)
    }

    pub fn media(fatal: bool, detail: impl Into<String>) -> Self {
        Self::new(EngineErrorType::Media, Some(fatal), detail)
    }

    pub fn other(name: impl Into<String>, fatal: bool, detail: impl Into<String>) -> Self {
        Self::new(EngineErrorType::Other(name.into()), Some(fatal), detail)
    }
}

/// A classified fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub detail: String,
}

impl Fault {
    /// Text shown to the user while the fault is handled
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            FaultKind::Network => "Network error. Please check your connection.",
            FaultKind::Media => "Media error. Trying to recover...",
            FaultKind::Fatal => "Fatal error. Cannot recover.",
        }
    }
}

/// What the session does about a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// `start_load()` on the engine
    ResumeLoading,
    /// `recover_media_error()` on the engine
    RecoverMedia,
    /// Destroy the engine and detach the surface
    Teardown,
}

/// Classify a raw engine error.
///
/// Returns `None` for informational errors: those with no declared fatal
/// flag, and non-fatal errors outside the network/media categories.
pub fn classify(raw: &RawFault) -> Option<Fault> {
    let fatal = raw.fatal?;

    let kind = match (&raw.error_type, fatal) {
        (EngineErrorType::Network, _) => FaultKind::Network,
        (EngineErrorType::Media, _) => FaultKind::Media,
        (EngineErrorType::Other(_), true) => FaultKind::Fatal,
        (EngineErrorType::Other(_), false) => return None,
    };

    Some(Fault {
        kind,
        detail: raw.detail.clone(),
    })
}

/// Recovery action for a classified fault
pub fn decide(fault: &Fault) -> RecoveryAction {
    match fault.kind {
        FaultKind::Network => RecoveryAction::ResumeLoading,
        FaultKind::Media => RecoveryAction::RecoverMedia,
        FaultKind::Fatal => RecoveryAction::Teardown,
    }
}
