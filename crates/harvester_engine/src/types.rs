use std::fmt;
use std::time::Duration;

use harvester_core::HarvestRun;

use crate::sink::PersistError;

/// Opaque id of one browsing context inside a render session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextHandle(pub u64);

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RenderError {
    pub kind: RenderFailure,
    pub message: String,
}

impl RenderError {
    pub fn new(kind: RenderFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailure {
    /// Engine could not start or refused a new context.
    Launch,
    UnknownContext(ContextHandle),
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Navigation,
    Script,
    Decode,
    Network,
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFailure::Launch => write!(f, "launch failure"),
            RenderFailure::UnknownContext(handle) => write!(f, "unknown context {handle}"),
            RenderFailure::InvalidUrl => write!(f, "invalid url"),
            RenderFailure::HttpStatus(code) => write!(f, "http status {code}"),
            RenderFailure::Timeout => write!(f, "timeout"),
            RenderFailure::Navigation => write!(f, "navigation failure"),
            RenderFailure::Script => write!(f, "script failure"),
            RenderFailure::Decode => write!(f, "decode failure"),
            RenderFailure::Network => write!(f, "network error"),
        }
    }
}

/// Why a detail fetch produced the unknown answer instead of real content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// Answer container did not appear within the render timeout.
    RenderTimeout(Duration),
    /// Navigation, wait or snapshot failed on the detail context.
    Navigation(RenderError),
    /// Page rendered but the answer container was missing or empty.
    MissingAnswer,
    /// Run deadline passed or the run was cancelled.
    DeadlineExceeded,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::RenderTimeout(timeout) => {
                write!(f, "answer did not render within {timeout:?}")
            }
            DegradeReason::Navigation(err) => write!(f, "{err}"),
            DegradeReason::MissingAnswer => write!(f, "answer container missing or empty"),
            DegradeReason::DeadlineExceeded => write!(f, "run deadline exceeded"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("render session failed: {0}")]
    Launch(RenderError),
    #[error("listing scan failed: {0}")]
    Listing(RenderError),
    /// The run finished but could not be written; the run is handed back so
    /// the caller can report or retry it.
    #[error("failed to persist harvest: {source}")]
    Persist {
        #[source]
        source: PersistError,
        run: Box<HarvestRun>,
    },
}
