use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
///
/// Every variant is scoped to a single surface or a single request. None of
/// them is fatal to the process: callers log the condition and either drop
/// the offending frame or degrade to defaults.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    #[error("malformed tree: {0}")]
    /// A component tree had a duplicate id or a dangling child/template
    /// reference. The tree frame is dropped.
    MalformedTree(String),
    #[error("path not found: {0}")]
    /// A patch path did not resolve against the current data model. The patch
    /// is dropped.
    PathNotFound(String),
    #[error("malformed action: {0}")]
    /// An upstream action lacked required fields.
    MalformedAction(String),
    #[error("malformed error envelope: {0}")]
    /// An upstream error envelope lacked required fields.
    MalformedErrorEnvelope(String),
    #[error("unknown surface: {0}")]
    /// No agent or session is registered for the surface id.
    UnknownSurface(String),
    #[error("ambiguous surface: {0} has several live sessions")]
    /// A surface id was used alone while several independent sessions are
    /// live for it. Address the session by key instead.
    AmbiguousSurface(String),
    #[error("unknown session: {0}")]
    /// The session key does not name a live session.
    UnknownSession(String),
    #[error("surface closed: {0}")]
    /// The surface has already been closed.
    SurfaceClosed(String),
    #[error("codec: {0}")]
    /// Frame encoding or decoding failure.
    Codec(String),
    #[error("config: {0}")]
    /// Configuration could not be read or parsed.
    Config(String),
    #[error("internal: {0}")]
    /// Internal error.
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Config(e.to_string())
    }
}
