//! Error taxonomy shared by every scene operation.
//!
//! Each failure carries exactly one [`ErrorKind`]. Only
//! [`SceneError::SessionUnavailable`] is fatal; everything else is rejected
//! locally or caught at the I/O task boundary and surfaced as a notification.

use thiserror::Error;

/// Fieldless classification of a [`SceneError`], handy for matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Parse,
    InvalidReference,
    InvalidTransform,
    NoModelSelected,
    TrackingUnavailable,
    AssetLoadFailure,
    Config,
    SessionUnavailable,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene document: {0}")]
    Parse(String),

    #[error("model index {index} is out of range for {len} loaded models")]
    InvalidReference { index: usize, len: usize },

    #[error("placement transform is not rigid")]
    InvalidTransform,

    #[error("no model selected")]
    NoModelSelected,

    #[error("tracking unavailable: {0}")]
    TrackingUnavailable(String),

    #[error("failed to load asset `{name}`: {reason}")]
    AssetLoadFailure { name: String, reason: String },

    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("tracking session could not be established: {0}")]
    SessionUnavailable(String),
}

impl SceneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SceneError::Io(_) => ErrorKind::Io,
            SceneError::Parse(_) => ErrorKind::Parse,
            SceneError::InvalidReference { .. } => ErrorKind::InvalidReference,
            SceneError::InvalidTransform => ErrorKind::InvalidTransform,
            SceneError::NoModelSelected => ErrorKind::NoModelSelected,
            SceneError::TrackingUnavailable(_) => ErrorKind::TrackingUnavailable,
            SceneError::AssetLoadFailure { .. } => ErrorKind::AssetLoadFailure,
            SceneError::Config(_) => ErrorKind::Config,
            SceneError::SessionUnavailable(_) => ErrorKind::SessionUnavailable,
        }
    }

    /// Nothing in the engine can run without a tracking session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SceneError::SessionUnavailable(_))
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> Self {
        SceneError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;
