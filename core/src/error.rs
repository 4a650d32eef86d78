//! Engine Errors
//!
//! Errors raised while loading a scene document or navigating between scenes.
//! None of these cross the stage boundary: the stage logs them and reports an
//! [`Outcome`](crate::stage::Outcome) or a failed state to the surface.

use std::path::PathBuf;

use thiserror::Error;

use crate::script::SceneId;

/// Errors that can occur while loading and validating a scene document
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Failed to read the document from disk
    #[error("Failed to read scene document at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Document is not valid JSON or does not match the schema
    #[error("Failed to parse scene document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document has no scenes at all
    #[error("Scene document contains no scenes")]
    Empty,

    /// Two scenes share an id
    #[error("Duplicate scene id '{0}'")]
    DuplicateScene(SceneId),

    /// The declared start scene does not exist
    #[error("Start scene '{0}' does not exist")]
    MissingStart(SceneId),

    /// A scene points at a scene that does not exist
    #[error("Scene '{from}' references unknown scene '{to}'")]
    DanglingReference {
        /// Scene holding the reference
        from: SceneId,
        /// The id that failed to resolve
        to: SceneId,
    },

    /// A scene's shape does not fit its kind
    #[error("Scene '{id}' is invalid: {reason}")]
    InvalidScene {
        /// Offending scene
        id: SceneId,
        /// Human readable explanation
        reason: String,
    },

    /// Mood range is empty or the initial mood lies outside it
    #[error("Invalid mood settings: {0}")]
    InvalidMood(String),
}

impl ScriptError {
    pub(crate) fn invalid(id: &SceneId, reason: impl Into<String>) -> Self {
        Self::InvalidScene {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the navigator at runtime
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// Requested scene id is not part of the loaded document
    #[error("Scene '{0}' not found")]
    SceneNotFound(SceneId),
}
