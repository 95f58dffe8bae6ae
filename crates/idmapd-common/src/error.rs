//! Unified error types for the idmapd workspace.
//!
//! Parse-time failures (`Format`, `Wraparound`) abort construction of the
//! containing mapping set. `UnauthorizedMapping` is the expected outcome of
//! validating a caller-supplied mapping and is meant to be reported back,
//! never coerced into a nearby valid mapping.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum IdmapError {
    /// A textual mapping entry or grant-file line is malformed.
    #[error("bad idmap {input:?}: {reason}")]
    Format {
        /// The offending input text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A mapping range runs past the largest representable id.
    #[error("bad mapping {input:?}: id wraparound")]
    Wraparound {
        /// The offending input text.
        input: String,
    },

    /// Two entries would own the same host id.
    #[error("can't map the same host id twice: {entry}")]
    ConflictingHostId {
        /// Runtime directive form of the rejected entry.
        entry: String,
    },

    /// A plain append found an overlap with an existing entry.
    #[error("conflicting id mapping: {entry}")]
    Conflict {
        /// Runtime directive form of the rejected entry.
        entry: String,
    },

    /// The requested host range is not covered by any kernel grant.
    #[error("the '{entry}' map can't work in the current user namespace")]
    UnauthorizedMapping {
        /// Runtime directive form of the offending entry.
        entry: String,
    },

    /// A subordinate-id grant file has no lines for the requested user.
    #[error("user {user:?} has no grants in {path}")]
    NoSuchUser {
        /// Username that was looked up.
        user: String,
        /// Grant file that was searched.
        path: PathBuf,
    },

    /// A live namespace id-map file contains no usable lines.
    #[error("namespace doesn't have any map set in {path}")]
    EmptyMapping {
        /// The id-map file that was read.
        path: PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl IdmapError {
    /// Builds an [`IdmapError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an [`IdmapError::Format`] from any displayable input.
    pub fn format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, IdmapError>;
