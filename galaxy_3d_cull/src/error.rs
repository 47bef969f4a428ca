//! Error types for the Galaxy3D culling core
//!
//! This module defines the error types used by the scene graph, the
//! viewpoint/primitive constructors and the cull stage.

use std::fmt;

/// Result type for Galaxy3D culling operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D culling errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Node key does not exist (never created, or removed)
    InvalidNode(String),

    /// Graph edit would break the node arity rules or create a cycle
    InvalidTopology(String),

    /// A bounds-affecting write was attempted outside the update phase
    BoundsWriteNotPermitted(String),

    /// Invalid argument (viewpoint, cone, cylinder parameters, etc.)
    InvalidArgument(String),

    /// Generic failed operation (created by `engine_err!`)
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidNode(msg) => write!(f, "Invalid node: {}", msg),
            Error::InvalidTopology(msg) => write!(f, "Invalid topology: {}", msg),
            Error::BoundsWriteNotPermitted(msg) => write!(f, "Bounds write not permitted: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Log this error at ERROR severity and hand it back.
    ///
    /// Lets constructors and graph edits report failures with the same
    /// source tag they use for other logs.
    pub(crate) fn logged(self, source: &str) -> Self {
        crate::galaxy3d::Engine::log(
            crate::galaxy3d::log::LogSeverity::Error,
            source,
            self.to_string(),
        );
        self
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
