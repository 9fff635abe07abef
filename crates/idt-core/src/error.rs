//! Error types for IDT solving.
//!
//! Failures fall into three groups:
//! - configuration: spectral data missing, malformed, or out of range
//! - optimization: the IDT fit did not converge
//! - precondition: a solver step was called before the one it depends on

use std::path::PathBuf;
use thiserror::Error;

/// Result type for IDT operations.
pub type IdtResult<T> = Result<T, IdtError>;

/// Errors that can occur while loading data or solving transforms.
#[derive(Debug, Error)]
pub enum IdtError {
    /// Data not found, malformed, or outside its valid range.
    #[error("{0}")]
    Config(String),

    /// The least-squares fit failed.
    #[error("{0}")]
    Optimization(String),

    /// A solver step ran before the step it depends on succeeded.
    #[error("{requires} needs to be initialised prior to calling SpectralSolver::{step}()")]
    Precondition {
        /// Name of the step that was called.
        step: &'static str,
        /// What had to be loaded or computed first.
        requires: &'static str,
    },

    /// A matrix that has to be inverted is singular.
    #[error("singular matrix: {0}")]
    Singular(&'static str),

    /// I/O error reading a database file.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON error parsing a database file.
    #[error("failed to parse '{path}': {source}")]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl IdtError {
    /// Shorthand for [`IdtError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors the caller can fix by changing data or search paths.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Io { .. } | Self::Json { .. })
    }
}
