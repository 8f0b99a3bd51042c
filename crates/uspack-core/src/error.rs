//! Error types for uspack-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for uspack-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the build pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Project metadata descriptor is missing or malformed.
    #[error("manifest error at {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// A source unit failed to compile.
    #[error("compile error in {path}: {message}")]
    Compile { path: PathBuf, message: String },

    /// A module import could not be resolved.
    #[error("cannot resolve '{specifier}' imported from {importer}")]
    Resolve { specifier: String, importer: PathBuf },

    /// Cyclic import detected in the module graph.
    #[error("cyclic import detected: {0}")]
    CyclicImport(String),

    /// Two modules declare the same top-level binding.
    #[error("duplicate top-level binding '{name}' in {first} and {second}")]
    DuplicateBinding {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A style chain step failed.
    #[error("style step '{step}' failed: {message}")]
    Style { step: String, message: String },

    /// A token key was registered twice.
    #[error("duplicate token key '{0}'")]
    DuplicateToken(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
