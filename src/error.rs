//! Error types for fooddrive

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fooddrive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading assets, predicting or serving pages
#[derive(Error, Debug)]
pub enum Error {
    /// A value the user can correct: unseen category, malformed or
    /// out-of-range field, wrong value type for a column
    #[error("{0}")]
    Input(String),

    /// A file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model artifact is not valid JSON for a pipeline
    #[error("model artifact could not be parsed: {0}")]
    ModelFormat(#[from] serde_json::Error),

    /// Model artifact parsed but its shape is inconsistent
    #[error("invalid model artifact: {0}")]
    Model(String),

    /// Model features and the prediction columns disagree
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// Dataset could not be parsed
    #[error("dataset error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset is missing a required column
    #[error("dataset is missing column '{0}'")]
    MissingColumn(String),

    /// Config file could not be parsed
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// HTTP server could not start
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Build an input error from anything displayable
    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }

    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the value-shaped errors the user can fix by changing inputs
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }
}
