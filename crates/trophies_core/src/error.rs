//! # Trophy Error Types
//!
//! Errors surface only at the edges (config IO, name parsing). The drop
//! decision itself never fails; see [`crate::pipeline`].

use thiserror::Error;

/// Errors that can occur around the trophy pipeline.
#[derive(Error, Debug)]
pub enum TrophyError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    ConfigIo {
        /// Path that was being read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML.
    #[error("failed to parse config '{origin}': {message}")]
    ConfigParse {
        /// Path or label of the parsed text.
        origin: String,
        /// Parser message.
        message: String,
    },

    /// No trophy kind has this name.
    #[error("unknown trophy type: {0}")]
    UnknownTrophy(String),
}

/// Result type for trophy operations.
pub type TrophyResult<T> = Result<T, TrophyError>;
