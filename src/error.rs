//! Error handling for stprogress.
//!
//! Progress rendering itself never fails: a missing widget or a disabled
//! frontend simply means no display happens. Errors only surface when a
//! configuration is loaded from an external source and turns out to be
//! malformed.

use std::io;
use thiserror::Error;

/// Errors that can happen when using stprogress.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration was expected to be a mapping of option names to values.
    ///
    /// This variant is returned when a default configuration or a scoped
    /// configuration is built from a value which is not an object, such as a
    /// JSON array or a bare string.
    #[error("Invalid configuration kind: expected a mapping, found {found}")]
    InvalidConfigKind {
        /// Kind of value that was provided instead.
        found: &'static str,
    },

    /// The configuration could not be deserialized.
    ///
    /// Wraps malformed JSON, unknown option names and values of the wrong type.
    #[error("Invalid configuration")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// I/O Error while reading a configuration file.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },
}

/// Result type alias for operations that can fail with a stprogress error.
pub type Result<T> = std::result::Result<T, Error>;
