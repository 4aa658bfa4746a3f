//! Error types for passphrase generation and word list loading.
//!
//! Everything is reported synchronously to the caller; nothing here is
//! retried or swallowed. The binary maps these into `anyhow` errors.

use std::io;

use rand::rand_core::OsError;
use thiserror::Error;

/// Result type alias for dicer operations.
pub type Result<T> = std::result::Result<T, DicewareError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DicewareError {
    /// Requested passphrase length was zero or negative.
    #[error("Passphrase length must be positive (got {requested})")]
    InvalidLength { requested: i64 },

    /// The pool cannot satisfy the request: it is empty, or duplicates are
    /// disallowed and fewer distinct words exist than were requested.
    #[error("Word pool too small: {requested} word(s) requested, {available} available")]
    InsufficientPool { requested: usize, available: usize },

    /// The operating system CSPRNG could not be used.
    #[error("Secure randomness unavailable on this host")]
    RandomnessUnavailable(#[source] OsError),

    /// A word list file or stream could not be read.
    #[error("Failed to read word list from {origin}")]
    SourceRead {
        origin: String,
        #[source]
        source: io::Error,
    },

    /// A randomness source produced an index outside `[0, bound)`.
    #[error("Random source returned index {index} for bound {bound}")]
    IndexOutOfRange { index: usize, bound: usize },
}

impl DicewareError {
    pub(crate) fn source_read(origin: impl Into<String>, source: io::Error) -> Self {
        Self::SourceRead {
            origin: origin.into(),
            source,
        }
    }
}
