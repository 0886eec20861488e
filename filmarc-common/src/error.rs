//! Common error types for filmarc

use thiserror::Error;

/// Common result type for filmarc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
///
/// Callers branch on this rather than on individual variants: validation
/// errors mean the request itself was wrong, insufficient-data errors mean the
/// request was fine but the data could not support an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    InsufficientData,
    Config,
    Io,
}

/// Common error types across filmarc crates
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Metric name that no extractor understands
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Both sides of a correlation name the same metric
    #[error("Cannot correlate metric '{0}' with itself")]
    IdenticalMetrics(String),

    /// Cross-language comparison needs at least two languages
    #[error("At least 2 languages are required, got {supplied}")]
    InsufficientLanguages { supplied: usize },

    /// Too few usable samples after pruning missing values
    #[error("Insufficient samples: {usable} usable ({excluded} excluded), need at least {required}")]
    InsufficientSamples {
        usable: usize,
        excluded: usize,
        required: usize,
    },

    /// A series has no spread, so correlation is undefined
    #[error("Zero variance in '{metric}' across {n} samples")]
    ZeroVariance { metric: String, n: usize },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus or payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_)
            | Error::UnknownMetric(_)
            | Error::IdenticalMetrics(_)
            | Error::InsufficientLanguages { .. } => ErrorKind::InputValidation,
            Error::InsufficientSamples { .. } | Error::ZeroVariance { .. } => {
                ErrorKind::InsufficientData
            }
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) | Error::Parse(_) => ErrorKind::Io,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
