// Error types shared by the calendar, chart and history layers

use std::path::PathBuf;

/// Every fallible library operation returns this error.
#[derive(Debug, thiserror::Error)]
pub enum BaziError {
    /// Missing or malformed caller input (dates, hours, request bodies).
    #[error("invalid input: {0}")]
    Input(String),

    /// A date whose lunar year falls outside the calendar table.
    #[error("date out of range: {0}")]
    Range(String),

    /// The history file could not be written.
    #[error("history storage error at {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BaziError {
    pub fn input(message: impl Into<String>) -> Self {
        BaziError::Input(message.into())
    }

    pub fn range(message: impl Into<String>) -> Self {
        BaziError::Range(message.into())
    }

    /// True for errors caused by what the caller sent, as opposed to local storage.
    pub fn is_client_error(&self) -> bool {
        matches!(self, BaziError::Input(_) | BaziError::Range(_))
    }
}

pub type Result<T> = std::result::Result<T, BaziError>;
