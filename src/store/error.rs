use thiserror::Error;

use crate::db::SlotError;

/// A required text field was empty once surrounding whitespace was removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required.")]
    Required(&'static str),
}

/// Everything a collection store can report to its caller. None of these are
/// retried; the UI turns them into a status message and moves on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not load {key}")]
    Read {
        key: &'static str,
        #[source]
        source: SlotError,
    },
    #[error("stored {key} is not a readable collection")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode {key}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not save {key}")]
    Write {
        key: &'static str,
        #[source]
        source: SlotError,
    },
}

impl StoreError {
    /// True for failures that happened while talking to the slot backend, as
    /// opposed to bad user input.
    pub fn is_storage(&self) -> bool {
        !matches!(self, StoreError::Validation(_))
    }
}
