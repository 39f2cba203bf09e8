//! Transaction error types.

use cellar_core::ErrorKind;
use cellar_store::StoreError;
use thiserror::Error;

/// Undo and edit-session errors.
#[derive(Debug, Error)]
pub enum UndoError {
    /// Store error during a mutation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The commit fence rejected the call.
    #[error("{operation} is blocked")]
    BlockedOperation { operation: String },

    /// No undo task is open.
    #[error("no undo task is open")]
    NoOpenTask,

    /// An undo task is still open.
    #[error("an undo task is still open")]
    TaskOpen,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

impl UndoError {
    pub fn blocked(operation: impl Into<String>) -> Self {
        Self::BlockedOperation {
            operation: operation.into(),
        }
    }

    /// Collapse to the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::BlockedOperation { .. } => ErrorKind::BlockedOperation,
            Self::NoOpenTask | Self::TaskOpen | Self::NothingToUndo | Self::NothingToRedo => {
                ErrorKind::InvalidUndoState
            }
        }
    }
}

/// Result type for undo operations.
pub type UndoResult<T> = Result<T, UndoError>;
