//! Cellar Transaction
//!
//! Undo/redo tasks and commit-fenced edit sessions over the property store.
//!
//! Responsibilities:
//! - Group store changes into labelled, nestable undo tasks
//! - Undo and redo completed tasks
//! - Implement COMMIT and ROLLBACK of open work
//! - Guard edit sessions with a commit fence and roll them back on drop

mod config;
mod error;
mod handler;
mod session;
mod task;

pub use config::{ActionHandlerConfig, DEFAULT_UNDO_DEPTH};
pub use error::{UndoError, UndoResult};
pub use handler::ActionHandler;
pub use session::EditSession;
pub use task::UndoTask;
