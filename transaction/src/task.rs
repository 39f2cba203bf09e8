//! Undo tasks and open task frames.

use cellar_store::Change;

/// A completed, labelled unit of undo.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoTask {
    /// Label shown for undoing this task.
    pub label: String,
    /// Label shown for redoing this task.
    pub redo_label: String,
    /// Changes in the order they were applied.
    changes: Vec<Change>,
}

impl UndoTask {
    pub fn new(label: impl Into<String>, redo_label: impl Into<String>, changes: Vec<Change>) -> Self {
        Self {
            label: label.into(),
            redo_label: redo_label.into(),
            changes,
        }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The same labels over a different change list.
    pub(crate) fn with_changes(&self, changes: Vec<Change>) -> Self {
        Self {
            label: self.label.clone(),
            redo_label: self.redo_label.clone(),
            changes,
        }
    }
}

/// An open `begin_undo_task` call.
#[derive(Debug, Clone)]
pub(crate) struct TaskFrame {
    pub label: String,
    pub redo_label: String,
    /// Change-log position when the frame opened.
    pub mark: usize,
}
