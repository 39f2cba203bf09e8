//! Commit-fenced edit sessions.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::{UndoError, UndoResult};
use crate::handler::ActionHandler;

/// A scoped edit on an `ActionHandler`.
///
/// Beginning a session opens an undo task. The first session on a handler
/// also raises the commit fence, so code running inside it (which reaches
/// the handler through this guard) cannot commit or close the session's
/// task. `save` ends the task and, for the fence owner, commits. Dropping
/// the session without saving rolls back everything done since it began.
///
/// Sessions nest: a session begun on another session's handler opens an
/// inner task and leaves the commit to the outer session.
#[derive(Debug)]
pub struct EditSession<'a> {
    handler: &'a mut ActionHandler,
    /// Index of the frame this session opened.
    depth: usize,
    /// Change log position when the session began.
    mark: usize,
    owns_fence: bool,
    finished: bool,
}

impl<'a> EditSession<'a> {
    pub fn begin(
        handler: &'a mut ActionHandler,
        label: impl Into<String>,
        redo_label: impl Into<String>,
    ) -> Self {
        let depth = handler.current_depth();
        let mark = handler.cache().change_mark();
        handler.begin_undo_task(label, redo_label);
        let owns_fence = !handler.is_fence_raised();
        if owns_fence {
            handler.raise_fence(depth);
        }
        debug!(depth, owns_fence, "edit session started");
        Self {
            handler,
            depth,
            mark,
            owns_fence,
            finished: false,
        }
    }

    /// True if this session raised the commit fence.
    pub fn owns_fence(&self) -> bool {
        self.owns_fence
    }

    /// Keep the session's changes.
    ///
    /// Inner tasks left open are closed. The fence owner lowers the fence,
    /// ends its task and commits; a nested session only ends its task.
    /// Fails with `NoOpenTask` if code inside already closed the session's
    /// task, in which case its changes belong to the enclosing task.
    pub fn save(mut self) -> UndoResult<()> {
        self.finished = true;
        if self.owns_fence {
            self.handler.lower_fence();
        }
        if self.handler.current_depth() <= self.depth {
            warn!(depth = self.depth, "edit session task already closed");
            return Err(UndoError::NoOpenTask);
        }

        while self.handler.current_depth() > self.depth {
            self.handler.end_task_unfenced();
        }
        if self.owns_fence {
            self.handler.commit_unfenced();
        }
        debug!(depth = self.depth, "edit session saved");
        Ok(())
    }

    /// Discard the session's changes now.
    pub fn cancel(mut self) {
        self.finished = true;
        self.roll_back();
    }

    fn roll_back(&mut self) {
        self.handler.rollback_to(self.depth, self.mark);
        if self.owns_fence {
            self.handler.lower_fence();
        }
        debug!(depth = self.depth, "edit session rolled back");
    }
}

impl Deref for EditSession<'_> {
    type Target = ActionHandler;

    fn deref(&self) -> &ActionHandler {
        &*self.handler
    }
}

impl DerefMut for EditSession<'_> {
    fn deref_mut(&mut self) -> &mut ActionHandler {
        &mut *self.handler
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.roll_back();
        }
    }
}
