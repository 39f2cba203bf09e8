//! Action handler for undoable edits.

use std::collections::VecDeque;

use cellar_store::RealDataCache;
use tracing::{debug, info};

use crate::config::ActionHandlerConfig;
use crate::error::{UndoError, UndoResult};
use crate::task::{TaskFrame, UndoTask};

/// Undo/redo manager that owns the property store.
///
/// Mutations are applied to the store directly; while a task is open the
/// store records each primitive change, and closing the outermost task
/// packages them into an `UndoTask`. Mutations made with no task open are
/// not undoable.
///
/// The commit fence is raised by an `EditSession`. While it is up,
/// `commit` fails and `end_undo_task` fails for the session's own frame.
#[derive(Debug)]
pub struct ActionHandler {
    cache: RealDataCache,
    config: ActionHandlerConfig,
    frames: Vec<TaskFrame>,
    undo_stack: VecDeque<UndoTask>,
    redo_stack: Vec<UndoTask>,
    /// Frame index owned by the fencing session.
    fence: Option<usize>,
}

impl ActionHandler {
    /// Create a new handler over a store.
    pub fn new(cache: RealDataCache) -> Self {
        Self::with_config(cache, ActionHandlerConfig::default())
    }

    pub fn with_config(cache: RealDataCache, config: ActionHandlerConfig) -> Self {
        Self {
            cache,
            config,
            frames: Vec::new(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            fence: None,
        }
    }

    pub fn cache(&self) -> &RealDataCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut RealDataCache {
        &mut self.cache
    }

    pub fn into_cache(self) -> RealDataCache {
        self.cache
    }

    pub fn config(&self) -> &ActionHandlerConfig {
        &self.config
    }

    // ========== Task Lifecycle ==========

    /// Open an undo task. Tasks nest; inner tasks fold into the outermost.
    pub fn begin_undo_task(&mut self, label: impl Into<String>, redo_label: impl Into<String>) {
        if self.frames.is_empty() {
            self.cache.set_recording(true);
        }
        let frame = TaskFrame {
            label: label.into(),
            redo_label: redo_label.into(),
            mark: self.cache.change_mark(),
        };
        debug!(label = %frame.label, depth = self.frames.len() + 1, "begin undo task");
        self.frames.push(frame);
    }

    /// Close the innermost open task.
    pub fn end_undo_task(&mut self) -> UndoResult<()> {
        if self.frames.is_empty() {
            return Err(UndoError::NoOpenTask);
        }
        if self.fence == Some(self.frames.len() - 1) {
            return Err(UndoError::blocked("EndUndoTask"));
        }
        self.end_task_unfenced();
        Ok(())
    }

    /// Close the innermost frame, ignoring the fence.
    pub(crate) fn end_task_unfenced(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        debug!(label = %frame.label, depth = self.frames.len(), "end undo task");
        if !self.frames.is_empty() {
            return;
        }

        self.cache.set_recording(false);
        let changes = self.cache.take_changes();
        if changes.is_empty() {
            return;
        }
        self.undo_stack
            .push_back(UndoTask::new(frame.label, frame.redo_label, changes));
        self.redo_stack.clear();
        self.trim_history();
    }

    /// Make everything done so far permanent and drop the undo history.
    ///
    /// Open tasks are closed first. Fails while a commit fence is raised.
    pub fn commit(&mut self) -> UndoResult<()> {
        if self.fence.is_some() {
            return Err(UndoError::blocked("Commit"));
        }
        self.commit_unfenced();
        Ok(())
    }

    pub(crate) fn commit_unfenced(&mut self) {
        while !self.frames.is_empty() {
            self.end_task_unfenced();
        }
        let dropped = self.undo_stack.len() + self.redo_stack.len();
        self.undo_stack.clear();
        self.redo_stack.clear();
        info!(dropped, objects = self.cache.object_count(), "committed");
    }

    /// Revert every change made in the open tasks and close them all.
    ///
    /// Fails while a commit fence is raised; the fencing session decides
    /// what happens to its own edits.
    pub fn rollback(&mut self) -> UndoResult<()> {
        if self.fence.is_some() {
            return Err(UndoError::blocked("Rollback"));
        }
        if let Some(mark) = self.frames.first().map(|f| f.mark) {
            self.rollback_to(0, mark);
        }
        Ok(())
    }

    /// Revert every change recorded after `mark` and close frame `depth`
    /// and every frame above it.
    ///
    /// Frames already closed by inner code are fine: their changes stay in
    /// the log of the enclosing frame until the outermost one closes.
    pub(crate) fn rollback_to(&mut self, depth: usize, mark: usize) {
        let changes = self.cache.split_changes(mark);
        self.cache.revert(&changes);
        self.frames.truncate(depth);
        if self.frames.is_empty() {
            self.cache.set_recording(false);
            self.cache.take_changes();
        }
        debug!(depth, reverted = changes.len(), "rolled back");
    }

    // ========== Undo / Redo ==========

    /// Revert the most recent task and make it redoable.
    pub fn undo(&mut self) -> UndoResult<()> {
        if !self.frames.is_empty() {
            return Err(UndoError::TaskOpen);
        }
        let task = self.undo_stack.pop_back().ok_or(UndoError::NothingToUndo)?;
        let redo = self.replay_inverse(&task);
        debug!(label = %task.label, changes = task.len(), "undo");
        self.redo_stack.push(redo);
        Ok(())
    }

    /// Reapply the most recently undone task.
    pub fn redo(&mut self) -> UndoResult<()> {
        if !self.frames.is_empty() {
            return Err(UndoError::TaskOpen);
        }
        let task = self.redo_stack.pop().ok_or(UndoError::NothingToRedo)?;
        let undo = self.replay_inverse(&task);
        debug!(label = %task.redo_label, changes = task.len(), "redo");
        self.undo_stack.push_back(undo);
        self.trim_history();
        Ok(())
    }

    /// Apply a task's inverses, newest first, capturing them as the
    /// opposite task.
    fn replay_inverse(&mut self, task: &UndoTask) -> UndoTask {
        let mark = self.cache.change_mark();
        self.cache.set_recording(true);
        for change in task.changes().iter().rev() {
            self.cache.apply_change(change.inverse());
        }
        let applied = self.cache.split_changes(mark);
        self.cache.set_recording(false);
        task.with_changes(applied)
    }

    fn trim_history(&mut self) {
        while self.undo_stack.len() > self.config.max_undo_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!(label = %dropped.label, "dropped oldest undo task");
            }
        }
    }

    // ========== Commit Fence ==========

    pub(crate) fn raise_fence(&mut self, depth: usize) {
        self.fence = Some(depth);
    }

    pub(crate) fn lower_fence(&mut self) {
        self.fence = None;
    }

    pub fn is_fence_raised(&self) -> bool {
        self.fence.is_some()
    }

    // ========== State ==========

    pub fn can_undo(&self) -> bool {
        self.frames.is_empty() && !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.frames.is_empty() && !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.back().map(|t| t.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|t| t.redo_label.as_str())
    }

    /// Number of open task frames.
    pub fn current_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_task_open(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Completed tasks held for undo or redo since the last commit.
    pub fn undo_task_count(&self) -> usize {
        self.undo_stack.len() + self.redo_stack.len()
    }
}
