//! Action handler configuration.

use serde::Deserialize;

/// Number of completed tasks kept for undo when not configured.
pub const DEFAULT_UNDO_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionHandlerConfig {
    /// Oldest tasks beyond this many are dropped from the undo stack.
    pub max_undo_depth: usize,
}

impl Default for ActionHandlerConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}
