//! Bounded undo/redo history.
//!
//! The log only stores actions; applying them is the registry's job. Any
//! new action clears the redo stack, and the undo stack keeps at most
//! `capacity` entries, silently dropping the oldest.

use std::collections::VecDeque;

use crate::edit::EditAction;

/// Default number of undoable actions kept.
pub const DEFAULT_UNDO_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct EditLog {
    undo: VecDeque<EditAction>,
    redo: Vec<EditAction>,
    capacity: usize,
}

impl EditLog {
    /// Create a log that keeps at most `capacity` undoable actions.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Record a new user edit. Clears redo history.
    pub fn push(&mut self, action: EditAction) {
        self.redo.clear();
        self.push_undo(action);
    }

    /// Take the most recent undoable action.
    pub fn pop_undo(&mut self) -> Option<EditAction> {
        self.undo.pop_back()
    }

    /// Take the most recently undone action.
    pub fn pop_redo(&mut self) -> Option<EditAction> {
        self.redo.pop()
    }

    /// Park an action that was just undone.
    pub fn push_redo(&mut self, action: EditAction) {
        self.redo.push(action);
    }

    /// Return a redone action to the undo stack without touching redo.
    pub fn push_undo(&mut self, action: EditAction) {
        self.undo.push_back(action);
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The action the next undo would revert.
    pub fn peek_undo(&self) -> Option<&EditAction> {
        self.undo.back()
    }

    /// The action the next redo would replay.
    pub fn peek_redo(&self) -> Option<&EditAction> {
        self.redo.last()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for EditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_UNDO_CAPACITY)
    }
}
