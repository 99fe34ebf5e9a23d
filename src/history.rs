//! Linear undo/redo history

use std::collections::VecDeque;

use crate::defaults;
use crate::edit::{Direction, ReversibleEdit};
use crate::log::{debug, warn};
use crate::node::NodeId;
use crate::tree::NodeTree;

/// What replaying one entry did
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayOutcome {
    pub applied: bool,
    /// The edited node, for single-node edits
    pub target: Option<NodeId>,
    pub multi: bool,
}

/// Edits before `cursor` can be undone, edits from `cursor` on can be redone
#[derive(Debug)]
pub struct EditHistory {
    entries: VecDeque<ReversibleEdit>,
    cursor: usize,
    capacity: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        EditHistory::new(defaults::HISTORY_CAPACITY)
    }
}

impl EditHistory {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        EditHistory { entries: VecDeque::new(), cursor: 0, capacity: capacity.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a new edit, discarding anything that could have been redone
    pub fn post(&mut self, edit: ReversibleEdit) {
        self.drop_redo_tail();
        self.entries.push_back(edit);
        while self.entries.len() > self.capacity {
            if let Some(mut oldest) = self.entries.pop_front() {
                debug!(edit = oldest.description(), "history entry evicted");
                oldest.release();
            }
        }
        self.cursor = self.entries.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_description(&self) -> Option<&str> {
        let i = self.cursor.checked_sub(1)?;
        self.entries.get(i).map(ReversibleEdit::description)
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(ReversibleEdit::description)
    }

    /// Undo the latest edit; `None` when there is nothing to undo
    pub fn undo(&mut self, tree: &mut NodeTree) -> Option<ReplayOutcome> {
        let i = self.cursor.checked_sub(1)?;
        self.cursor = i;
        Some(self.replay(i, tree, Direction::Undo))
    }

    /// Redo the next edit; `None` when there is nothing to redo
    pub fn redo(&mut self, tree: &mut NodeTree) -> Option<ReplayOutcome> {
        let i = self.cursor;
        if i >= self.entries.len() {
            return None;
        }
        let outcome = self.replay(i, tree, Direction::Redo);
        if outcome.applied {
            self.cursor = i + 1;
        }
        Some(outcome)
    }

    fn replay(&mut self, i: usize, tree: &mut NodeTree, dir: Direction) -> ReplayOutcome {
        let edit = &self.entries[i];
        let outcome = ReplayOutcome {
            applied: edit.apply(tree, dir),
            target: edit.target(),
            multi: edit.is_multi(),
        };
        if !outcome.applied {
            warn!(edit = edit.description(), ?dir, "replay failed, redo disabled");
            // The failed entry sits at the cursor now; it and everything after go
            self.cursor = i;
            self.drop_redo_tail();
        }
        outcome
    }

    fn drop_redo_tail(&mut self) {
        for mut edit in self.entries.drain(self.cursor..) {
            edit.release();
        }
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.drop_redo_tail();
    }
}
