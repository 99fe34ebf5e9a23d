//! Reversible edit records.
//!
//! Every user mutation of a model produces one [`ReversibleEdit`] holding
//! just enough state to redo or undo it. Replaying goes back through the
//! tree's generic write path, so validation and invalidation behave exactly
//! like the original edit.

use crate::errors::PropertyError;
use crate::formula::Formula;
use crate::log::{debug, warn};
use crate::measure::Measure;
use crate::node::{LineEnd, ModelId, NodeId, NodeKind};
use crate::property::{PropertyId, PropertyValue, describe_change};
use crate::tree::{NodeTree, TrackState, WriteOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

/// One property's before and after values on one node
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    pub node: NodeId,
    pub property: PropertyId,
    pub new: Option<PropertyValue>,
    pub old: Option<PropertyValue>,
}

impl PropertyChange {
    pub fn new(
        node: NodeId,
        property: PropertyId,
        new: Option<PropertyValue>,
        old: Option<PropertyValue>,
    ) -> Self {
        PropertyChange { node, property, new, old }
    }

    /// The value to write when replaying in `dir`
    pub fn value(&self, dir: Direction) -> Option<PropertyValue> {
        match dir {
            Direction::Undo => self.old.clone(),
            Direction::Redo => self.new.clone(),
        }
    }
}

/// Ordered property changes on any number of nodes of a single model
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiEdit {
    model: Option<ModelId>,
    changes: Vec<PropertyChange>,
}

impl MultiEdit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a change; a change on another model's node is rejected
    pub fn push(&mut self, change: PropertyChange) -> bool {
        let model = change.node.model();
        if self.model.is_some_and(|m| m != model) {
            debug!("change from another model rejected");
            return false;
        }
        self.model = Some(model);
        self.changes.push(change);
        true
    }

    pub fn changes(&self) -> &[PropertyChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Redo in order, undo in reverse. A failed write rolls back the
    /// writes before it, so the tree is left as it was found.
    fn replay(&self, tree: &mut NodeTree, dir: Direction) -> Result<(), PropertyError> {
        let mut order: Vec<&PropertyChange> = self.changes.iter().collect();
        if dir == Direction::Undo {
            order.reverse();
        }
        let mut done: Vec<(NodeId, PropertyId, Option<PropertyValue>)> = Vec::new();
        for c in order {
            let outcome = tree
                .suppress_notifications(c.node)
                .write_property(c.node, c.property, c.value(dir));
            match outcome {
                Ok(WriteOutcome::Changed { old, .. }) => done.push((c.node, c.property, old)),
                Ok(WriteOutcome::Unchanged) => {}
                Err(e) => {
                    for (node, p, old) in done.into_iter().rev() {
                        let mut quiet = tree.suppress_notifications(node);
                        restore(&mut quiet, node, p, old);
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

impl Extend<PropertyChange> for MultiEdit {
    fn extend<I: IntoIterator<Item = PropertyChange>>(&mut self, iter: I) {
        for change in iter {
            self.push(change);
        }
    }
}

/// What an edit changes, with the values on both sides
#[derive(Clone, Debug, PartialEq)]
pub enum EditRecord {
    Property(PropertyChange),
    /// Declared location of any movable kind other than a line
    Move {
        node: NodeId,
        new: (Measure, Measure),
        old: (Measure, Measure),
    },
    /// Both endpoints of a line, `[x, y, x2, y2]`
    LineMove {
        node: NodeId,
        new: [Measure; 4],
        old: [Measure; 4],
    },
    /// Any subset of x, y, width and height
    Resize {
        node: NodeId,
        changes: Vec<(PropertyId, Measure, Measure)>,
    },
    /// One endpoint of a line
    LineResize {
        node: NodeId,
        end: LineEnd,
        new: (Measure, Measure),
        old: (Measure, Measure),
    },
    Formula {
        node: NodeId,
        new: Formula,
        old: Formula,
    },
    TrackAxis {
        node: NodeId,
        new: TrackState,
        old: TrackState,
    },
    Multi(MultiEdit),
    /// After [`ReversibleEdit::release`]
    Released,
}

/// A described, replayable edit
#[derive(Clone, Debug, PartialEq)]
pub struct ReversibleEdit {
    description: String,
    record: EditRecord,
}

impl ReversibleEdit {
    pub fn new(description: impl Into<String>, record: EditRecord) -> Self {
        ReversibleEdit { description: description.into(), record }
    }

    /// A single property change, described from its values
    pub fn property(kind: NodeKind, change: PropertyChange) -> Self {
        let description =
            describe_change(kind, change.property, change.old.as_ref(), change.new.as_ref());
        Self::new(description, EditRecord::Property(change))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn record(&self) -> &EditRecord {
        &self.record
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.record, EditRecord::Multi(_))
    }

    pub fn is_released(&self) -> bool {
        matches!(self.record, EditRecord::Released)
    }

    /// The single node this edit targets, if it targets one
    pub fn target(&self) -> Option<NodeId> {
        match &self.record {
            EditRecord::Property(c) => Some(c.node),
            EditRecord::Move { node, .. }
            | EditRecord::LineMove { node, .. }
            | EditRecord::Resize { node, .. }
            | EditRecord::LineResize { node, .. }
            | EditRecord::Formula { node, .. }
            | EditRecord::TrackAxis { node, .. } => Some(*node),
            EditRecord::Multi(_) | EditRecord::Released => None,
        }
    }

    /// Drop every reference this edit holds; later applies fail
    pub fn release(&mut self) {
        self.record = EditRecord::Released;
    }

    /// Replay the edit. Failures are logged and reported as `false`.
    pub fn apply(&self, tree: &mut NodeTree, dir: Direction) -> bool {
        let result = match &self.record {
            EditRecord::Property(c) => tree
                .write_property(c.node, c.property, c.value(dir))
                .map(|_| ()),
            EditRecord::Move { node, new, old } => {
                let (x, y) = *pick(dir, new, old);
                write_batch(tree, *node, &[(PropertyId::X, x), (PropertyId::Y, y)])
            }
            EditRecord::LineMove { node, new, old } => {
                let [x, y, x2, y2] = *pick(dir, new, old);
                write_batch(
                    tree,
                    *node,
                    &[
                        (PropertyId::X, x),
                        (PropertyId::Y, y),
                        (PropertyId::X2, x2),
                        (PropertyId::Y2, y2),
                    ],
                )
            }
            EditRecord::Resize { node, changes } => {
                let writes: Vec<_> = changes
                    .iter()
                    .map(|&(p, new, old)| (p, pick(dir, new, old)))
                    .collect();
                write_batch(tree, *node, &writes)
            }
            EditRecord::LineResize { node, end, new, old } => {
                let (px, py) = end.properties();
                let (x, y) = *pick(dir, new, old);
                write_batch(tree, *node, &[(px, x), (py, y)])
            }
            EditRecord::Formula { node, new, old } => tree
                .write_formula(*node, pick(dir, new, old).clone())
                .map(|_| ()),
            EditRecord::TrackAxis { node, new, old } => tree
                .write_track_state(*node, *pick(dir, new, old))
                .map(|_| ()),
            EditRecord::Multi(multi) => {
                let r = multi.replay(tree, dir);
                if let Some(root) = tree.root() {
                    tree.propagate_font_change(root);
                }
                tree.invalidate_all();
                r
            }
            EditRecord::Released => Err(PropertyError::Detached),
        };
        match result {
            Ok(()) => true,
            Err(PropertyError::Detached) => {
                debug!(edit = %self.description, "edit target detached");
                false
            }
            Err(e) => {
                warn!(edit = %self.description, error = %e, "edit replay failed");
                false
            }
        }
    }
}

fn pick<T>(dir: Direction, new: T, old: T) -> T {
    match dir {
        Direction::Redo => new,
        Direction::Undo => old,
    }
}

/// Write several measures on one node as a unit: notifications are held
/// until every write landed, and a failed write rolls back the earlier ones.
pub(crate) fn write_batch(
    tree: &mut NodeTree,
    node: NodeId,
    writes: &[(PropertyId, Measure)],
) -> Result<(), PropertyError> {
    if !tree.contains(node) {
        return Err(PropertyError::Detached);
    }
    let result = {
        let mut quiet = tree.suppress_notifications(node);
        let mut done: Vec<(PropertyId, Option<PropertyValue>)> = Vec::new();
        let mut result = Ok(());
        for &(p, m) in writes {
            match quiet.write_property(node, p, Some(m.into())) {
                Ok(WriteOutcome::Changed { old, .. }) => done.push((p, old)),
                Ok(WriteOutcome::Unchanged) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        if result.is_err() {
            for (p, old) in done.into_iter().rev() {
                restore(&mut quiet, node, p, old);
            }
        }
        result
    };
    if result.is_ok() {
        tree.invalidate(node);
    }
    result
}

/// Put back a value during rollback
fn restore(tree: &mut NodeTree, node: NodeId, property: PropertyId, old: Option<PropertyValue>) {
    if let Err(e) = tree.write_property(node, property, old) {
        warn!(%property, error = %e, "rollback write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FigureNode, LabelNode, LineNode};

    fn setup() -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new(ModelId::fresh());
        let root = tree.set_root(FigureNode::default());
        (tree, root)
    }

    #[test]
    fn property_edit_round_trips() {
        let (mut tree, root) = setup();
        let label = tree.insert(root, LabelNode::default().into(), None).unwrap();
        let change = PropertyChange::new(
            label,
            PropertyId::Title,
            Some("new".into()),
            Some("label".into()),
        );
        let edit = ReversibleEdit::property(NodeKind::Label, change);
        assert_eq!(edit.description(), "Change title from label to new on label");
        assert!(edit.apply(&mut tree, Direction::Redo));
        assert_eq!(
            tree.read_property(label, PropertyId::Title).unwrap(),
            Some("new".into())
        );
        assert!(edit.apply(&mut tree, Direction::Undo));
        assert_eq!(
            tree.read_property(label, PropertyId::Title).unwrap(),
            Some("label".into())
        );
    }

    #[test]
    fn line_move_invalidates_once() {
        let (mut tree, root) = setup();
        let line = tree.insert(root, LineNode::default().into(), None).unwrap();
        let old = [Measure::pct(10.0), Measure::pct(50.0), Measure::pct(90.0), Measure::pct(50.0)];
        let new = [Measure::pct(20.0), Measure::pct(60.0), Measure::pct(100.0), Measure::pct(60.0)];
        let edit = ReversibleEdit::new("Move line", EditRecord::LineMove { node: line, new, old });
        let before = tree.get(line).unwrap().cache().revision();
        assert!(edit.apply(&mut tree, Direction::Redo));
        assert_eq!(tree.get(line).unwrap().cache().revision(), before + 1);
        assert_eq!(
            tree.read_property(line, PropertyId::X2).unwrap(),
            Some(Measure::pct(100.0).into())
        );
    }

    #[test]
    fn detached_and_released_edits_fail_quietly() {
        let (mut tree, root) = setup();
        let label = tree.insert(root, LabelNode::default().into(), None).unwrap();
        let mut edit = ReversibleEdit::new(
            "Move label",
            EditRecord::Move {
                node: label,
                new: (Measure::pct(1.0), Measure::pct(1.0)),
                old: (Measure::pct(50.0), Measure::pct(50.0)),
            },
        );
        tree.remove(label);
        assert!(!edit.apply(&mut tree, Direction::Redo));
        edit.release();
        assert!(edit.is_released());
        assert_eq!(edit.target(), None);
        assert!(!edit.apply(&mut tree, Direction::Undo));
    }

    #[test]
    fn failed_batch_rolls_back() {
        let (mut tree, root) = setup();
        let label = tree.insert(root, LabelNode::default().into(), None).unwrap();
        // Width is not a label property: the x write before it must be undone
        let err = write_batch(
            &mut tree,
            label,
            &[(PropertyId::X, Measure::pct(5.0)), (PropertyId::Width, Measure::pct(5.0))],
        );
        assert!(err.is_err());
        assert_eq!(
            tree.read_property(label, PropertyId::X).unwrap(),
            Some(Measure::pct(50.0).into())
        );
    }

    #[test]
    fn failed_multi_replay_leaves_the_tree_untouched() {
        let (mut tree, root) = setup();
        let a = tree.insert(root, LabelNode::default().into(), None).unwrap();
        let b = tree.insert(root, LabelNode::default().into(), None).unwrap();
        let mut multi = MultiEdit::new();
        for node in [a, b] {
            multi.push(PropertyChange::new(
                node,
                PropertyId::X,
                Some(Measure::pct(60.0).into()),
                Some(Measure::pct(50.0).into()),
            ));
        }
        let edit = ReversibleEdit::new("Move", EditRecord::Multi(multi));
        assert!(edit.apply(&mut tree, Direction::Redo));
        tree.remove(a);
        // Undo writes b first, then fails on a: b must keep its moved x
        assert!(!edit.apply(&mut tree, Direction::Undo));
        assert_eq!(
            tree.read_property(b, PropertyId::X).unwrap(),
            Some(Measure::pct(60.0).into())
        );
    }

    #[test]
    fn multi_edit_stays_in_one_model() {
        let (_tree_a, root_a) = setup();
        let (_tree_b, root_b) = setup();
        let mut multi = MultiEdit::new();
        assert!(multi.push(PropertyChange::new(root_a, PropertyId::FontSize, Some(10.0.into()), None)));
        assert!(!multi.push(PropertyChange::new(root_b, PropertyId::FontSize, Some(10.0.into()), None)));
        assert_eq!(multi.len(), 1);
    }
}
