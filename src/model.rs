//! The graphic model: a figure tree together with its edit history,
//! selection and change listeners. Every user operation enters here and
//! leaves behind at most one history entry.

use std::rc::Rc;

use glam::DVec2;
use tiny_skia::Pixmap;

use crate::defaults;
use crate::edit::{Direction, EditRecord, MultiEdit, PropertyChange, ReversibleEdit};
use crate::errors::{PropertyError, RenderError};
use crate::formula::Formula;
use crate::history::{EditHistory, ReplayOutcome};
use crate::log::debug;
use crate::measure::Measure;
use crate::node::{FigureNode, LineEnd, ModelId, NodeBehavior, NodeData, NodeId, NodeKind};
use crate::property::{PropertyId, PropertyValue, ValueType};
use crate::render::{self, FullRender, PsOptions, RenderOptions, RenderTask};
use crate::style::StyleSet;
use crate::tree::{NodeTree, TrackState, WriteOutcome};

/// Model-wide settings
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    /// Entries kept before the oldest is evicted
    pub history_capacity: usize,
    /// Property writes on a node in a multi-selection go to every selected node
    pub broadcast_edits: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig { history_capacity: defaults::HISTORY_CAPACITY, broadcast_edits: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// Anything may have changed; redraw everything
    Reload,
    Inserted,
    Removed,
    Modified,
    SelectionChanged,
}

/// Observer of model changes
pub trait ModelListener {
    fn on_change(&self, node: NodeId, change: ChangeKind);
}

pub struct GraphicModel {
    tree: NodeTree,
    root: NodeId,
    history: EditHistory,
    config: ModelConfig,
    selection: Vec<NodeId>,
    listeners: Vec<Rc<dyn ModelListener>>,
}

impl Default for GraphicModel {
    fn default() -> Self {
        GraphicModel::new(FigureNode::default())
    }
}

impl std::fmt::Debug for GraphicModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicModel")
            .field("tree", &self.tree)
            .field("history", &self.history)
            .field("selection", &self.selection)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl GraphicModel {
    pub fn new(figure: FigureNode) -> Self {
        Self::with_config(figure, ModelConfig::default())
    }

    pub fn with_config(figure: FigureNode, config: ModelConfig) -> Self {
        let mut tree = NodeTree::new(ModelId::fresh());
        let root = tree.set_root(figure);
        GraphicModel {
            tree,
            root,
            history: EditHistory::new(config.history_capacity),
            config,
            selection: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> ModelId {
        self.tree.model_id()
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// The root figure
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    pub fn add_listener(&mut self, listener: Rc<dyn ModelListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_listener(&mut self, listener: &Rc<dyn ModelListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    fn notify(&self, node: NodeId, change: ChangeKind) {
        for l in &self.listeners {
            l.on_change(node, change);
        }
    }

    // ------------------------------------------------------------------------
    // Structure and selection
    // ------------------------------------------------------------------------

    /// Append a new node under `parent`
    pub fn insert(&mut self, parent: NodeId, data: impl Into<NodeData>) -> Option<NodeId> {
        self.insert_at(parent, data, None)
    }

    /// Insert a new node under `parent` at a Z-order position
    pub fn insert_at(
        &mut self,
        parent: NodeId,
        data: impl Into<NodeData>,
        index: Option<usize>,
    ) -> Option<NodeId> {
        let id = self.tree.insert(parent, data.into(), index)?;
        self.notify(id, ChangeKind::Inserted);
        Some(id)
    }

    /// Detach a user node; its render caches are released before this returns
    pub fn remove(&mut self, id: NodeId) -> bool {
        let doomed = self.tree.descendants(id);
        if self.tree.remove(id).is_none() {
            return false;
        }
        let before = self.selection.len();
        self.selection.retain(|n| !doomed.contains(n));
        self.notify(id, ChangeKind::Removed);
        if self.selection.len() != before {
            self.notify(self.root, ChangeKind::SelectionChanged);
        }
        true
    }

    /// Replace the selection; unknown ids are ignored
    pub fn select(&mut self, ids: &[NodeId]) {
        let mut selection: Vec<NodeId> = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.tree.contains(id) && !selection.contains(&id) {
                selection.push(id);
            }
        }
        if selection != self.selection {
            self.selection = selection;
            self.notify(self.root, ChangeKind::SelectionChanged);
        }
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// `Ok(None)` is an inherited style value
    pub fn get_property_value(
        &self,
        id: NodeId,
        property: PropertyId,
    ) -> Result<Option<PropertyValue>, PropertyError> {
        self.tree.read_property(id, property)
    }

    /// Set one property and record it.
    ///
    /// Returns `false` for no-op writes and rejected input, which leave no
    /// history entry and send no notification.
    pub fn set_property_value(
        &mut self,
        id: NodeId,
        property: PropertyId,
        value: Option<PropertyValue>,
    ) -> bool {
        let Some(node) = self.tree.get(id) else {
            debug!(%property, "write to detached node");
            return false;
        };
        let new = match node.normalize(property, value) {
            Ok(v) => v,
            Err(e) => {
                debug!(%property, error = %e, "write rejected");
                return false;
            }
        };
        match node.get_property_value(property) {
            Ok(old) if old == new => return false,
            Ok(_) => {}
            Err(e) => {
                debug!(%property, error = %e, "write rejected");
                return false;
            }
        }
        if self.config.broadcast_edits && self.selection.len() >= 2 && self.selection.contains(&id) {
            return self.broadcast(property, new);
        }

        let kind = node.kind();
        let notify = node.notifications_enabled();
        match self.tree.write_property(id, property, new) {
            Ok(WriteOutcome::Changed { old, new }) => {
                if notify {
                    let change = PropertyChange::new(id, property, new, old);
                    self.history.post(ReversibleEdit::property(kind, change));
                    self.notify(id, ChangeKind::Modified);
                }
                true
            }
            Ok(WriteOutcome::Unchanged) => false,
            Err(e) => {
                debug!(%property, error = %e, "write rejected");
                false
            }
        }
    }

    /// Write `value` on every selected node that has `property`, as one edit
    fn broadcast(&mut self, property: PropertyId, value: Option<PropertyValue>) -> bool {
        let mut multi = MultiEdit::new();
        for &n in &self.selection {
            if let Some(change) = self.planned_change(n, property, value.clone()) {
                multi.push(change);
            }
        }
        let description = format!("Change {} on {} nodes", property.display_name(), multi.len());
        self.commit_multi(description, multi)
    }

    /// The normalized change writing `value` would make, or `None` if it
    /// would be rejected or change nothing
    pub(crate) fn planned_change(
        &self,
        node: NodeId,
        property: PropertyId,
        value: Option<PropertyValue>,
    ) -> Option<PropertyChange> {
        let n = self.tree.get(node)?;
        let new = match n.normalize(property, value) {
            Ok(v) => v,
            Err(e) => {
                debug!(%property, error = %e, "change skipped");
                return None;
            }
        };
        let old = n.get_property_value(property).ok()?;
        (old != new).then(|| PropertyChange::new(node, property, new, old))
    }

    /// Apply and record a batch; listeners get one `Reload`
    pub(crate) fn commit_multi(&mut self, description: String, multi: MultiEdit) -> bool {
        if multi.is_empty() {
            return false;
        }
        let edit = ReversibleEdit::new(description, EditRecord::Multi(multi));
        if !edit.apply(&mut self.tree, Direction::Redo) {
            return false;
        }
        self.history.post(edit);
        self.notify(self.root, ChangeKind::Reload);
        true
    }

    /// Apply and record a single-node edit
    fn commit(&mut self, node: NodeId, edit: ReversibleEdit) -> bool {
        if !edit.apply(&mut self.tree, Direction::Redo) {
            return false;
        }
        self.history.post(edit);
        self.notify(node, ChangeKind::Modified);
        true
    }

    // ------------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------------

    /// Shift a node by `delta` milli-inches on the page
    pub fn move_node(&mut self, id: NodeId, delta: DVec2) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        if node.is_component() {
            return false;
        }
        let kind = node.kind();
        let edit = match node.data() {
            NodeData::Line(line) => {
                let start = line.endpoint(LineEnd::Start);
                let end = line.endpoint(LineEnd::End);
                let (Ok(s), Ok(e)) = (
                    self.tree.shifted_location(id, start, delta),
                    self.tree.shifted_location(id, end, delta),
                ) else {
                    debug!("line move has no defined geometry");
                    return false;
                };
                let old = [start.0, start.1, end.0, end.1];
                let new = [s.0, s.1, e.0, e.1];
                if new == old {
                    return false;
                }
                ReversibleEdit::new("Move line", EditRecord::LineMove { node: id, new, old })
            }
            data => {
                let Some(old) = data.location() else {
                    return false;
                };
                let Ok(new) = self.tree.shifted_location(id, old, delta) else {
                    debug!(%kind, "move has no defined geometry");
                    return false;
                };
                if new == old {
                    return false;
                }
                ReversibleEdit::new(format!("Move {kind}"), EditRecord::Move { node: id, new, old })
            }
        };
        self.commit(id, edit)
    }

    /// Shift several nodes by the same page delta as one edit
    pub fn move_nodes(&mut self, ids: &[NodeId], delta: DVec2) -> bool {
        let mut multi = MultiEdit::new();
        for &id in ids {
            for change in self.move_changes(id, delta) {
                multi.push(change);
            }
        }
        let description = format!("Move {} nodes", ids.len());
        self.commit_multi(description, multi)
    }

    /// Property changes that shift `id`'s declared location by a page delta
    pub(crate) fn move_changes(&self, id: NodeId, delta: DVec2) -> Vec<PropertyChange> {
        let Some(node) = self.tree.get(id) else {
            return Vec::new();
        };
        let mut points = Vec::new();
        match node.data() {
            NodeData::Line(line) => {
                points.push((LineEnd::Start.properties(), line.endpoint(LineEnd::Start)));
                points.push((LineEnd::End.properties(), line.endpoint(LineEnd::End)));
            }
            data => {
                if let Some(loc) = data.location() {
                    points.push(((PropertyId::X, PropertyId::Y), loc));
                }
            }
        }
        let mut changes = Vec::new();
        for ((px, py), loc) in points {
            let Ok((x, y)) = self.tree.shifted_location(id, loc, delta) else {
                return Vec::new();
            };
            changes.extend(self.planned_change(id, px, Some(x.into())));
            changes.extend(self.planned_change(id, py, Some(y.into())));
        }
        changes
    }

    /// Drag one end of a line by a page delta
    pub fn move_line_endpoint(&mut self, id: NodeId, end: LineEnd, delta: DVec2) -> bool {
        let Some(NodeData::Line(line)) = self.tree.get(id).map(|n| n.data()) else {
            return false;
        };
        let old = line.endpoint(end);
        let Ok(new) = self.tree.shifted_location(id, old, delta) else {
            return false;
        };
        if new == old {
            return false;
        }
        let which = match end {
            LineEnd::Start => "start",
            LineEnd::End => "end",
        };
        let edit = ReversibleEdit::new(
            format!("Move line {which}"),
            EditRecord::LineResize { node: id, end, new, old },
        );
        self.commit(id, edit)
    }

    /// Set any of x, y, width and height of a box-shaped node together
    pub fn resize(&mut self, id: NodeId, values: &[(PropertyId, Measure)]) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        let kind = node.kind();
        let mut changes = Vec::new();
        for &(p, m) in values {
            if !matches!(p, PropertyId::X | PropertyId::Y | PropertyId::Width | PropertyId::Height) {
                debug!(property = %p, "not a box property");
                return false;
            }
            let Some(change) = self.planned_change(id, p, Some(m.into())) else {
                continue;
            };
            let (Some(new), Some(old)) = (
                change.new.as_ref().and_then(PropertyValue::as_measure),
                change.old.as_ref().and_then(PropertyValue::as_measure),
            ) else {
                return false;
            };
            changes.push((p, new, old));
        }
        if changes.is_empty() {
            return false;
        }
        let edit = ReversibleEdit::new(format!("Resize {kind}"), EditRecord::Resize { node: id, changes });
        self.commit(id, edit)
    }

    // ------------------------------------------------------------------------
    // Kind-specific data
    // ------------------------------------------------------------------------

    /// Parse and install a function's formula
    pub fn set_formula(&mut self, id: NodeId, source: &str) -> bool {
        let Some(NodeData::Function(f)) = self.tree.get(id).map(|n| n.data()) else {
            return false;
        };
        let old = f.formula().clone();
        let new = match Formula::parse(source) {
            Ok(f) => f,
            Err(e) => {
                debug!(error = %e, "formula rejected");
                return false;
            }
        };
        if new == old {
            return false;
        }
        let description = format!("Change formula from {old} to {new}");
        self.commit(id, ReversibleEdit::new(description, EditRecord::Formula { node: id, new, old }))
    }

    /// Make a tick set follow (or stop following) its graph's x range
    pub fn set_track_parent_axis(&mut self, id: NodeId, track: bool) -> bool {
        let Some(old) = self.tree.track_state(id) else {
            return false;
        };
        let range = self
            .tree
            .get(id)
            .and_then(|n| n.parent())
            .and_then(|p| self.tree.axis_range(p));
        let new = match (track, range) {
            (true, Some((start, end))) => TrackState { track, start, end },
            _ => TrackState { track, ..old },
        };
        if new == old {
            return false;
        }
        let description = if track {
            "Track parent axis on tick set"
        } else {
            "Stop tracking parent axis on tick set"
        };
        self.commit(id, ReversibleEdit::new(description, EditRecord::TrackAxis { node: id, new, old }))
    }

    // ------------------------------------------------------------------------
    // Whole-figure styling
    // ------------------------------------------------------------------------

    /// Scale every physical length (and optionally explicit font sizes).
    ///
    /// The root figure keeps its page position.
    pub fn rescale(&mut self, percent: f64, fonts: bool) -> bool {
        let factor = percent / 100.0;
        if !(factor.is_finite() && factor > 0.0) || factor == 1.0 {
            return false;
        }
        let mut multi = MultiEdit::new();
        for id in self.tree.descendants(self.root) {
            let Some(node) = self.tree.get(id) else { continue };
            let measured = PropertyId::ALL
                .iter()
                .copied()
                .filter(|&p| p.value_type() == ValueType::Measure && node.supports(p))
                .filter(|&p| !(id == self.root && matches!(p, PropertyId::X | PropertyId::Y)));
            for p in measured {
                let Ok(Some(PropertyValue::Measure(m))) = node.get_property_value(p) else {
                    continue;
                };
                if m.unit.is_physical() {
                    multi.extend(self.planned_change(id, p, Some(m.scaled(factor).into())));
                }
            }
            if fonts {
                if let Some(size) = node.style().font_size {
                    let scaled = (size * factor).clamp(defaults::MIN_FONT_SIZE, defaults::MAX_FONT_SIZE);
                    multi.extend(self.planned_change(id, PropertyId::FontSize, Some(scaled.into())));
                }
            }
        }
        self.commit_multi(format!("Rescale by {percent}%"), multi)
    }

    /// Clear every explicit style value in the subtree of `id`
    pub fn restore_default_styles(&mut self, id: NodeId) -> bool {
        let mut multi = MultiEdit::new();
        for n in self.tree.descendants(id) {
            let Some(node) = self.tree.get(n) else { continue };
            for &p in PropertyId::STYLE {
                if node.style().get(p).is_some() {
                    multi.extend(self.planned_change(n, p, None));
                }
            }
        }
        self.commit_multi("Restore default styles".to_string(), multi)
    }

    pub fn capture_style(&self, id: NodeId) -> Option<StyleSet> {
        StyleSet::capture(&self.tree, id)
    }

    /// Apply a captured style to a node of the same kind and its components
    pub fn apply_style_set(&mut self, id: NodeId, set: &StyleSet) -> bool {
        let kind = match self.tree.kind(id) {
            Some(k) if k == set.kind() => k,
            _ => return false,
        };
        let mut multi = MultiEdit::new();
        self.style_changes(id, set, &mut multi);
        self.commit_multi(format!("Apply style to {kind}"), multi)
    }

    fn style_changes(&self, id: NodeId, set: &StyleSet, multi: &mut MultiEdit) {
        for (p, v) in set.entries() {
            multi.extend(self.planned_change(id, p, v.cloned()));
        }
        let components = self.tree.get(id).map(|n| n.components().to_vec()).unwrap_or_default();
        for (&c, sub) in components.iter().zip(set.components()) {
            if self.tree.kind(c) == Some(sub.kind()) {
                self.style_changes(c, sub, multi);
            }
        }
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let outcome = self.history.undo(&mut self.tree);
        self.after_replay(outcome)
    }

    pub fn redo(&mut self) -> bool {
        let outcome = self.history.redo(&mut self.tree);
        self.after_replay(outcome)
    }

    fn after_replay(&self, outcome: Option<ReplayOutcome>) -> bool {
        let Some(outcome) = outcome.filter(|o| o.applied) else {
            return false;
        };
        match (outcome.multi, outcome.target) {
            (true, _) => self.notify(self.root, ChangeKind::Reload),
            (false, Some(t)) => self.notify(t, ChangeKind::Modified),
            (false, None) => {}
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    pub fn render_raster(
        &self,
        options: &RenderOptions,
        task: &mut dyn RenderTask,
    ) -> Result<Pixmap, RenderError> {
        render::render_raster(&self.tree, options, task)
    }

    pub fn to_postscript(&self, options: &PsOptions) -> Result<String, RenderError> {
        render::to_postscript(&self.tree, options, &mut FullRender)
    }

    /// Node kind of `id`, if it is still attached
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.tree.kind(id)
    }
}
