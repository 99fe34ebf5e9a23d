//! The node arena: ownership, links, the generic property write path and
//! cache invalidation.
//!
//! Nodes live in generational slots. A removed node's slot is freed and its
//! generation bumped, so any [`NodeId`] still pointing at it (an edit in the
//! history, say) stops resolving instead of reaching a different node.

use std::ops::{Deref, DerefMut};

use crate::errors::PropertyError;
use crate::formula::Formula;
use crate::log::{debug, trace};
use crate::node::{
    BackplaneNode, FigureNode, GraphicNode, ModelId, NodeBehavior, NodeData, NodeId, NodeKind,
    Plane, ResolvedStyle,
};
use crate::property::{PropertyId, PropertyValue};

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<GraphicNode>,
}

/// Result of a successful generic write
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome {
    /// The value already equalled the request; nothing happened
    Unchanged,
    Changed {
        old: Option<PropertyValue>,
        new: Option<PropertyValue>,
    },
}

impl WriteOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, WriteOutcome::Changed { .. })
    }
}

/// A tick set's axis-tracking state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackState {
    pub track: bool,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug)]
pub struct NodeTree {
    model: ModelId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<NodeId>,
}

impl NodeTree {
    pub fn new(model: ModelId) -> Self {
        NodeTree { model, slots: Vec::new(), free: Vec::new(), root: None }
    }

    pub fn model_id(&self) -> ModelId {
        self.model
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&GraphicNode> {
        if id.model != self.model {
            return None;
        }
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut GraphicNode> {
        if id.model != self.model {
            return None;
        }
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(GraphicNode::kind)
    }

    /// Number of live nodes, components included
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.get(id).and_then(|n| n.parent);
        while let Some(p) = cur {
            out.push(p);
            cur = self.get(p).and_then(|n| n.parent);
        }
        out
    }

    /// `id` and everything below it, pre-order, components before children
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            out.push(n);
            for &c in node.children.iter().rev() {
                stack.push(c);
            }
            for &c in node.components.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    // ------------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------------

    /// Allocate a detached node, along with its intrinsic components
    fn alloc(&mut self, data: NodeData) -> NodeId {
        let is_3d = matches!(data, NodeData::Graph3D(_));
        let id = self.alloc_slot(GraphicNode::new(data));
        if is_3d {
            for plane in [Plane::XY, Plane::XZ, Plane::YZ] {
                let mut part = GraphicNode::new(BackplaneNode::new(plane).into());
                part.parent = Some(id);
                part.is_component = true;
                let pid = self.alloc_slot(part);
                if let Some(n) = self.get_mut(id) {
                    n.components.push(pid);
                }
            }
        }
        id
    }

    fn alloc_slot(&mut self, node: GraphicNode) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId { model: self.model, index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, node: Some(node) });
                NodeId { model: self.model, index, generation: 0 }
            }
        }
    }

    /// Install the root figure, replacing any previous tree
    pub(crate) fn set_root(&mut self, figure: FigureNode) -> NodeId {
        if let Some(old) = self.root.take() {
            self.free_subtree(old);
        }
        let id = self.alloc(figure.into());
        self.root = Some(id);
        id
    }

    /// Insert `data` as a child of `parent` at `index` (appended when `None`)
    pub fn insert(&mut self, parent: NodeId, data: NodeData, index: Option<usize>) -> Option<NodeId> {
        let parent_kind = self.kind(parent)?;
        let child_kind = data.kind();
        if !parent_kind.accepts_child(child_kind) {
            debug!(%parent_kind, %child_kind, "child kind not accepted");
            return None;
        }
        let id = self.alloc(data);
        let node = self.get_mut(id)?;
        node.parent = Some(parent);
        let siblings = &mut self.get_mut(parent)?.children;
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, id);
        if parent_kind == NodeKind::Graph && child_kind == NodeKind::TickSet {
            self.sync_tick_sets(parent);
        }
        self.invalidate(parent);
        Some(id)
    }

    /// Detach and free a user node and its subtree; returns its former parent
    pub fn remove(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        if node.is_component || Some(id) == self.root {
            return None;
        }
        let parent = node.parent?;
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        self.free_subtree(id);
        self.invalidate(parent);
        Some(parent)
    }

    fn free_subtree(&mut self, id: NodeId) {
        for n in self.descendants(id) {
            let slot = &mut self.slots[n.index as usize];
            if let Some(node) = slot.node.take() {
                node.cache.release();
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(n.index);
        }
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    pub fn read_property(
        &self,
        id: NodeId,
        property: PropertyId,
    ) -> Result<Option<PropertyValue>, PropertyError> {
        self.get(id)
            .ok_or(PropertyError::Detached)?
            .get_property_value(property)
    }

    /// The generic write path.
    ///
    /// Validates and constrains the value, skips writes that would not change
    /// anything, stores it, and (unless the node's notifications are
    /// suppressed) invalidates the render caches it affects. Records nothing:
    /// building an edit from the outcome is the caller's business.
    pub fn write_property(
        &mut self,
        id: NodeId,
        property: PropertyId,
        value: Option<PropertyValue>,
    ) -> Result<WriteOutcome, PropertyError> {
        let node = self.get(id).ok_or(PropertyError::Detached)?;
        let new = node.normalize(property, value)?;
        let old = node.get_property_value(property)?;
        if old == new {
            return Ok(WriteOutcome::Unchanged);
        }
        let kind = node.kind();
        let notify = node.notify;
        self.get_mut(id)
            .ok_or(PropertyError::Detached)?
            .store(property, new.clone())?;
        trace!(%kind, %property, "property stored");

        if kind == NodeKind::Graph && matches!(property, PropertyId::XMin | PropertyId::XMax) {
            self.sync_tick_sets(id);
        }
        if notify {
            self.invalidate(id);
            if property.is_font() {
                self.propagate_font_change(id);
            }
        }
        Ok(WriteOutcome::Changed { old, new })
    }

    /// Replace a function's formula; returns the previous one if it changed
    pub(crate) fn write_formula(
        &mut self,
        id: NodeId,
        formula: Formula,
    ) -> Result<Option<Formula>, PropertyError> {
        let node = self.get_mut(id).ok_or(PropertyError::Detached)?;
        let (notify, kind) = (node.notify, node.data.kind());
        let NodeData::Function(f) = &mut node.data else {
            return Err(PropertyError::InvalidFormula { message: format!("a {kind} has no formula") });
        };
        if *f.formula() == formula {
            return Ok(None);
        }
        let old = f.formula().clone();
        f.set_formula(formula);
        if notify {
            self.invalidate(id);
        }
        Ok(Some(old))
    }

    pub fn track_state(&self, id: NodeId) -> Option<TrackState> {
        match &self.get(id)?.data {
            NodeData::TickSet(t) => Some(TrackState { track: t.track, start: t.start, end: t.end }),
            _ => None,
        }
    }

    /// Set a tick set's tracking flag and range together; `Ok(false)` if unchanged
    pub(crate) fn write_track_state(
        &mut self,
        id: NodeId,
        state: TrackState,
    ) -> Result<bool, PropertyError> {
        if self.track_state(id) == Some(state) {
            return Ok(false);
        }
        let node = self.get_mut(id).ok_or(PropertyError::Detached)?;
        let (notify, kind) = (node.notify, node.data.kind());
        let NodeData::TickSet(t) = &mut node.data else {
            return Err(PropertyError::Unsupported { kind, property: PropertyId::Start });
        };
        t.set_tracking(state.track, state.start, state.end);
        if notify {
            self.invalidate(id);
        }
        Ok(true)
    }

    /// The x range tick sets under `graph` would track
    pub fn axis_range(&self, graph: NodeId) -> Option<(f64, f64)> {
        match &self.get(graph)?.data {
            NodeData::Graph(g) => Some(g.x_range),
            _ => None,
        }
    }

    /// Silently pull tracking tick sets into line with their graph's x range
    fn sync_tick_sets(&mut self, graph: NodeId) {
        let Some((start, end)) = self.axis_range(graph) else {
            return;
        };
        let children = self.get(graph).map(|g| g.children.clone()).unwrap_or_default();
        for c in children {
            let Some(node) = self.get_mut(c) else { continue };
            if let NodeData::TickSet(t) = &mut node.data {
                if t.track && (t.start, t.end) != (start, end) {
                    t.set_tracking(true, start, end);
                    node.cache.release();
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Notifications and caches
    // ------------------------------------------------------------------------

    /// Turn off invalidation on `id` until the guard drops.
    ///
    /// The previous flag is restored on drop, so guards nest.
    pub fn suppress_notifications(&mut self, id: NodeId) -> NotifyGuard<'_> {
        let previous = match self.get_mut(id) {
            Some(n) => std::mem::replace(&mut n.notify, false),
            None => true,
        };
        NotifyGuard { tree: self, id, previous }
    }

    /// Drop cached render state for `id`, its subtree and its ancestors' bounds
    pub fn invalidate(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        node.cache.invalidate();
        for d in self.descendants(id).into_iter().skip(1) {
            if let Some(n) = self.get(d) {
                n.cache.release();
            }
        }
        for a in self.ancestors(id) {
            if let Some(n) = self.get(a) {
                n.cache.clear_bounds();
            }
        }
    }

    /// Re-lay-out descendants that inherit a font property from `id`
    pub fn propagate_font_change(&mut self, id: NodeId) {
        for d in self.descendants(id).into_iter().skip(1) {
            if let Some(n) = self.get(d) {
                if n.style.inherits_font() {
                    n.cache.invalidate();
                }
            }
        }
    }

    /// Forget every cached render resource in the tree
    pub fn invalidate_all(&mut self) {
        if let Some(root) = self.root {
            self.invalidate(root);
        }
    }

    /// Style of `id` after inheritance from every ancestor
    pub fn resolved_style(&self, id: NodeId) -> ResolvedStyle {
        let mut chain = self.ancestors(id);
        chain.reverse();
        chain.push(id);
        chain
            .iter()
            .filter_map(|&n| self.get(n))
            .fold(ResolvedStyle::default(), |acc, n| acc.inherit(&n.style))
    }
}

/// Restores a node's notification flag when dropped
pub struct NotifyGuard<'a> {
    tree: &'a mut NodeTree,
    id: NodeId,
    previous: bool,
}

impl Deref for NotifyGuard<'_> {
    type Target = NodeTree;

    fn deref(&self) -> &NodeTree {
        self.tree
    }
}

impl DerefMut for NotifyGuard<'_> {
    fn deref_mut(&mut self) -> &mut NodeTree {
        self.tree
    }
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        if let Some(n) = self.tree.get_mut(self.id) {
            n.notify = self.previous;
        }
    }
}
