//! Graphic nodes.
//!
//! Every node is a [`GraphicNode`]: a kind-specific payload ([`NodeData`])
//! plus the state all kinds share (inheritable style, tree links, the
//! notification flag and the render cache). Kind-specific behavior goes
//! through the [`NodeBehavior`] trait, dispatched over the closed
//! [`NodeData`] enum.

mod containers;
mod plottables;
mod primitives;

pub use containers::{
    BackplaneNode, BoxFrame, FigureNode, Graph3DNode, GraphNode, Plane, PolarPlotNode, sector_outline,
};
pub use plottables::{FunctionNode, TickSetNode};
pub use primitives::{LabelNode, LineEnd, LineNode, ShapeNode};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use enum_dispatch::enum_dispatch;
use glam::DAffine2;

use crate::defaults;
use crate::errors::{GeometryError, PropertyError};
use crate::measure::{Measure, MeasureConstraints};
use crate::property::{FontStyle, PropertyId, PropertyValue};
use crate::render::DrawOp;
use crate::stroke::StrokePattern;
use crate::types::{Color, Mils, Rect};
use crate::viewport::{PolarLayout, Viewport};

// ============================================================================
// Identity
// ============================================================================

static NEXT_MODEL: AtomicU64 = AtomicU64::new(1);

/// Identity of one graphic model; node ids carry it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelId(u64);

impl ModelId {
    pub(crate) fn fresh() -> Self {
        ModelId(NEXT_MODEL.fetch_add(1, Ordering::Relaxed))
    }
}

/// Generational handle to a node inside one model's arena.
///
/// A handle whose slot was freed (or reused) or which belongs to another
/// model no longer resolves; that is how edits notice a detached node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) model: ModelId,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn model(self) -> ModelId {
        self.model
    }
}

// ============================================================================
// Kinds
// ============================================================================

/// The closed set of node kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Figure,
    Graph,
    PolarPlot,
    Graph3D,
    Backplane,
    Label,
    Line,
    Shape,
    Function,
    TickSet,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        NodeKind::Figure,
        NodeKind::Graph,
        NodeKind::PolarPlot,
        NodeKind::Graph3D,
        NodeKind::Backplane,
        NodeKind::Label,
        NodeKind::Line,
        NodeKind::Shape,
        NodeKind::Function,
        NodeKind::TickSet,
    ];

    /// Key used for this kind in style documents
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Figure => "figure",
            NodeKind::Graph => "graph",
            NodeKind::PolarPlot => "pgraph",
            NodeKind::Graph3D => "graph3d",
            NodeKind::Backplane => "backplane",
            NodeKind::Label => "label",
            NodeKind::Line => "line",
            NodeKind::Shape => "shape",
            NodeKind::Function => "function",
            NodeKind::TickSet => "ticks",
        }
    }

    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// Whether a user operation may insert a `child` under this kind
    pub fn accepts_child(self, child: NodeKind) -> bool {
        use NodeKind::*;
        match self {
            Figure => matches!(child, Graph | PolarPlot | Graph3D | Label | Line | Shape),
            Graph => matches!(child, Function | TickSet | Label | Line | Shape),
            PolarPlot => matches!(child, Function | Label | Line | Shape),
            Graph3D => matches!(child, Label),
            Line => matches!(child, Label | Shape),
            Shape => matches!(child, Label),
            Backplane | Label | Function | TickSet => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Figure => "figure",
            NodeKind::Graph => "graph",
            NodeKind::PolarPlot => "polar plot",
            NodeKind::Graph3D => "3D graph",
            NodeKind::Backplane => "backplane",
            NodeKind::Label => "label",
            NodeKind::Line => "line",
            NodeKind::Shape => "shape",
            NodeKind::Function => "function",
            NodeKind::TickSet => "tick set",
        })
    }
}

// ============================================================================
// Style
// ============================================================================

/// Inheritable style properties; `None` means "use the ancestor's value"
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleBlock {
    pub font_family: Option<String>,
    pub font_style: Option<FontStyle>,
    pub font_size: Option<f64>,
    pub stroke_color: Option<Color>,
    pub stroke_width: Option<Measure>,
    pub stroke_pattern: Option<StrokePattern>,
    pub fill_color: Option<Color>,
}

impl StyleBlock {
    pub fn get(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::FontFamily => self.font_family.clone().map(PropertyValue::Text),
            PropertyId::FontStyle => self.font_style.map(PropertyValue::FontStyle),
            PropertyId::FontSize => self.font_size.map(PropertyValue::Number),
            PropertyId::StrokeColor => self.stroke_color.map(PropertyValue::Color),
            PropertyId::StrokeWidth => self.stroke_width.map(PropertyValue::Measure),
            PropertyId::StrokePattern => self.stroke_pattern.map(PropertyValue::Stroke),
            PropertyId::FillColor => self.fill_color.map(PropertyValue::Color),
            _ => None,
        }
    }

    /// Store an already type-checked value
    pub(crate) fn set(
        &mut self,
        id: PropertyId,
        value: Option<PropertyValue>,
    ) -> Result<(), PropertyError> {
        let mismatch = || PropertyError::TypeMismatch {
            property: id,
            expected: id.value_type().name(),
        };
        match id {
            PropertyId::FontFamily => {
                self.font_family = match value {
                    None => None,
                    Some(v) => {
                        let family = v.as_text().ok_or_else(mismatch)?.trim().to_string();
                        if family.is_empty() {
                            return Err(PropertyError::OutOfRange {
                                property: id,
                                reason: "font family cannot be empty".into(),
                            });
                        }
                        Some(family)
                    }
                }
            }
            PropertyId::FontStyle => {
                self.font_style = value.map(|v| v.as_font_style().ok_or_else(mismatch)).transpose()?
            }
            PropertyId::FontSize => {
                let size = value.map(|v| v.as_number().ok_or_else(mismatch)).transpose()?;
                if let Some(s) = size {
                    if !(defaults::MIN_FONT_SIZE..=defaults::MAX_FONT_SIZE).contains(&s) {
                        return Err(PropertyError::OutOfRange {
                            property: id,
                            reason: format!(
                                "font size must be in [{}, {}]",
                                defaults::MIN_FONT_SIZE,
                                defaults::MAX_FONT_SIZE
                            ),
                        });
                    }
                }
                self.font_size = size;
            }
            PropertyId::StrokeColor => {
                self.stroke_color = value.map(|v| v.as_color().ok_or_else(mismatch)).transpose()?
            }
            PropertyId::StrokeWidth => {
                self.stroke_width = value.map(|v| v.as_measure().ok_or_else(mismatch)).transpose()?
            }
            PropertyId::StrokePattern => {
                self.stroke_pattern =
                    value.map(|v| v.as_stroke().ok_or_else(mismatch)).transpose()?
            }
            PropertyId::FillColor => {
                self.fill_color = value.map(|v| v.as_color().ok_or_else(mismatch)).transpose()?
            }
            _ => return Err(PropertyError::NotInheritable { property: id }),
        }
        Ok(())
    }

    /// Whether any font property is inherited rather than set here
    pub fn inherits_font(&self) -> bool {
        self.font_family.is_none() || self.font_style.is_none() || self.font_size.is_none()
    }

    pub fn is_empty(&self) -> bool {
        *self == StyleBlock::default()
    }
}

/// Fully resolved style after walking the ancestor chain
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub font_family: String,
    pub font_style: FontStyle,
    /// Points
    pub font_size: f64,
    pub stroke_color: Color,
    pub stroke_width: Mils,
    pub stroke_pattern: StrokePattern,
    pub fill_color: Color,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            font_family: defaults::FONT_FAMILY.to_string(),
            font_style: FontStyle::Plain,
            font_size: defaults::FONT_SIZE,
            stroke_color: Color::BLACK,
            stroke_width: defaults::STROKE_WIDTH,
            stroke_pattern: StrokePattern::SOLID,
            fill_color: Color::TRANSPARENT,
        }
    }
}

impl ResolvedStyle {
    /// Apply one node's explicit values on top of the inherited ones
    pub fn inherit(&self, block: &StyleBlock) -> ResolvedStyle {
        ResolvedStyle {
            font_family: block
                .font_family
                .clone()
                .unwrap_or_else(|| self.font_family.clone()),
            font_style: block.font_style.unwrap_or(self.font_style),
            font_size: block.font_size.unwrap_or(self.font_size),
            stroke_color: block.stroke_color.unwrap_or(self.stroke_color),
            stroke_width: block
                .stroke_width
                .and_then(Measure::to_mils)
                .unwrap_or(self.stroke_width),
            stroke_pattern: block.stroke_pattern.unwrap_or(self.stroke_pattern),
            fill_color: block.fill_color.unwrap_or(self.fill_color),
        }
    }

    pub fn is_stroked(&self) -> bool {
        self.stroke_width.0 > 0.0 && !self.stroke_color.is_transparent()
    }

    pub fn is_filled(&self) -> bool {
        !self.fill_color.is_transparent()
    }

    /// Font size converted to milli-inches
    pub fn font_size_mils(&self) -> f64 {
        self.font_size * 1000.0 / 72.0
    }
}

// ============================================================================
// Render cache
// ============================================================================

/// Lazily computed render state, cleared by the generic write path
#[derive(Debug, Default)]
pub struct RenderCache {
    bounds: Cell<Option<Rect>>,
    polar: Cell<Option<PolarLayout>>,
    display: RefCell<Option<Rc<[DrawOp]>>>,
    revision: Cell<u64>,
}

impl RenderCache {
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds.get()
    }

    pub(crate) fn store_bounds(&self, r: Rect) {
        self.bounds.set(Some(r));
    }

    pub(crate) fn polar_layout(&self, compute: impl FnOnce() -> PolarLayout) -> PolarLayout {
        match self.polar.get() {
            Some(layout) => layout,
            None => {
                let layout = compute();
                self.polar.set(Some(layout));
                layout
            }
        }
    }

    pub fn has_polar_layout(&self) -> bool {
        self.polar.get().is_some()
    }

    pub(crate) fn display_list(&self, build: impl FnOnce() -> Vec<DrawOp>) -> Rc<[DrawOp]> {
        if let Some(ops) = self.display.borrow().as_ref() {
            return Rc::clone(ops);
        }
        let ops: Rc<[DrawOp]> = build().into();
        *self.display.borrow_mut() = Some(Rc::clone(&ops));
        ops
    }

    pub fn has_display_list(&self) -> bool {
        self.display.borrow().is_some()
    }

    /// Number of times this node was invalidated
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Drop everything computed for this node
    pub(crate) fn invalidate(&self) {
        self.revision.set(self.revision.get() + 1);
        self.release();
    }

    /// Forget only the bounds (an ancestor of a changed node)
    pub(crate) fn clear_bounds(&self) {
        self.bounds.set(None);
    }

    /// Release every cached resource without counting an invalidation
    pub(crate) fn release(&self) {
        self.bounds.set(None);
        self.polar.set(None);
        self.display.borrow_mut().take();
    }
}

// ============================================================================
// Behavior
// ============================================================================

/// Where a node sits in its parent and the frame it gives its children
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Node-local to parent-local
    pub transform: DAffine2,
    /// The node's own viewport, if it can host children or plotted data
    pub viewport: Option<Viewport>,
}

impl Placement {
    /// A node drawn directly in its parent's frame
    pub fn in_parent() -> Self {
        Placement { transform: DAffine2::IDENTITY, viewport: None }
    }
}

/// Everything a node needs to decide visibility and build its display list
pub struct RenderEnv<'a> {
    pub style: &'a ResolvedStyle,
    /// The parent's viewport, or the page for the root
    pub parent: &'a Viewport,
    /// The node's own viewport
    pub local: Option<&'a Viewport>,
    pub parent_data: Option<&'a NodeData>,
}

/// Capabilities every node kind provides
#[enum_dispatch]
pub trait NodeBehavior {
    fn kind(&self) -> NodeKind;

    /// Current value of a property this kind owns
    fn property(&self, id: PropertyId) -> Option<PropertyValue>;

    /// Limits for a measured property this kind owns
    fn measure_constraints(&self, _id: PropertyId) -> MeasureConstraints {
        MeasureConstraints::LOCATION
    }

    /// Store a type-checked value; cross-field checks happen here
    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError>;

    /// Declared anchor location for kinds that can be moved
    fn location(&self) -> Option<(Measure, Measure)> {
        None
    }

    fn placement(
        &self,
        parent: &Viewport,
        cache: &RenderCache,
    ) -> Result<Placement, GeometryError>;

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool;

    /// Drawing operations in the node's local frame
    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp>;
}

/// The closed set of per-kind payloads
#[enum_dispatch(NodeBehavior)]
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Figure(FigureNode),
    Graph(GraphNode),
    PolarPlot(PolarPlotNode),
    Graph3D(Graph3DNode),
    Backplane(BackplaneNode),
    Label(LabelNode),
    Line(LineNode),
    Shape(ShapeNode),
    Function(FunctionNode),
    TickSet(TickSetNode),
}

impl NodeData {
    /// A node of `kind` with default geometry
    pub fn new(kind: NodeKind) -> NodeData {
        match kind {
            NodeKind::Figure => FigureNode::default().into(),
            NodeKind::Graph => GraphNode::default().into(),
            NodeKind::PolarPlot => PolarPlotNode::default().into(),
            NodeKind::Graph3D => Graph3DNode::default().into(),
            NodeKind::Backplane => BackplaneNode::new(Plane::XY).into(),
            NodeKind::Label => LabelNode::default().into(),
            NodeKind::Line => LineNode::default().into(),
            NodeKind::Shape => ShapeNode::default().into(),
            NodeKind::Function => FunctionNode::default().into(),
            NodeKind::TickSet => TickSetNode::default().into(),
        }
    }
}

// ============================================================================
// Node
// ============================================================================

/// One node in a model's arena
#[derive(Debug)]
pub struct GraphicNode {
    pub(crate) data: NodeData,
    pub(crate) style: StyleBlock,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) components: Vec<NodeId>,
    pub(crate) is_component: bool,
    pub(crate) notify: bool,
    pub(crate) cache: RenderCache,
}

impl GraphicNode {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            data,
            style: StyleBlock::default(),
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            is_component: false,
            notify: true,
            cache: RenderCache::default(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn style(&self) -> &StyleBlock {
        &self.style
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// User children in Z-order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Intrinsic component nodes
    pub fn components(&self) -> &[NodeId] {
        &self.components
    }

    pub fn is_component(&self) -> bool {
        self.is_component
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notify
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn supports(&self, id: PropertyId) -> bool {
        id.is_style() || self.data.property(id).is_some()
    }

    /// Generic read: kind-owned properties first, then the style block.
    ///
    /// Returns `Err` for a property this kind does not have; `Ok(None)` is
    /// an inherited style value.
    pub fn get_property_value(&self, id: PropertyId) -> Result<Option<PropertyValue>, PropertyError> {
        if id.is_style() {
            return Ok(self.style.get(id));
        }
        self.data
            .property(id)
            .map(Some)
            .ok_or(PropertyError::Unsupported { kind: self.kind(), property: id })
    }

    /// Type-check and constrain a candidate value without storing it
    pub(crate) fn normalize(
        &self,
        id: PropertyId,
        value: Option<PropertyValue>,
    ) -> Result<Option<PropertyValue>, PropertyError> {
        if !self.supports(id) {
            return Err(PropertyError::Unsupported { kind: self.kind(), property: id });
        }
        let Some(value) = value else {
            return if id.is_inheritable() {
                Ok(None)
            } else {
                Err(PropertyError::NotInheritable { property: id })
            };
        };
        if value.value_type() != id.value_type() {
            return Err(PropertyError::TypeMismatch {
                property: id,
                expected: id.value_type().name(),
            });
        }
        match value {
            PropertyValue::Measure(m) => {
                let constraints = if id == PropertyId::StrokeWidth {
                    MeasureConstraints::STROKE
                } else {
                    self.data.measure_constraints(id)
                };
                constraints
                    .constrain(m)
                    .map(|m| Some(PropertyValue::Measure(m)))
                    .ok_or_else(|| PropertyError::OutOfRange {
                        property: id,
                        reason: format!("{} units are not allowed", m.unit.suffix()),
                    })
            }
            PropertyValue::Number(n) if !n.is_finite() => Err(PropertyError::OutOfRange {
                property: id,
                reason: "value must be finite".into(),
            }),
            other => Ok(Some(other)),
        }
    }

    /// Store a normalized value
    pub(crate) fn store(
        &mut self,
        id: PropertyId,
        value: Option<PropertyValue>,
    ) -> Result<(), PropertyError> {
        if id.is_style() {
            return self.style.set(id, value);
        }
        match value {
            Some(v) => self.data.store(id, v),
            None => Err(PropertyError::NotInheritable { property: id }),
        }
    }
}

/// Shared helper for kinds: unwrap a measure or report a type mismatch
pub(crate) fn expect_measure(id: PropertyId, v: PropertyValue) -> Result<Measure, PropertyError> {
    v.as_measure().ok_or(PropertyError::TypeMismatch { property: id, expected: "measure" })
}

pub(crate) fn expect_number(id: PropertyId, v: PropertyValue) -> Result<f64, PropertyError> {
    v.as_number().ok_or(PropertyError::TypeMismatch { property: id, expected: "number" })
}

pub(crate) fn expect_bool(id: PropertyId, v: PropertyValue) -> Result<bool, PropertyError> {
    v.as_bool().ok_or(PropertyError::TypeMismatch { property: id, expected: "boolean" })
}

pub(crate) fn unsupported(kind: NodeKind, property: PropertyId) -> PropertyError {
    PropertyError::Unsupported { kind, property }
}
