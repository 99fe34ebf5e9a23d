//! Core of a vector figure editor.
//!
//! A figure is a tree of graphic nodes held by a [`GraphicModel`]. Every
//! user-visible change goes through the model as a [`ReversibleEdit`] so it
//! can be undone and redone. Nodes place themselves through nested
//! [`Viewport`]s (cartesian or polar) and draw through a backend-neutral
//! display list, rendered by [`render_raster`] or [`to_postscript`].
//!
//! ```
//! use figcore::{GraphicModel, LabelNode, Measure, PropertyId};
//!
//! let mut model = GraphicModel::default();
//! let root = model.root();
//! let label = model
//!     .insert(root, LabelNode::new(Measure::inches(1.0), Measure::inches(1.0), "hello"))
//!     .unwrap();
//! assert!(model.set_property_value(label, PropertyId::Title, Some("world".into())));
//! assert!(model.undo());
//! ```

mod log;

pub mod defaults;
pub mod errors;
pub mod measure;
pub mod property;
pub mod stroke;
pub mod types;

pub mod formula;
pub mod node;
pub mod viewport;

pub mod edit;
pub mod history;
pub mod style;
pub mod tree;

pub mod render;

pub mod align;
pub mod model;

pub use align::Locus;
pub use edit::{Direction, EditRecord, MultiEdit, PropertyChange, ReversibleEdit};
pub use errors::{GeometryError, PropertyError, RenderError, StyleError};
pub use formula::Formula;
pub use history::{EditHistory, ReplayOutcome};
pub use measure::{Measure, MeasureConstraints, Unit};
pub use model::{ChangeKind, GraphicModel, ModelConfig, ModelListener};
pub use node::{
    BackplaneNode, FigureNode, FunctionNode, Graph3DNode, GraphNode, GraphicNode, LabelNode,
    LineEnd, LineNode, ModelId, NodeBehavior, NodeData, NodeId, NodeKind, PolarPlotNode,
    ShapeNode, TickSetNode,
};
pub use property::{Backdrop, FontStyle, PropertyId, PropertyValue, ValueType};
pub use render::{
    FullRender, PsOptions, RenderOptions, RenderTask, Surface, render_raster, render_tree,
    to_postscript,
};
pub use stroke::StrokePattern;
pub use style::{DefaultCodec, StyleDocument, StyleSet, ValueCodec};
pub use tree::{NodeTree, TrackState, WriteOutcome};
pub use types::{Angle, Color, Mils, Rect};
pub use viewport::{Axis, PolarLayout, Viewport};
