//! Rendering for figure trees
//!
//! This module is organized into submodules:
//! - `display`: backend-neutral display lists ([`DrawOp`]) and text metrics
//! - `raster`: the tiny-skia canvas
//! - `postscript`: the EPS writer
//!
//! Both backends implement [`Surface`] and are driven by the same traversal,
//! so visibility, ordering and clipping rules cannot drift apart.

mod display;
mod postscript;
mod raster;

pub use display::{
    DrawOp, FontSpec, Outline, PathSeg, StrokeStyle, TextAnchor, TextRun, arc_to_cubics,
    display_bounds, text_width,
};
pub use postscript::{PsOptions, PsWriter, to_postscript};
pub use raster::{RasterCanvas, RenderOptions, TextPainter, render_raster};

use glam::DAffine2;

use crate::errors::RenderError;
use crate::log::{debug, trace};
use crate::node::{NodeBehavior, NodeData, NodeId, RenderEnv, ResolvedStyle};
use crate::tree::NodeTree;
use crate::types::Rect;
use crate::viewport::Viewport;

/// A drawing target the traversal can replay display lists onto
pub trait Surface {
    /// Push the current transform and clip
    fn save(&mut self);
    /// Pop back to the last `save`
    fn restore(&mut self);
    /// Prepend `t` to the current transform (local to current)
    fn concat(&mut self, t: DAffine2);
    /// Paint ops expressed in the current frame
    fn draw(&mut self, ops: &[DrawOp]);
}

/// Per-render policy: what needs repainting, and whether to keep going
pub trait RenderTask {
    /// `bounds` is the node's own paint in page coordinates
    fn needs_render(&mut self, _bounds: &Rect) -> bool {
        true
    }

    /// Polled after every node; returning `false` cancels the render
    fn update_progress(&mut self) -> bool {
        true
    }
}

/// Paint everything, never cancel
#[derive(Clone, Copy, Debug, Default)]
pub struct FullRender;

impl RenderTask for FullRender {}

/// Walk the tree from the root onto `surface`
pub fn render_tree<S: Surface>(
    tree: &NodeTree,
    surface: &mut S,
    task: &mut dyn RenderTask,
) -> Result<(), RenderError> {
    let root = tree.root().ok_or(RenderError::NoRoot)?;
    let mut walk = Walk { tree, task };
    walk.visit(
        root,
        &Viewport::page(),
        None,
        &ResolvedStyle::default(),
        DAffine2::IDENTITY,
        surface,
    )
}

struct Walk<'t> {
    tree: &'t NodeTree,
    task: &'t mut dyn RenderTask,
}

impl Walk<'_> {
    fn visit<S: Surface>(
        &mut self,
        id: NodeId,
        parent: &Viewport,
        parent_data: Option<&NodeData>,
        inherited: &ResolvedStyle,
        parent_to_global: DAffine2,
        surface: &mut S,
    ) -> Result<(), RenderError> {
        let Some(node) = self.tree.get(id) else {
            return Ok(());
        };
        let placement = match node.data.placement(parent, &node.cache) {
            Ok(p) => p,
            Err(e) => {
                debug!(kind = %node.kind(), error = %e, "subtree skipped");
                return Ok(());
            }
        };
        let style = inherited.inherit(&node.style);
        let to_global = parent_to_global * placement.transform;
        let env = RenderEnv {
            style: &style,
            parent,
            local: placement.viewport.as_ref(),
            parent_data,
        };

        surface.save();
        surface.concat(placement.transform);
        let result = self.paint_and_recurse(node, &env, &style, to_global, surface);
        surface.restore();
        result
    }

    fn paint_and_recurse<S: Surface>(
        &mut self,
        node: &crate::node::GraphicNode,
        env: &RenderEnv<'_>,
        style: &ResolvedStyle,
        to_global: DAffine2,
        surface: &mut S,
    ) -> Result<(), RenderError> {
        if node.data.is_rendered(env) {
            let ops = node.cache.display_list(|| node.data.display_list(env));
            let bounds = display_bounds(&ops);
            let global = if bounds.is_empty() { bounds } else { bounds.transformed(&to_global) };
            if !ops.is_empty() && self.task.needs_render(&global) {
                trace!(kind = %node.kind(), ops = ops.len(), "draw");
                surface.draw(&ops);
            }
        }
        if !self.task.update_progress() {
            return Err(RenderError::Cancelled);
        }
        let Some(local) = env.local else {
            return Ok(());
        };
        for &c in node.components.iter().chain(&node.children) {
            self.visit(c, local, Some(&node.data), style, to_global, surface)?;
        }
        Ok(())
    }
}

// ============================================================================
// Bounds
// ============================================================================

impl NodeTree {
    /// Bounds of everything `id` and its subtree paint, in the parent's frame.
    ///
    /// Cached on the node until the write path invalidates it or one of its
    /// descendants.
    pub fn render_bounds(&self, id: NodeId) -> Rect {
        let Some(node) = self.get(id) else {
            return Rect::EMPTY;
        };
        if let Some(b) = node.cache.bounds() {
            return b;
        }
        let Ok(frame) = self.frame(id) else {
            return Rect::EMPTY;
        };
        let style = self.resolved_style(id);
        let parent_data = node.parent.and_then(|p| self.get(p)).map(|p| &p.data);
        let local = frame.placement.viewport.as_ref();
        let env = RenderEnv { style: &style, parent: &frame.parent, local, parent_data };

        let mut own = Rect::EMPTY;
        if node.data.is_rendered(&env) {
            own = display_bounds(&node.cache.display_list(|| node.data.display_list(&env)));
        }
        if local.is_some() {
            for &c in node.components.iter().chain(&node.children) {
                own = own.union(&self.render_bounds(c));
            }
        }
        let bounds = if own.is_empty() { own } else { own.transformed(&frame.placement.transform) };
        node.cache.store_bounds(bounds);
        bounds
    }

    /// [`render_bounds`](Self::render_bounds) mapped to page coordinates
    pub fn global_bounds(&self, id: NodeId) -> Option<Rect> {
        let frame = self.frame(id).ok()?;
        let b = self.render_bounds(id);
        (!b.is_empty()).then(|| b.transformed(&frame.parent_to_global))
    }

    /// The root figure's box on the page
    pub fn page_rect(&self) -> Option<Rect> {
        let frame = self.frame(self.root()?).ok()?;
        let rect = frame.placement.viewport.as_ref()?.rect()?;
        Some(rect.transformed(&frame.local_to_global()))
    }
}
