//! Raster output through tiny-skia

use std::rc::Rc;

use glam::DAffine2;
use tiny_skia::{
    FillRule, Mask, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform,
};

use super::display::{DrawOp, Outline, PathSeg, TextRun, arc_to_cubics};
use super::{RenderTask, Surface, render_tree};
use crate::defaults;
use crate::errors::RenderError;
use crate::log::debug;
use crate::tree::NodeTree;
use crate::types::{Color, Rect};

/// Raster output settings
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// Pixels per inch
    pub dpi: f64,
    pub background: Color,
    /// Page region to render, in milli-inches; the root figure's box if unset
    pub page_size: Option<Rect>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            dpi: defaults::DPI,
            background: Color::WHITE,
            page_size: None,
        }
    }
}

/// Draws text runs; tiny-skia has no text support of its own
pub trait TextPainter {
    fn paint_text(
        &self,
        pixmap: &mut Pixmap,
        run: &TextRun,
        transform: Transform,
        clip: Option<&Mask>,
    );
}

#[derive(Clone)]
struct CanvasState {
    transform: DAffine2,
    clip: Option<Rc<Mask>>,
}

/// A [`Surface`] over a tiny-skia pixmap
pub struct RasterCanvas<'a> {
    pixmap: &'a mut Pixmap,
    state: CanvasState,
    saved: Vec<CanvasState>,
    text: Option<&'a dyn TextPainter>,
}

impl<'a> RasterCanvas<'a> {
    /// `transform` maps page milli-inches to device pixels
    pub fn new(pixmap: &'a mut Pixmap, transform: DAffine2) -> Self {
        RasterCanvas {
            pixmap,
            state: CanvasState { transform, clip: None },
            saved: Vec::new(),
            text: None,
        }
    }

    pub fn with_text_painter(mut self, painter: &'a dyn TextPainter) -> Self {
        self.text = Some(painter);
        self
    }

    fn device_transform(&self) -> Transform {
        to_skia(&self.state.transform)
    }

    fn clip_to(&mut self, outline: &Outline) {
        let Some(path) = build_path(outline) else {
            return;
        };
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        mask.fill_path(&path, FillRule::Winding, true, self.device_transform());
        if let Some(outer) = &self.state.clip {
            for (m, o) in mask.data_mut().iter_mut().zip(outer.data()) {
                *m = ((*m as u16 * *o as u16) / 255) as u8;
            }
        }
        self.state.clip = Some(Rc::new(mask));
    }
}

impl Surface for RasterCanvas<'_> {
    fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn concat(&mut self, t: DAffine2) {
        self.state.transform = self.state.transform * t;
    }

    fn draw(&mut self, ops: &[DrawOp]) {
        let transform = self.device_transform();
        for op in ops {
            match op {
                DrawOp::Fill { path, color } => {
                    if color.is_transparent() {
                        continue;
                    }
                    let Some(path) = build_path(path) else { continue };
                    let clip = self.state.clip.as_deref();
                    self.pixmap
                        .fill_path(&path, &paint(*color), FillRule::Winding, transform, clip);
                }
                DrawOp::Stroke { path, style } => {
                    if style.color.is_transparent() || style.width <= 0.0 {
                        continue;
                    }
                    let Some(path) = build_path(path) else { continue };
                    let dashes: Vec<f32> = style.dashes.iter().map(|&d| d as f32).collect();
                    let stroke = Stroke {
                        width: style.width as f32,
                        dash: StrokeDash::new(dashes, 0.0),
                        ..Stroke::default()
                    };
                    let clip = self.state.clip.as_deref();
                    self.pixmap
                        .stroke_path(&path, &paint(style.color), &stroke, transform, clip);
                }
                DrawOp::Text(run) => {
                    if let Some(painter) = self.text {
                        painter.paint_text(self.pixmap, run, transform, self.state.clip.as_deref());
                    }
                }
                DrawOp::Clip(outline) => self.clip_to(outline),
            }
        }
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn to_skia(t: &DAffine2) -> Transform {
    let m = t.matrix2;
    let d = t.translation;
    Transform::from_row(
        m.x_axis.x as f32,
        m.x_axis.y as f32,
        m.y_axis.x as f32,
        m.y_axis.y as f32,
        d.x as f32,
        d.y as f32,
    )
}

/// Convert an outline; arcs become cubic pieces
fn build_path(outline: &Outline) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    let mut open = false;
    for seg in outline.segments() {
        match *seg {
            PathSeg::MoveTo(p) => {
                pb.move_to(p.x as f32, p.y as f32);
                open = true;
            }
            PathSeg::LineTo(p) => {
                pb.line_to(p.x as f32, p.y as f32);
            }
            PathSeg::CubicTo(a, b, c) => {
                pb.cubic_to(a.x as f32, a.y as f32, b.x as f32, b.y as f32, c.x as f32, c.y as f32);
            }
            PathSeg::Arc { center, radius, start, sweep } => {
                let (p0, pieces) = arc_to_cubics(center, radius, start, sweep);
                if open {
                    pb.line_to(p0.x as f32, p0.y as f32);
                } else {
                    pb.move_to(p0.x as f32, p0.y as f32);
                    open = true;
                }
                for [a, b, c] in pieces {
                    pb.cubic_to(a.x as f32, a.y as f32, b.x as f32, b.y as f32, c.x as f32, c.y as f32);
                }
            }
            PathSeg::Close => {
                pb.close();
                open = false;
            }
        }
    }
    pb.finish()
}

/// Page milli-inches to device pixels: scale by `dpi / 1000` and flip y
fn page_to_device(page: &Rect, dpi: f64) -> DAffine2 {
    let k = dpi / 1000.0;
    DAffine2::from_cols_array(&[k, 0.0, 0.0, -k, -page.min.x * k, page.max.y * k])
}

/// Render the whole tree into a new pixmap
pub fn render_raster(
    tree: &NodeTree,
    options: &RenderOptions,
    task: &mut dyn RenderTask,
) -> Result<Pixmap, RenderError> {
    render_raster_with(tree, options, task, None)
}

/// [`render_raster`] with text drawn by `painter`
pub fn render_raster_with(
    tree: &NodeTree,
    options: &RenderOptions,
    task: &mut dyn RenderTask,
    painter: Option<&dyn TextPainter>,
) -> Result<Pixmap, RenderError> {
    if !(options.dpi.is_finite() && options.dpi > 0.0) {
        return Err(RenderError::InvalidDpi { value: options.dpi });
    }
    let page = options
        .page_size
        .or_else(|| tree.page_rect())
        .ok_or(RenderError::NoRoot)?;
    let width = (page.width() * options.dpi / 1000.0).ceil().max(0.0) as u32;
    let height = (page.height() * options.dpi / 1000.0).ceil().max(0.0) as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;
    if !options.background.is_transparent() {
        let c = options.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
    }
    debug!(width, height, dpi = options.dpi, "raster render");

    let mut canvas = RasterCanvas::new(&mut pixmap, page_to_device(&page, options.dpi));
    if let Some(p) = painter {
        canvas = canvas.with_text_painter(p);
    }
    render_tree(tree, &mut canvas, task)?;
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use glam::dvec2;

    use super::*;
    use crate::node::{FigureNode, ModelId, ShapeNode};
    use crate::measure::Measure;
    use crate::property::PropertyId;
    use crate::render::FullRender;

    fn pixel(p: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = p.pixel(x, y).map(|c| c.demultiply());
        c.map_or((0, 0, 0, 0), |c| (c.red(), c.green(), c.blue(), c.alpha()))
    }

    #[test]
    fn device_transform_flips_y() {
        let page = Rect::from_xywh(0.0, 0.0, 1000.0, 1000.0);
        let t = page_to_device(&page, 100.0);
        assert_eq!(t.transform_point2(dvec2(0.0, 0.0)), dvec2(0.0, 100.0));
        assert_eq!(t.transform_point2(dvec2(1000.0, 1000.0)), dvec2(100.0, 0.0));
    }

    #[test]
    fn pixmap_matches_figure_at_dpi() {
        let mut tree = NodeTree::new(ModelId::fresh());
        tree.set_root(FigureNode::new(Measure::inches(2.0), Measure::inches(1.0)));
        let opts = RenderOptions { dpi: 50.0, ..Default::default() };
        let pixmap = render_raster(&tree, &opts, &mut FullRender).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (100, 50));
        assert_eq!(pixel(&pixmap, 50, 25), (255, 255, 255, 255));
    }

    #[test]
    fn filled_shape_lands_where_expected() {
        let mut tree = NodeTree::new(ModelId::fresh());
        let root = tree.set_root(FigureNode::new(Measure::inches(2.0), Measure::inches(2.0)));
        let shape = ShapeNode::new(
            (Measure::inches(0.5), Measure::inches(1.5)),
            Measure::inches(0.5),
            Measure::inches(0.5),
        );
        let id = tree.insert(root, shape.into(), None).unwrap();
        tree.write_property(id, PropertyId::FillColor, Some(Color::rgb(255, 0, 0).into()))
            .unwrap();
        let opts = RenderOptions { dpi: 100.0, ..Default::default() };
        let pixmap = render_raster(&tree, &opts, &mut FullRender).unwrap();
        // Shape centre (0.5in, 1.5in) is device (50, 50); opposite corner stays white
        assert_eq!(pixel(&pixmap, 50, 50), (255, 0, 0, 255));
        assert_eq!(pixel(&pixmap, 150, 150), (255, 255, 255, 255));
    }

    #[test]
    fn bad_dpi_is_rejected() {
        let tree = NodeTree::new(ModelId::fresh());
        let opts = RenderOptions { dpi: 0.0, ..Default::default() };
        assert_eq!(
            render_raster(&tree, &opts, &mut FullRender).unwrap_err(),
            RenderError::InvalidDpi { value: 0.0 }
        );
    }
}
