//! Backend-neutral display lists.
//!
//! Nodes describe what they paint as a list of [`DrawOp`]s in their own
//! frame. The raster canvas and the PostScript writer each replay the same
//! list, so both backends see identical geometry.

use glam::{DVec2, dvec2};

use crate::defaults;
use crate::node::ResolvedStyle;
use crate::property::FontStyle;
use crate::types::{Color, Rect};
use crate::viewport::unit_vector;

/// Proportional character widths in hundredths of an average glyph.
#[rustfmt::skip]
const CHAR_WIDTHS: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,
    55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,
    91,  91,  50,  50, 120, 120, 120,  78,
   142, 102, 105, 110, 115, 105,  98, 105,
   125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150,
   100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,
    92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,
    81,  80,  76,  91,  49,  91, 118,
];

/// Estimated advance of `text` set at `size` (same unit as the result)
pub fn text_width(text: &str, size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' '..='~' => CHAR_WIDTHS[c as usize - 0x20] as u32,
            _ => 100,
        })
        .sum();
    units as f64 / 100.0 * defaults::CHAR_WIDTH * size
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSeg {
    MoveTo(DVec2),
    LineTo(DVec2),
    CubicTo(DVec2, DVec2, DVec2),
    /// Circular arc in degrees; joins the current point to the arc start
    /// with a straight segment, like PostScript `arc`
    Arc {
        center: DVec2,
        radius: f64,
        start: f64,
        sweep: f64,
    },
    Close,
}

/// A path in some node's local frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    segs: Vec<PathSeg>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, p: DVec2) -> Self {
        self.segs.push(PathSeg::MoveTo(p));
        self
    }

    pub fn line_to(mut self, p: DVec2) -> Self {
        self.segs.push(PathSeg::LineTo(p));
        self
    }

    pub fn arc(mut self, center: DVec2, radius: f64, start: f64, sweep: f64) -> Self {
        self.segs.push(PathSeg::Arc { center, radius, start, sweep });
        self
    }

    pub fn close(mut self) -> Self {
        self.segs.push(PathSeg::Close);
        self
    }

    pub fn rect(r: Rect) -> Self {
        let [a, b, c, d] = r.corners();
        Outline::new().move_to(a).line_to(b).line_to(c).line_to(d).close()
    }

    pub fn polygon(points: &[DVec2]) -> Self {
        Self::polyline(points).close()
    }

    pub fn polyline(points: &[DVec2]) -> Self {
        let mut out = Outline::new();
        for (i, &p) in points.iter().enumerate() {
            out = if i == 0 { out.move_to(p) } else { out.line_to(p) };
        }
        out
    }

    pub fn segments(&self) -> &[PathSeg] {
        &self.segs
    }

    pub fn is_empty(&self) -> bool {
        self.segs.is_empty()
    }

    pub fn bounds(&self) -> Rect {
        let mut r = Rect::EMPTY;
        for seg in &self.segs {
            match *seg {
                PathSeg::MoveTo(p) | PathSeg::LineTo(p) => r.expand_point(p),
                PathSeg::CubicTo(a, b, c) => {
                    // Control hull contains the curve
                    r.expand_point(a);
                    r.expand_point(b);
                    r.expand_point(c);
                }
                PathSeg::Arc { center, radius, start, sweep } => {
                    let (lo, hi) = if sweep < 0.0 { (start + sweep, start) } else { (start, start + sweep) };
                    r.expand_point(center + unit_vector(lo) * radius);
                    r.expand_point(center + unit_vector(hi) * radius);
                    let first = (lo / 90.0).ceil() as i64;
                    let last = (hi / 90.0).floor() as i64;
                    for k in first..=last.min(first + 4) {
                        r.expand_point(center + unit_vector(k as f64 * 90.0) * radius);
                    }
                }
                PathSeg::Close => {}
            }
        }
        r
    }
}

/// Split an arc into cubic Bezier pieces of at most 90 degrees.
///
/// Returns the start point and one `[c1, c2, end]` triple per piece.
pub fn arc_to_cubics(center: DVec2, radius: f64, start: f64, sweep: f64) -> (DVec2, Vec<[DVec2; 3]>) {
    let pieces = ((sweep.abs() / 90.0).ceil() as usize).max(1);
    let step = sweep / pieces as f64;
    let k = 4.0 / 3.0 * (step.to_radians() / 4.0).tan();
    let point = |deg: f64| center + unit_vector(deg) * radius;
    let tangent = |deg: f64| {
        let u = unit_vector(deg);
        dvec2(-u.y, u.x) * radius * k
    };
    let mut out = Vec::with_capacity(pieces);
    for i in 0..pieces {
        let a0 = start + step * i as f64;
        let a1 = a0 + step;
        let (p0, p1) = (point(a0), point(a1));
        out.push([p0 + tangent(a0), p1 - tangent(a1), p1]);
    }
    (point(start), out)
}

/// Stroke parameters resolved to local lengths
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    /// Dash-gap lengths; empty for solid
    pub dashes: Vec<f64>,
}

impl StrokeStyle {
    pub fn from_style(style: &ResolvedStyle) -> Self {
        let width = style.stroke_width.0;
        StrokeStyle {
            color: style.stroke_color,
            width,
            dashes: style.stroke_pattern.dash_array(width),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub style: FontStyle,
    /// Em size in milli-inches
    pub size: f64,
}

impl FontSpec {
    pub fn from_style(style: &ResolvedStyle) -> Self {
        FontSpec {
            family: style.font_family.clone(),
            style: style.font_style,
            size: style.font_size_mils(),
        }
    }
}

/// One line of text, baseline anchored at `at`
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub at: DVec2,
    pub font: FontSpec,
    pub color: Color,
    pub anchor: TextAnchor,
}

impl TextRun {
    pub fn width(&self) -> f64 {
        text_width(&self.text, self.font.size)
    }

    /// Estimated ink box: descenders below the baseline, cap height above
    pub fn bounds(&self) -> Rect {
        let w = self.width();
        let left = match self.anchor {
            TextAnchor::Start => self.at.x,
            TextAnchor::Middle => self.at.x - w / 2.0,
        };
        let size = self.font.size;
        Rect::from_xywh(left, self.at.y - 0.25 * size, w, size)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Fill { path: Outline, color: Color },
    Stroke { path: Outline, style: StrokeStyle },
    Text(TextRun),
    /// Restricts everything drawn after it, including the node's children
    Clip(Outline),
}

impl DrawOp {
    pub fn fill(path: Outline, style: &ResolvedStyle) -> DrawOp {
        DrawOp::Fill { path, color: style.fill_color }
    }

    pub fn stroke(path: Outline, style: &ResolvedStyle) -> DrawOp {
        DrawOp::Stroke { path, style: StrokeStyle::from_style(style) }
    }

    /// Fill and stroke the same outline, each only when the style paints it
    pub fn paint(path: Outline, style: &ResolvedStyle) -> Vec<DrawOp> {
        let mut ops = Vec::with_capacity(2);
        if style.is_filled() {
            ops.push(DrawOp::fill(path.clone(), style));
        }
        if style.is_stroked() {
            ops.push(DrawOp::stroke(path, style));
        }
        ops
    }
}

/// Local bounds of everything a display list paints
pub fn display_bounds(ops: &[DrawOp]) -> Rect {
    ops.iter().fold(Rect::EMPTY, |acc, op| match op {
        DrawOp::Fill { path, .. } => acc.union(&path.bounds()),
        DrawOp::Stroke { path, style } => acc.union(&path.bounds().inflate(style.width / 2.0)),
        DrawOp::Text(run) => acc.union(&run.bounds()),
        DrawOp::Clip(_) => acc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_bounds_include_axis_crossings() {
        let quarter = Outline::new().arc(DVec2::ZERO, 10.0, 45.0, 90.0);
        let b = quarter.bounds();
        assert!((b.max.y - 10.0).abs() < 1e-12);
        assert!((b.min.x + 10.0 * 0.5f64.sqrt()).abs() < 1e-9);
        let full = Outline::new().arc(DVec2::ZERO, 1.0, 0.0, 360.0);
        assert_eq!(full.bounds(), Rect::from_xywh(-1.0, -1.0, 2.0, 2.0));
    }

    #[test]
    fn cubic_arc_pieces_end_on_circle() {
        let (start, pieces) = arc_to_cubics(dvec2(5.0, 5.0), 2.0, 0.0, -270.0);
        assert_eq!(pieces.len(), 3);
        assert!((start - dvec2(7.0, 5.0)).length() < 1e-12);
        let end = pieces[2][2];
        assert!((end - dvec2(5.0, 7.0)).length() < 1e-9);
    }

    #[test]
    fn stroke_inflates_bounds() {
        let style = ResolvedStyle { stroke_width: crate::types::Mils(4.0), ..Default::default() };
        let ops = DrawOp::paint(Outline::rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0)), &style);
        assert_eq!(ops.len(), 1);
        assert_eq!(display_bounds(&ops), Rect::from_xywh(-2.0, -2.0, 14.0, 14.0));
    }

    #[test]
    fn text_width_is_proportional() {
        assert!(text_width("iii", 100.0) < text_width("WWW", 100.0));
        assert_eq!(text_width("", 100.0), 0.0);
    }
}
