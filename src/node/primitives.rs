//! Free-standing graphics: text labels, straight lines and shapes.

use glam::{DAffine2, dvec2};

use super::{
    NodeBehavior, NodeKind, Placement, RenderCache, RenderEnv, expect_measure, expect_number,
    unsupported,
};
use crate::defaults;
use crate::errors::{GeometryError, PropertyError};
use crate::measure::{Measure, MeasureConstraints};
use crate::property::{PropertyId, PropertyValue};
use crate::render::{DrawOp, FontSpec, Outline, TextAnchor, TextRun};
use crate::types::Angle;
use crate::viewport::{Axis, Viewport, line_local_endpoints, line_placement};

/// Translation to a resolved anchor followed by a rotation about it
fn anchored(parent: &Viewport, x: Measure, y: Measure, rotate: f64) -> Result<DAffine2, GeometryError> {
    let origin = parent.resolve_point(x, y).ok_or(GeometryError::Unresolved)?;
    Ok(DAffine2::from_translation(origin) * DAffine2::from_angle(rotate.to_radians()))
}

fn text_value(id: PropertyId, value: PropertyValue) -> Result<String, PropertyError> {
    match value {
        PropertyValue::Text(t) => Ok(t),
        _ => Err(PropertyError::TypeMismatch { property: id, expected: "text" }),
    }
}

// ============================================================================
// Label
// ============================================================================

/// A single line of text anchored at `(x, y)`
#[derive(Clone, Debug, PartialEq)]
pub struct LabelNode {
    pub x: Measure,
    pub y: Measure,
    /// Degrees counter-clockwise about the anchor
    pub rotate: f64,
    pub title: String,
}

impl Default for LabelNode {
    fn default() -> Self {
        LabelNode::new(Measure::pct(50.0), Measure::pct(50.0), defaults::LABEL_TEXT)
    }
}

impl LabelNode {
    pub fn new(x: Measure, y: Measure, title: &str) -> Self {
        LabelNode { x, y, rotate: 0.0, title: title.to_string() }
    }
}

impl NodeBehavior for LabelNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Label
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::X => Some(self.x.into()),
            PropertyId::Y => Some(self.y.into()),
            PropertyId::Rotate => Some(self.rotate.into()),
            PropertyId::Title => Some(PropertyValue::Text(self.title.clone())),
            _ => None,
        }
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        match id {
            PropertyId::X => self.x = expect_measure(id, value)?,
            PropertyId::Y => self.y = expect_measure(id, value)?,
            PropertyId::Rotate => self.rotate = Angle(expect_number(id, value)?).normalized().degrees(),
            PropertyId::Title => self.title = text_value(id, value)?,
            _ => return Err(unsupported(self.kind(), id)),
        }
        Ok(())
    }

    fn location(&self) -> Option<(Measure, Measure)> {
        Some((self.x, self.y))
    }

    fn placement(&self, parent: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        Ok(Placement { transform: anchored(parent, self.x, self.y, self.rotate)?, viewport: None })
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        !self.title.trim().is_empty() && !env.style.stroke_color.is_transparent()
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        vec![DrawOp::Text(TextRun {
            text: self.title.clone(),
            at: dvec2(0.0, 0.0),
            font: FontSpec::from_style(env.style),
            color: env.style.stroke_color,
            anchor: TextAnchor::Start,
        })]
    }
}

// ============================================================================
// Line
// ============================================================================

/// Which end of a line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEnd {
    Start,
    End,
}

impl LineEnd {
    /// The properties holding this endpoint's coordinates
    pub fn properties(self) -> (PropertyId, PropertyId) {
        match self {
            LineEnd::Start => (PropertyId::X, PropertyId::Y),
            LineEnd::End => (PropertyId::X2, PropertyId::Y2),
        }
    }
}

/// A straight segment from `(x, y)` to `(x2, y2)`
#[derive(Clone, Debug, PartialEq)]
pub struct LineNode {
    pub x: Measure,
    pub y: Measure,
    pub x2: Measure,
    pub y2: Measure,
}

impl Default for LineNode {
    fn default() -> Self {
        LineNode::new(
            (Measure::pct(10.0), Measure::pct(50.0)),
            (Measure::pct(90.0), Measure::pct(50.0)),
        )
    }
}

impl LineNode {
    pub fn new(start: (Measure, Measure), end: (Measure, Measure)) -> Self {
        LineNode { x: start.0, y: start.1, x2: end.0, y2: end.1 }
    }

    pub fn endpoint(&self, end: LineEnd) -> (Measure, Measure) {
        match end {
            LineEnd::Start => (self.x, self.y),
            LineEnd::End => (self.x2, self.y2),
        }
    }
}

impl NodeBehavior for LineNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Line
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::X => Some(self.x.into()),
            PropertyId::Y => Some(self.y.into()),
            PropertyId::X2 => Some(self.x2.into()),
            PropertyId::Y2 => Some(self.y2.into()),
            _ => None,
        }
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        let slot = match id {
            PropertyId::X => &mut self.x,
            PropertyId::Y => &mut self.y,
            PropertyId::X2 => &mut self.x2,
            PropertyId::Y2 => &mut self.y2,
            _ => return Err(unsupported(NodeKind::Line, id)),
        };
        *slot = expect_measure(id, value)?;
        Ok(())
    }

    fn location(&self) -> Option<(Measure, Measure)> {
        Some((self.x, self.y))
    }

    fn placement(&self, parent: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        let p0 = parent.resolve_point(self.x, self.y).ok_or(GeometryError::Unresolved)?;
        let p1 = parent.resolve_point(self.x2, self.y2).ok_or(GeometryError::Unresolved)?;
        line_placement(p0, p1)
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        env.style.is_stroked()
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        let Some(len) = env.local.and_then(Viewport::extent).map(|e| e.x) else {
            return Vec::new();
        };
        let (a, b) = line_local_endpoints(len);
        vec![DrawOp::stroke(Outline::polyline(&[a, b]), env.style)]
    }
}

// ============================================================================
// Shape
// ============================================================================

/// A rectangle centered on `(x, y)`, optionally rotated and titled
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeNode {
    pub x: Measure,
    pub y: Measure,
    pub width: Measure,
    pub height: Measure,
    /// Degrees counter-clockwise about the center
    pub rotate: f64,
    pub title: String,
}

impl Default for ShapeNode {
    fn default() -> Self {
        ShapeNode::new(
            (Measure::pct(50.0), Measure::pct(50.0)),
            defaults::SHAPE_SIZE,
            defaults::SHAPE_SIZE,
        )
    }
}

impl ShapeNode {
    pub fn new(center: (Measure, Measure), width: Measure, height: Measure) -> Self {
        ShapeNode {
            x: center.0,
            y: center.1,
            width,
            height,
            rotate: 0.0,
            title: String::new(),
        }
    }
}

impl NodeBehavior for ShapeNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Shape
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::X => Some(self.x.into()),
            PropertyId::Y => Some(self.y.into()),
            PropertyId::Width => Some(self.width.into()),
            PropertyId::Height => Some(self.height.into()),
            PropertyId::Rotate => Some(self.rotate.into()),
            PropertyId::Title => Some(PropertyValue::Text(self.title.clone())),
            _ => None,
        }
    }

    fn measure_constraints(&self, id: PropertyId) -> MeasureConstraints {
        match id {
            PropertyId::Width | PropertyId::Height => MeasureConstraints::SIZE,
            _ => MeasureConstraints::LOCATION,
        }
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        match id {
            PropertyId::X => self.x = expect_measure(id, value)?,
            PropertyId::Y => self.y = expect_measure(id, value)?,
            PropertyId::Width => self.width = expect_measure(id, value)?,
            PropertyId::Height => self.height = expect_measure(id, value)?,
            PropertyId::Rotate => self.rotate = Angle(expect_number(id, value)?).normalized().degrees(),
            PropertyId::Title => self.title = text_value(id, value)?,
            _ => return Err(unsupported(self.kind(), id)),
        }
        Ok(())
    }

    fn location(&self) -> Option<(Measure, Measure)> {
        Some((self.x, self.y))
    }

    fn placement(&self, parent: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        let transform = anchored(parent, self.x, self.y, self.rotate)?;
        let w = parent.resolve_length(self.width, Axis::X).ok_or(GeometryError::Unresolved)?;
        let h = parent.resolve_length(self.height, Axis::Y).ok_or(GeometryError::Unresolved)?;
        Ok(Placement { transform, viewport: Some(Viewport::centered(w, h)) })
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        let has_area = env
            .local
            .and_then(Viewport::extent)
            .is_some_and(|e| e.x > 0.0 && e.y > 0.0);
        has_area && (env.style.is_stroked() || env.style.is_filled() || !self.title.is_empty())
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        let Some(r) = env.local.and_then(Viewport::rect) else {
            return Vec::new();
        };
        let mut ops = DrawOp::paint(Outline::rect(r), env.style);
        if !self.title.trim().is_empty() {
            let font = FontSpec::from_style(env.style);
            ops.push(DrawOp::Text(TextRun {
                text: self.title.clone(),
                at: dvec2(0.0, -0.35 * font.size),
                font,
                color: env.style.stroke_color,
                anchor: TextAnchor::Middle,
            }));
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ResolvedStyle;
    use crate::types::Rect;

    #[test]
    fn shape_is_centered_and_rotated() {
        let parent = Viewport::new(2000.0, 2000.0);
        let mut shape = ShapeNode::new(
            (Measure::inches(1.0), Measure::inches(1.0)),
            Measure::inches(0.4),
            Measure::inches(0.2),
        );
        shape.rotate = 90.0;
        let p = shape.placement(&parent, &RenderCache::default()).unwrap();
        let vp = p.viewport.unwrap();
        assert_eq!(vp.rect(), Some(Rect::from_xywh(-200.0, -100.0, 400.0, 200.0)));
        // Local +x points up after a quarter turn
        let tip = p.transform.transform_point2(dvec2(200.0, 0.0));
        assert!((tip - dvec2(1000.0, 1200.0)).length() < 1e-9);
    }

    #[test]
    fn line_draws_along_its_viewport_top_edge() {
        let parent = Viewport::new(1000.0, 1000.0);
        let line = LineNode::new(
            (Measure::inches(0.1), Measure::inches(0.1)),
            (Measure::inches(0.4), Measure::inches(0.5)),
        );
        let p = line.placement(&parent, &RenderCache::default()).unwrap();
        let vp = p.viewport.as_ref().unwrap();
        assert!((vp.extent().unwrap().x - 500.0).abs() < 1e-9);

        let style = ResolvedStyle::default();
        let env = RenderEnv { style: &style, parent: &parent, local: Some(vp), parent_data: None };
        let ops = line.display_list(&env);
        let DrawOp::Stroke { path, .. } = &ops[0] else { panic!("expected a stroke") };
        let b = path.bounds().transformed(&p.transform);
        assert!((b.min - dvec2(100.0, 100.0)).length() < 1e-9);
        assert!((b.max - dvec2(400.0, 500.0)).length() < 1e-9);
    }

    #[test]
    fn empty_label_is_not_rendered() {
        let parent = Viewport::new(1000.0, 1000.0);
        let style = ResolvedStyle::default();
        let env = RenderEnv { style: &style, parent: &parent, local: None, parent_data: None };
        assert!(LabelNode::default().is_rendered(&env));
        assert!(!LabelNode::new(Measure::pct(0.0), Measure::pct(0.0), "  ").is_rendered(&env));
    }

    #[test]
    fn zero_length_line_has_no_frame() {
        let parent = Viewport::new(1000.0, 1000.0);
        let p = (Measure::inches(0.2), Measure::inches(0.2));
        let line = LineNode::new(p, p);
        assert_eq!(
            line.placement(&parent, &RenderCache::default()),
            Err(GeometryError::ZeroLength)
        );
    }
}
