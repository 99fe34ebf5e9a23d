//! Container kinds: the figure, the data graphs and 3D backplanes.

use glam::{DAffine2, DVec2, dvec2};

use super::{
    NodeBehavior, NodeKind, Placement, RenderCache, RenderEnv, expect_bool, expect_measure,
    expect_number, unsupported,
};
use crate::defaults;
use crate::errors::{GeometryError, PropertyError};
use crate::measure::{Measure, MeasureConstraints};
use crate::node::NodeData;
use crate::property::{Backdrop, PropertyId, PropertyValue};
use crate::render::{DrawOp, FontSpec, Outline, TextAnchor, TextRun};
use crate::types::{Angle, Rect};
use crate::viewport::{Axis, PolarAxes, PolarLayout, PolarMapping, UserSpace, Viewport, unit_vector};

/// Position and size shared by the box-shaped containers.
///
/// `(x, y)` is the bottom-left corner in the parent's viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxFrame {
    pub x: Measure,
    pub y: Measure,
    pub width: Measure,
    pub height: Measure,
}

impl BoxFrame {
    pub const fn new(x: Measure, y: Measure, width: Measure, height: Measure) -> Self {
        BoxFrame { x, y, width, height }
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::X => Some(self.x.into()),
            PropertyId::Y => Some(self.y.into()),
            PropertyId::Width => Some(self.width.into()),
            PropertyId::Height => Some(self.height.into()),
            _ => None,
        }
    }

    fn constraints(id: PropertyId) -> Option<MeasureConstraints> {
        match id {
            PropertyId::X | PropertyId::Y => Some(MeasureConstraints::LOCATION),
            PropertyId::Width | PropertyId::Height => Some(MeasureConstraints::SIZE),
            _ => None,
        }
    }

    /// `None` when `id` is not one of the frame's properties
    fn store(&mut self, id: PropertyId, v: &PropertyValue) -> Option<Result<(), PropertyError>> {
        let slot = match id {
            PropertyId::X => &mut self.x,
            PropertyId::Y => &mut self.y,
            PropertyId::Width => &mut self.width,
            PropertyId::Height => &mut self.height,
            _ => return None,
        };
        Some(expect_measure(id, v.clone()).map(|m| *slot = m))
    }

    /// Translation into the parent and the resolved size
    fn resolve(&self, parent: &Viewport) -> Result<(DAffine2, DVec2), GeometryError> {
        let origin = parent
            .resolve_point(self.x, self.y)
            .ok_or(GeometryError::Unresolved)?;
        let w = parent
            .resolve_length(self.width, Axis::X)
            .ok_or(GeometryError::Unresolved)?;
        let h = parent
            .resolve_length(self.height, Axis::Y)
            .ok_or(GeometryError::Unresolved)?;
        Ok((DAffine2::from_translation(origin), dvec2(w, h)))
    }
}

fn has_area(env: &RenderEnv<'_>) -> bool {
    env.local
        .and_then(Viewport::extent)
        .is_some_and(|e| e.x > 0.0 && e.y > 0.0)
}

fn local_rect(env: &RenderEnv<'_>) -> Rect {
    env.local.and_then(Viewport::rect).unwrap_or(Rect::EMPTY)
}

fn out_of_range(property: PropertyId, reason: &str) -> PropertyError {
    PropertyError::OutOfRange { property, reason: reason.to_string() }
}

// ============================================================================
// Figure
// ============================================================================

/// The root of a model: a page-positioned box
#[derive(Clone, Debug, PartialEq)]
pub struct FigureNode {
    pub frame: BoxFrame,
    pub title: String,
}

impl Default for FigureNode {
    fn default() -> Self {
        FigureNode {
            frame: BoxFrame::new(
                Measure::inches(0.0),
                Measure::inches(0.0),
                defaults::FIGURE_WIDTH,
                defaults::FIGURE_HEIGHT,
            ),
            title: String::new(),
        }
    }
}

impl FigureNode {
    pub fn new(width: Measure, height: Measure) -> Self {
        let mut f = FigureNode::default();
        f.frame.width = width;
        f.frame.height = height;
        f
    }
}

impl NodeBehavior for FigureNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Figure
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::Title => Some(PropertyValue::Text(self.title.clone())),
            _ => self.frame.property(id),
        }
    }

    fn measure_constraints(&self, id: PropertyId) -> MeasureConstraints {
        BoxFrame::constraints(id).unwrap_or(MeasureConstraints::LOCATION)
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        if let Some(r) = self.frame.store(id, &value) {
            return r;
        }
        match (id, value) {
            (PropertyId::Title, PropertyValue::Text(t)) => {
                self.title = t;
                Ok(())
            }
            _ => Err(unsupported(self.kind(), id)),
        }
    }

    fn location(&self) -> Option<(Measure, Measure)> {
        Some((self.frame.x, self.frame.y))
    }

    fn placement(&self, parent: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        let (transform, size) = self.frame.resolve(parent)?;
        Ok(Placement { transform, viewport: Some(Viewport::new(size.x, size.y)) })
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        has_area(env) && (env.style.is_stroked() || env.style.is_filled())
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        DrawOp::paint(Outline::rect(local_rect(env)), env.style)
    }
}

// ============================================================================
// Cartesian graph
// ============================================================================

/// A 2D data graph with cartesian user coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub frame: BoxFrame,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub title: String,
}

impl Default for GraphNode {
    fn default() -> Self {
        GraphNode {
            frame: BoxFrame::new(
                defaults::GRAPH_X,
                defaults::GRAPH_Y,
                defaults::GRAPH_WIDTH,
                defaults::GRAPH_HEIGHT,
            ),
            x_range: (defaults::AXIS_START, defaults::AXIS_END),
            y_range: (defaults::AXIS_START, defaults::AXIS_END),
            title: String::new(),
        }
    }
}

impl GraphNode {
    pub fn new(frame: BoxFrame) -> Self {
        GraphNode { frame, ..Default::default() }
    }

    pub fn with_ranges(mut self, x: (f64, f64), y: (f64, f64)) -> Self {
        self.x_range = x;
        self.y_range = y;
        self
    }
}

impl NodeBehavior for GraphNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Graph
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::XMin => Some(self.x_range.0.into()),
            PropertyId::XMax => Some(self.x_range.1.into()),
            PropertyId::YMin => Some(self.y_range.0.into()),
            PropertyId::YMax => Some(self.y_range.1.into()),
            PropertyId::Title => Some(PropertyValue::Text(self.title.clone())),
            _ => self.frame.property(id),
        }
    }

    fn measure_constraints(&self, id: PropertyId) -> MeasureConstraints {
        BoxFrame::constraints(id).unwrap_or(MeasureConstraints::LOCATION)
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        if let Some(r) = self.frame.store(id, &value) {
            return r;
        }
        let (range, is_start) = match id {
            PropertyId::XMin => (&mut self.x_range, true),
            PropertyId::XMax => (&mut self.x_range, false),
            PropertyId::YMin => (&mut self.y_range, true),
            PropertyId::YMax => (&mut self.y_range, false),
            PropertyId::Title => {
                self.title = value.as_text().unwrap_or_default().to_string();
                return Ok(());
            }
            _ => return Err(unsupported(NodeKind::Graph, id)),
        };
        let v = expect_number(id, value)?;
        let other = if is_start { range.1 } else { range.0 };
        if v == other {
            return Err(out_of_range(id, "axis start and end must differ"));
        }
        if is_start {
            range.0 = v;
        } else {
            range.1 = v;
        }
        Ok(())
    }

    fn location(&self) -> Option<(Measure, Measure)> {
        Some((self.frame.x, self.frame.y))
    }

    fn placement(&self, parent: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        let (transform, size) = self.frame.resolve(parent)?;
        let viewport = Viewport::new(size.x, size.y).with_user(UserSpace::Cartesian {
            x: self.x_range,
            y: self.y_range,
        });
        Ok(Placement { transform, viewport: Some(viewport) })
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        has_area(env)
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        let r = local_rect(env);
        let mut ops = Vec::new();
        if env.style.is_filled() {
            ops.push(DrawOp::fill(Outline::rect(r), env.style));
        }
        if env.style.is_stroked() {
            let axes = Outline::polyline(&[dvec2(r.min.x, r.max.y), r.min, dvec2(r.max.x, r.min.y)]);
            ops.push(DrawOp::stroke(axes, env.style));
        }
        if !self.title.trim().is_empty() {
            let font = FontSpec::from_style(env.style);
            ops.push(DrawOp::Text(TextRun {
                text: self.title.clone(),
                at: dvec2(r.center().x, r.max.y + font.size * 0.5),
                font,
                color: env.style.stroke_color,
                anchor: TextAnchor::Middle,
            }));
        }
        ops.push(DrawOp::Clip(Outline::rect(r)));
        ops
    }
}

// ============================================================================
// Polar plot
// ============================================================================

/// A 2D data graph in polar coordinates: user x is theta, user y is radius
#[derive(Clone, Debug, PartialEq)]
pub struct PolarPlotNode {
    pub frame: BoxFrame,
    pub theta: (f64, f64),
    pub ref_angle: f64,
    pub clockwise: bool,
    pub radius: (f64, f64),
    pub reversed: bool,
}

impl Default for PolarPlotNode {
    fn default() -> Self {
        PolarPlotNode {
            frame: BoxFrame::new(
                defaults::GRAPH_X,
                defaults::GRAPH_Y,
                defaults::GRAPH_WIDTH,
                defaults::GRAPH_HEIGHT,
            ),
            theta: (defaults::THETA_MIN, defaults::THETA_MAX),
            ref_angle: 0.0,
            clockwise: false,
            radius: (defaults::RADIUS_MIN, defaults::RADIUS_MAX),
            reversed: false,
        }
    }
}

impl PolarPlotNode {
    pub fn new(frame: BoxFrame) -> Self {
        PolarPlotNode { frame, ..Default::default() }
    }

    pub fn with_theta(mut self, min: f64, max: f64) -> Self {
        self.theta = (min, max);
        self
    }

    pub fn axes(&self) -> PolarAxes {
        PolarAxes {
            theta: self.theta,
            ref_angle: self.ref_angle,
            clockwise: self.clockwise,
            radius: self.radius,
            reversed: self.reversed,
        }
    }

    fn check_theta(id: PropertyId, min: f64, max: f64) -> Result<(), PropertyError> {
        if min >= max {
            return Err(out_of_range(id, "theta start must be below theta end"));
        }
        if max - min > 360.0 {
            return Err(out_of_range(id, "theta range cannot exceed 360 degrees"));
        }
        Ok(())
    }
}

/// Outline of the laid-out polar sector (a full disc for a 360 degree span)
pub fn sector_outline(layout: &PolarLayout) -> Outline {
    if layout.is_full_circle() {
        Outline::new().arc(layout.origin, layout.radius, 0.0, 360.0).close()
    } else {
        Outline::new()
            .move_to(layout.origin)
            .arc(layout.origin, layout.radius, layout.start, layout.sweep)
            .close()
    }
}

impl NodeBehavior for PolarPlotNode {
    fn kind(&self) -> NodeKind {
        NodeKind::PolarPlot
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::ThetaMin => Some(self.theta.0.into()),
            PropertyId::ThetaMax => Some(self.theta.1.into()),
            PropertyId::ReferenceAngle => Some(self.ref_angle.into()),
            PropertyId::Clockwise => Some(self.clockwise.into()),
            PropertyId::RadiusMin => Some(self.radius.0.into()),
            PropertyId::RadiusMax => Some(self.radius.1.into()),
            PropertyId::RadiusReversed => Some(self.reversed.into()),
            _ => self.frame.property(id),
        }
    }

    fn measure_constraints(&self, id: PropertyId) -> MeasureConstraints {
        BoxFrame::constraints(id).unwrap_or(MeasureConstraints::LOCATION)
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        if let Some(r) = self.frame.store(id, &value) {
            return r;
        }
        match id {
            PropertyId::ThetaMin => {
                let v = expect_number(id, value)?;
                Self::check_theta(id, v, self.theta.1)?;
                self.theta.0 = v;
            }
            PropertyId::ThetaMax => {
                let v = expect_number(id, value)?;
                Self::check_theta(id, self.theta.0, v)?;
                self.theta.1 = v;
            }
            PropertyId::ReferenceAngle => {
                self.ref_angle = Angle(expect_number(id, value)?).normalized().degrees();
            }
            PropertyId::Clockwise => self.clockwise = expect_bool(id, value)?,
            PropertyId::RadiusMin | PropertyId::RadiusMax => {
                let v = expect_number(id, value)?;
                let other = if id == PropertyId::RadiusMin { self.radius.1 } else { self.radius.0 };
                if v == other {
                    return Err(out_of_range(id, "radius start and end must differ"));
                }
                if id == PropertyId::RadiusMin {
                    self.radius.0 = v;
                } else {
                    self.radius.1 = v;
                }
            }
            PropertyId::RadiusReversed => self.reversed = expect_bool(id, value)?,
            _ => return Err(unsupported(self.kind(), id)),
        }
        Ok(())
    }

    fn location(&self) -> Option<(Measure, Measure)> {
        Some((self.frame.x, self.frame.y))
    }

    fn placement(&self, parent: &Viewport, cache: &RenderCache) -> Result<Placement, GeometryError> {
        let (transform, size) = self.frame.resolve(parent)?;
        let axes = self.axes();
        let layout = cache.polar_layout(|| {
            let (start, sweep) = axes.sector();
            PolarLayout::compute(size.x, size.y, start, sweep)
        });
        let viewport =
            Viewport::new(size.x, size.y).with_user(UserSpace::Polar(PolarMapping { axes, layout }));
        Ok(Placement { transform, viewport: Some(viewport) })
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        has_area(env)
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        let Some(mapping) = env.local.and_then(Viewport::polar) else {
            return Vec::new();
        };
        let sector = sector_outline(&mapping.layout);
        let mut ops = DrawOp::paint(sector.clone(), env.style);
        ops.push(DrawOp::Clip(sector));
        ops
    }
}

// ============================================================================
// 3D graph and backplanes
// ============================================================================

/// The three backplanes of a 3D graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Plane {
    /// Floor
    XY,
    /// Back wall
    XZ,
    /// Side wall
    YZ,
}

/// A 3D graph drawn in oblique projection inside its 2D box
#[derive(Clone, Debug, PartialEq)]
pub struct Graph3DNode {
    pub frame: BoxFrame,
    pub depth: Measure,
    pub backdrop: Backdrop,
}

impl Default for Graph3DNode {
    fn default() -> Self {
        Graph3DNode {
            frame: BoxFrame::new(
                defaults::GRAPH_X,
                defaults::GRAPH_Y,
                defaults::GRAPH_WIDTH,
                defaults::GRAPH_HEIGHT,
            ),
            depth: defaults::GRAPH3D_DEPTH,
            backdrop: Backdrop::default(),
        }
    }
}

impl Graph3DNode {
    /// Projected direction and length of the depth axis
    pub fn depth_vector(&self) -> DVec2 {
        let depth = self.depth.to_mils().map_or(0.0, |m| m.0);
        unit_vector(defaults::DEPTH_ANGLE_DEG) * depth * defaults::DEPTH_SCALE
    }

    /// Corners of one backplane in the graph's frame, for a `size` box
    pub fn backplane_corners(&self, plane: Plane, size: DVec2) -> [DVec2; 4] {
        let dv = self.depth_vector();
        let face = (size - dv).max(DVec2::ZERO);
        match plane {
            Plane::XY => [DVec2::ZERO, dvec2(face.x, 0.0), dvec2(face.x, 0.0) + dv, dv],
            Plane::XZ => [dv, dv + dvec2(face.x, 0.0), dv + face, dv + dvec2(0.0, face.y)],
            Plane::YZ => [DVec2::ZERO, dv, dv + dvec2(0.0, face.y), dvec2(0.0, face.y)],
        }
    }

    /// Whether this graph's backdrop style shows `plane`
    pub fn shows_plane(&self, plane: Plane) -> bool {
        match self.backdrop {
            Backdrop::Box3D | Backdrop::OpenBox3D => true,
            Backdrop::XYPlane => plane == Plane::XY,
            Backdrop::Hidden | Backdrop::AxesBack => false,
        }
    }
}

impl NodeBehavior for Graph3DNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Graph3D
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::Depth => Some(self.depth.into()),
            PropertyId::Backdrop => Some(PropertyValue::Backdrop(self.backdrop)),
            _ => self.frame.property(id),
        }
    }

    fn measure_constraints(&self, id: PropertyId) -> MeasureConstraints {
        match id {
            PropertyId::Depth => MeasureConstraints::PHYSICAL_SIZE,
            _ => BoxFrame::constraints(id).unwrap_or(MeasureConstraints::LOCATION),
        }
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        if let Some(r) = self.frame.store(id, &value) {
            return r;
        }
        match id {
            PropertyId::Depth => self.depth = expect_measure(id, value)?,
            PropertyId::Backdrop => {
                self.backdrop = value.as_backdrop().ok_or(PropertyError::TypeMismatch {
                    property: id,
                    expected: "backdrop",
                })?
            }
            _ => return Err(unsupported(self.kind(), id)),
        }
        Ok(())
    }

    fn location(&self) -> Option<(Measure, Measure)> {
        Some((self.frame.x, self.frame.y))
    }

    fn placement(&self, parent: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        let (transform, size) = self.frame.resolve(parent)?;
        Ok(Placement { transform, viewport: Some(Viewport::new(size.x, size.y)) })
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        has_area(env) && env.style.is_stroked() && self.backdrop == Backdrop::AxesBack
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        let Some(size) = env.local.and_then(Viewport::extent) else {
            return Vec::new();
        };
        // The three edges meeting at the back-bottom-left corner
        let dv = self.depth_vector();
        let face = (size - dv).max(DVec2::ZERO);
        [dv + dvec2(face.x, 0.0), dv + dvec2(0.0, face.y), DVec2::ZERO]
            .into_iter()
            .map(|end| DrawOp::stroke(Outline::polyline(&[dv, end]), env.style))
            .collect()
    }
}

/// One backplane of a 3D graph; a component, never a user child
#[derive(Clone, Debug, PartialEq)]
pub struct BackplaneNode {
    pub plane: Plane,
}

impl BackplaneNode {
    pub fn new(plane: Plane) -> Self {
        BackplaneNode { plane }
    }

    fn owner<'a>(env: &RenderEnv<'a>) -> Option<&'a Graph3DNode> {
        match env.parent_data {
            Some(NodeData::Graph3D(g)) => Some(g),
            _ => None,
        }
    }
}

impl NodeBehavior for BackplaneNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Backplane
    }

    fn property(&self, _id: PropertyId) -> Option<PropertyValue> {
        None
    }

    fn store(&mut self, id: PropertyId, _value: PropertyValue) -> Result<(), PropertyError> {
        Err(unsupported(self.kind(), id))
    }

    fn placement(&self, _: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        Ok(Placement::in_parent())
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        let Some(owner) = Self::owner(env) else {
            return false;
        };
        let has_area = env.parent.extent().is_some_and(|e| e.x > 0.0 && e.y > 0.0);
        has_area
            && owner.shows_plane(self.plane)
            && (env.style.is_stroked() || env.style.is_filled())
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        let (Some(owner), Some(size)) = (Self::owner(env), env.parent.extent()) else {
            return Vec::new();
        };
        let corners = owner.backplane_corners(self.plane, size);
        DrawOp::paint(Outline::polygon(&corners), env.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ResolvedStyle;
    use crate::types::{Color, Mils};

    fn env_for<'a>(
        style: &'a ResolvedStyle,
        parent: &'a Viewport,
        parent_data: Option<&'a NodeData>,
    ) -> RenderEnv<'a> {
        RenderEnv { style, parent, local: None, parent_data }
    }

    #[test]
    fn backplane_visibility_follows_backdrop() {
        let parent = Viewport::new(3000.0, 2000.0);
        let style = ResolvedStyle::default();
        let xy = BackplaneNode::new(Plane::XY);
        let xz = BackplaneNode::new(Plane::XZ);

        for (backdrop, shows_xy, shows_xz) in [
            (Backdrop::Box3D, true, true),
            (Backdrop::OpenBox3D, true, true),
            (Backdrop::XYPlane, true, false),
            (Backdrop::AxesBack, false, false),
            (Backdrop::Hidden, false, false),
        ] {
            let data: NodeData = Graph3DNode { backdrop, ..Default::default() }.into();
            let env = env_for(&style, &parent, Some(&data));
            assert_eq!(xy.is_rendered(&env), shows_xy, "{backdrop}");
            assert_eq!(xz.is_rendered(&env), shows_xz, "{backdrop}");
        }
    }

    #[test]
    fn unpainted_backplane_is_not_rendered() {
        let parent = Viewport::new(3000.0, 2000.0);
        let style = ResolvedStyle {
            stroke_color: Color::TRANSPARENT,
            fill_color: Color::TRANSPARENT,
            ..Default::default()
        };
        let data: NodeData = Graph3DNode::default().into();
        let env = env_for(&style, &parent, Some(&data));
        assert!(!BackplaneNode::new(Plane::XY).is_rendered(&env));

        let zero_width = ResolvedStyle { stroke_width: Mils(0.0), ..Default::default() };
        let env = env_for(&zero_width, &parent, Some(&data));
        assert!(!BackplaneNode::new(Plane::XY).is_rendered(&env));
    }

    #[test]
    fn backplanes_share_the_back_corner() {
        let g = Graph3DNode::default();
        let size = dvec2(3000.0, 2000.0);
        let dv = g.depth_vector();
        assert!((dv.length() - 500.0).abs() < 1e-9);
        assert_eq!(g.backplane_corners(Plane::XY, size)[3], dv);
        assert_eq!(g.backplane_corners(Plane::XZ, size)[0], dv);
        assert_eq!(g.backplane_corners(Plane::YZ, size)[1], dv);
    }

    #[test]
    fn theta_range_is_validated() {
        let mut p = PolarPlotNode::default();
        assert!(p.store(PropertyId::ThetaMin, 360.0.into()).is_err());
        assert!(p.store(PropertyId::ThetaMin, (-10.0).into()).is_err());
        p.store(PropertyId::ThetaMax, 90.0.into()).unwrap();
        assert_eq!(p.axes().sector(), (0.0, 90.0));
        assert!(p.store(PropertyId::RadiusMin, 1.0.into()).is_err());
    }

    #[test]
    fn graph_axis_ends_must_differ() {
        let mut g = GraphNode::default();
        assert!(g.store(PropertyId::XMin, 10.0.into()).is_err());
        g.store(PropertyId::XMin, 20.0.into()).unwrap();
        assert_eq!(g.x_range, (20.0, 10.0));
    }
}
