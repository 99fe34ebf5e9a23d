//! Viewports and the transforms between node frames.
//!
//! A viewport is the rectangle a node offers its children, plus the user
//! coordinate system (cartesian or polar) its data is plotted in. Measures
//! declared on a child are resolved against the parent's viewport; the
//! inverse mapping turns a moved point back into the child's declared units.

use glam::{DAffine2, DVec2, dvec2};

use crate::errors::GeometryError;
use crate::measure::{Measure, Unit};
use crate::node::{NodeBehavior, NodeId, Placement};
use crate::tree::NodeTree;
use crate::types::{Mils, Rect};

/// Angular tolerance when deciding which quadrant points a sector reaches
const ANGLE_EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn pick(self, v: DVec2) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }
}

/// Unit vector at `deg` degrees, snapped so quadrant points are exact
pub fn unit_vector(deg: f64) -> DVec2 {
    let snap = |v: f64| {
        if v.abs() < 1e-12 {
            0.0
        } else if (v.abs() - 1.0).abs() < 1e-12 {
            v.signum()
        } else {
            v
        }
    };
    let (s, c) = deg.to_radians().sin_cos();
    dvec2(snap(c), snap(s))
}

// ============================================================================
// Polar layout
// ============================================================================

/// Where a polar sector sits inside its plot's box.
///
/// `start` and `sweep` are geometric angles in degrees, counter-clockwise
/// from the +x axis; the sector covers `start..start + sweep`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarLayout {
    pub origin: DVec2,
    pub radius: f64,
    pub start: f64,
    pub sweep: f64,
}

impl PolarLayout {
    /// Largest sector of the given span that fits a `width` x `height` box.
    ///
    /// A full circle is centered with radius `min(w, h) / 2`. A partial
    /// sector is sized by the bounding box of the points it can touch: the
    /// origin, both arc endpoints, and every axis crossing inside the sweep.
    pub fn compute(width: f64, height: f64, start: f64, sweep: f64) -> PolarLayout {
        let size = dvec2(width.max(0.0), height.max(0.0));
        if sweep >= 360.0 - ANGLE_EPS {
            return PolarLayout {
                origin: size * 0.5,
                radius: size.x.min(size.y) * 0.5,
                start,
                sweep: 360.0,
            };
        }
        let touch = Self::touch_bounds(start, sweep);
        let (bw, bh) = (touch.width(), touch.height());
        let scale = match (bw > 0.0, bh > 0.0) {
            (true, true) => (size.x / bw).min(size.y / bh),
            (true, false) => size.x / bw,
            (false, true) => size.y / bh,
            (false, false) => 0.0,
        };
        PolarLayout {
            origin: size * 0.5 - touch.center() * scale,
            radius: scale,
            start,
            sweep,
        }
    }

    /// Bounding box of a unit-radius sector
    fn touch_bounds(start: f64, sweep: f64) -> Rect {
        let mut r = Rect::EMPTY;
        r.expand_point(DVec2::ZERO);
        r.expand_point(unit_vector(start));
        r.expand_point(unit_vector(start + sweep));
        let first = ((start - ANGLE_EPS) / 90.0).ceil() as i64;
        let last = ((start + sweep + ANGLE_EPS) / 90.0).floor() as i64;
        for k in first..=last {
            r.expand_point(unit_vector(k as f64 * 90.0));
        }
        r
    }

    pub fn is_full_circle(&self) -> bool {
        self.sweep >= 360.0
    }

    /// Bounding box of the laid-out sector in the plot's frame
    pub fn sector_bounds(&self) -> Rect {
        if self.is_full_circle() {
            return Rect::from_corners(
                self.origin - DVec2::splat(self.radius),
                self.origin + DVec2::splat(self.radius),
            );
        }
        let t = Self::touch_bounds(self.start, self.sweep);
        Rect::from_corners(
            self.origin + t.min * self.radius,
            self.origin + t.max * self.radius,
        )
    }
}

/// The data axes of a polar plot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarAxes {
    /// Theta range in degrees, `min < max`
    pub theta: (f64, f64),
    /// Geometric angle of theta = 0
    pub ref_angle: f64,
    pub clockwise: bool,
    pub radius: (f64, f64),
    /// Radius increases toward the origin
    pub reversed: bool,
}

impl PolarAxes {
    /// The geometric sector covered by the theta range: `(start, sweep)`
    pub fn sector(&self) -> (f64, f64) {
        let sweep = (self.theta.1 - self.theta.0).clamp(0.0, 360.0);
        let start = if self.clockwise {
            self.ref_angle - self.theta.1
        } else {
            self.ref_angle + self.theta.0
        };
        (start, sweep)
    }

    /// Geometric angle of a theta value
    pub fn angle(&self, theta: f64) -> f64 {
        if self.clockwise { self.ref_angle - theta } else { self.ref_angle + theta }
    }

    fn theta_of(&self, angle: f64) -> f64 {
        let raw = if self.clockwise { self.ref_angle - angle } else { angle - self.ref_angle };
        self.theta.0 + (raw - self.theta.0).rem_euclid(360.0)
    }

    /// Fraction of the layout radius a radius value sits at
    pub fn fraction(&self, r: f64) -> f64 {
        let span = self.radius.1 - self.radius.0;
        if span == 0.0 {
            return 0.0;
        }
        let f = (r - self.radius.0) / span;
        if self.reversed { 1.0 - f } else { f }
    }

    fn radius_of(&self, fraction: f64) -> f64 {
        let f = if self.reversed { 1.0 - fraction } else { fraction };
        self.radius.0 + f * (self.radius.1 - self.radius.0)
    }
}

/// Polar axes bound to a concrete layout
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarMapping {
    pub axes: PolarAxes,
    pub layout: PolarLayout,
}

impl PolarMapping {
    /// Plot-frame point of `(theta, r)`
    pub fn point(&self, theta: f64, r: f64) -> DVec2 {
        self.layout.origin
            + unit_vector(self.axes.angle(theta)) * (self.axes.fraction(r) * self.layout.radius)
    }

    /// `(theta, r)` of a plot-frame point
    pub fn inverse(&self, p: DVec2) -> (f64, f64) {
        let v = p - self.layout.origin;
        let d = v.length();
        let fraction = if self.layout.radius > 0.0 { d / self.layout.radius } else { 0.0 };
        let theta = if d < 1e-12 {
            self.axes.theta.0
        } else {
            self.axes.theta_of(v.y.atan2(v.x).to_degrees())
        };
        (theta, self.axes.radius_of(fraction))
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// User coordinates a viewport offers to its plotted data
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UserSpace {
    None,
    Cartesian { x: (f64, f64), y: (f64, f64) },
    Polar(PolarMapping),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Local coordinates of the bottom-left corner
    origin: DVec2,
    /// `None` for the page, which cannot resolve percentages
    extent: Option<DVec2>,
    user: UserSpace,
}

impl Viewport {
    /// The unbounded page hosting the root figure
    pub fn page() -> Viewport {
        Viewport { origin: DVec2::ZERO, extent: None, user: UserSpace::None }
    }

    /// A `width` x `height` viewport with its bottom-left at the local origin
    pub fn new(width: f64, height: f64) -> Viewport {
        Viewport {
            origin: DVec2::ZERO,
            extent: Some(dvec2(width, height)),
            user: UserSpace::None,
        }
    }

    /// A `width` x `height` viewport centered on the local origin
    pub fn centered(width: f64, height: f64) -> Viewport {
        Viewport {
            origin: dvec2(-width / 2.0, -height / 2.0),
            ..Viewport::new(width, height)
        }
    }

    pub fn with_user(mut self, user: UserSpace) -> Viewport {
        self.user = user;
        self
    }

    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    pub fn extent(&self) -> Option<DVec2> {
        self.extent
    }

    pub fn rect(&self) -> Option<Rect> {
        self.extent.map(|e| Rect::from_corners(self.origin, self.origin + e))
    }

    pub fn user(&self) -> &UserSpace {
        &self.user
    }

    pub fn polar(&self) -> Option<&PolarMapping> {
        match &self.user {
            UserSpace::Polar(p) => Some(p),
            _ => None,
        }
    }

    fn coord(&self, m: Measure, axis: Axis) -> Option<f64> {
        let origin = axis.pick(self.origin);
        let extent = self.extent.map(|e| axis.pick(e));
        match m.unit {
            Unit::Pct => extent.map(|e| origin + m.value / 100.0 * e),
            Unit::User => {
                let (a, b) = self.cartesian_range(axis)?;
                Some(origin + (m.value - a) / (b - a) * extent?)
            }
            _ => m.to_mils().map(|len| origin + len.0),
        }
    }

    fn cartesian_range(&self, axis: Axis) -> Option<(f64, f64)> {
        match self.user {
            UserSpace::Cartesian { x, y } => {
                let (a, b) = if axis == Axis::X { x } else { y };
                (b != a).then_some((a, b))
            }
            _ => None,
        }
    }

    /// Local point of a declared location, `None` if a unit is unresolvable
    pub fn resolve_point(&self, x: Measure, y: Measure) -> Option<DVec2> {
        if let (Unit::User, Unit::User, UserSpace::Polar(p)) = (x.unit, y.unit, &self.user) {
            return Some(self.origin + p.point(x.value, y.value));
        }
        Some(dvec2(self.coord(x, Axis::X)?, self.coord(y, Axis::Y)?))
    }

    /// Local length of a declared extent along `axis`
    pub fn resolve_length(&self, m: Measure, axis: Axis) -> Option<f64> {
        match m.unit {
            Unit::Pct => self.extent.map(|e| axis.pick(e) * m.value / 100.0),
            Unit::User => {
                let (a, b) = self.cartesian_range(axis)?;
                Some(m.value / (b - a).abs() * axis.pick(self.extent?))
            }
            _ => m.to_mils().map(|len| len.0),
        }
    }

    /// Local point of a data point in this viewport's user coordinates
    pub fn user_point(&self, ux: f64, uy: f64) -> Option<DVec2> {
        self.resolve_point(Measure::user(ux), Measure::user(uy))
    }

    fn uncoord(&self, v: f64, axis: Axis, unit: Unit) -> Option<Measure> {
        let d = v - axis.pick(self.origin);
        match unit {
            Unit::Pct => {
                let e = axis.pick(self.extent?);
                (e > 0.0).then(|| Measure::pct(d / e * 100.0))
            }
            Unit::User => {
                let (a, b) = self.cartesian_range(axis)?;
                let e = axis.pick(self.extent?);
                (e > 0.0).then(|| Measure::user(a + d / e * (b - a)))
            }
            _ => Measure::from_mils(Mils(d), unit),
        }
    }

    /// Express a local point in the given units; inverse of [`Self::resolve_point`]
    pub fn unresolve_point(&self, p: DVec2, units: (Unit, Unit)) -> Option<(Measure, Measure)> {
        if let (Unit::User, Unit::User, UserSpace::Polar(m)) = (units.0, units.1, &self.user) {
            let (theta, r) = m.inverse(p - self.origin);
            return Some((Measure::user(theta), Measure::user(r)));
        }
        Some((self.uncoord(p.x, Axis::X, units.0)?, self.uncoord(p.y, Axis::Y, units.1)?))
    }
}

// ============================================================================
// Line frames
// ============================================================================

/// Frame of a line from `p0` to `p1`.
///
/// The line's viewport is an `L` x `L` square whose top edge is the line
/// itself: local `(0, L)` maps to `p0` and `(L, L)` to `p1`. Children placed
/// at `y = 100%` sit on the line.
pub fn line_placement(p0: DVec2, p1: DVec2) -> Result<Placement, GeometryError> {
    let d = p1 - p0;
    let len = d.length();
    if len < 1e-9 {
        return Err(GeometryError::ZeroLength);
    }
    let transform = DAffine2::from_translation(p0)
        * DAffine2::from_angle(d.y.atan2(d.x))
        * DAffine2::from_translation(dvec2(0.0, -len));
    Ok(Placement { transform, viewport: Some(Viewport::new(len, len)) })
}

/// Endpoints of a line of length `len` in its own frame
pub fn line_local_endpoints(len: f64) -> (DVec2, DVec2) {
    (dvec2(0.0, len), dvec2(len, len))
}

// ============================================================================
// Frames in the tree
// ============================================================================

/// A node's position in the frame hierarchy
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// The viewport the node's measures resolve against
    pub parent: Viewport,
    pub parent_to_global: DAffine2,
    pub placement: Placement,
}

impl Frame {
    pub fn local_to_global(&self) -> DAffine2 {
        self.parent_to_global * self.placement.transform
    }
}

impl NodeTree {
    /// The viewport `id` is placed in and its parent-to-page transform.
    /// Only ancestors are placed, so this holds even when `id` itself has
    /// no defined geometry.
    pub fn parent_frame(&self, id: NodeId) -> Result<(Viewport, DAffine2), GeometryError> {
        if !self.contains(id) {
            return Err(GeometryError::NoViewport);
        }
        let mut parent = Viewport::page();
        let mut parent_to_global = DAffine2::IDENTITY;
        for n in self.ancestors(id).into_iter().rev() {
            let node = self.get(n).ok_or(GeometryError::NoViewport)?;
            let placement = node.data.placement(&parent, &node.cache)?;
            parent_to_global = parent_to_global * placement.transform;
            parent = placement.viewport.ok_or(GeometryError::NoViewport)?;
        }
        Ok((parent, parent_to_global))
    }

    /// Walk from the root down to `id`, placing every node on the way
    pub fn frame(&self, id: NodeId) -> Result<Frame, GeometryError> {
        let (parent, parent_to_global) = self.parent_frame(id)?;
        let node = self.get(id).ok_or(GeometryError::NoViewport)?;
        let placement = node.data.placement(&parent, &node.cache)?;
        Ok(Frame { parent, parent_to_global, placement })
    }

    /// Node-local to parent-local; identity when the geometry is ill-defined
    pub fn local_to_parent(&self, id: NodeId) -> DAffine2 {
        self.frame(id)
            .map(|f| f.placement.transform)
            .unwrap_or(DAffine2::IDENTITY)
    }

    /// Node-local to root-parent (page) coordinates; identity when ill-defined
    pub fn local_to_global(&self, id: NodeId) -> DAffine2 {
        self.frame(id)
            .map(|f| f.local_to_global())
            .unwrap_or(DAffine2::IDENTITY)
    }

    /// The viewport a node offers its children
    pub fn viewport(&self, id: NodeId) -> Option<Viewport> {
        self.frame(id).ok().and_then(|f| f.placement.viewport)
    }

    /// New declared location for `id` after shifting it by a page-frame delta
    pub(crate) fn shifted_location(
        &self,
        id: NodeId,
        location: (Measure, Measure),
        delta: DVec2,
    ) -> Result<(Measure, Measure), GeometryError> {
        let (parent, to_parent) = self.parent_frame(id)?;
        if to_parent.matrix2.determinant().abs() < 1e-12 {
            return Err(GeometryError::NotInvertible);
        }
        let local_delta = to_parent.inverse().transform_vector2(delta);
        let p = parent
            .resolve_point(location.0, location.1)
            .ok_or(GeometryError::Unresolved)?;
        parent
            .unresolve_point(p + local_delta, (location.0.unit, location.1.unit))
            .ok_or(GeometryError::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_rect(w: f64, h: f64) -> Rect {
        Rect::from_xywh(0.0, 0.0, w, h)
    }

    fn assert_fits(layout: &PolarLayout, w: f64, h: f64) {
        let sector = layout.sector_bounds();
        assert!(box_rect(w, h).contains_rect(&sector, 1e-9), "{sector:?} outside {w}x{h}");
        let touches_x = (sector.width() - w).abs() < 1e-9;
        let touches_y = (sector.height() - h).abs() < 1e-9;
        assert!(touches_x || touches_y, "{sector:?} does not fill {w}x{h}");
        // Sampled arc stays inside too
        for i in 0..=64 {
            let a = layout.start + layout.sweep * i as f64 / 64.0;
            let p = layout.origin + unit_vector(a) * layout.radius;
            assert!(box_rect(w, h).contains_rect(&Rect::from_corners(p, p), 1e-9));
        }
    }

    #[test]
    fn full_circle_is_centered() {
        let l = PolarLayout::compute(400.0, 200.0, 0.0, 360.0);
        assert_eq!(l.origin, dvec2(200.0, 100.0));
        assert_eq!(l.radius, 100.0);
    }

    #[test]
    fn half_disc_fills_wide_box() {
        let l = PolarLayout::compute(400.0, 200.0, 0.0, 180.0);
        assert_eq!(l.radius, 200.0);
        assert_eq!(l.origin, dvec2(200.0, 0.0));
        assert_fits(&l, 400.0, 200.0);
    }

    #[test]
    fn quadrant_and_odd_sectors_fit() {
        for (start, sweep) in [
            (0.0, 90.0),
            (90.0, 90.0),
            (-45.0, 90.0),
            (10.0, 200.0),
            (270.0, 45.0),
            (30.0, 300.0),
            (-180.0, 5.0),
        ] {
            for (w, h) in [(300.0, 300.0), (500.0, 120.0), (80.0, 400.0)] {
                let l = PolarLayout::compute(w, h, start, sweep);
                assert_fits(&l, w, h);
            }
        }
    }

    #[test]
    fn exact_quadrant_boundaries_are_reached() {
        // A 0..90 sector touches (1,0) and (0,1) exactly
        let l = PolarLayout::compute(100.0, 100.0, 0.0, 90.0);
        assert_eq!(l.origin, DVec2::ZERO);
        assert_eq!(l.radius, 100.0);
    }

    #[test]
    fn polar_mapping_round_trips() {
        let axes = PolarAxes {
            theta: (0.0, 180.0),
            ref_angle: 90.0,
            clockwise: true,
            radius: (0.0, 10.0),
            reversed: false,
        };
        let (start, sweep) = axes.sector();
        assert_eq!((start, sweep), (-90.0, 180.0));
        let m = PolarMapping { axes, layout: PolarLayout::compute(200.0, 400.0, start, sweep) };
        // theta = 0 points straight up
        let top = m.point(0.0, 10.0);
        assert!((top - (m.layout.origin + dvec2(0.0, m.layout.radius))).length() < 1e-9);
        let (theta, r) = m.inverse(m.point(45.0, 5.0));
        assert!((theta - 45.0).abs() < 1e-9);
        assert!((r - 5.0).abs() < 1e-9);
    }

    #[test]
    fn reversed_radius_grows_inward() {
        let axes = PolarAxes {
            theta: (0.0, 360.0),
            ref_angle: 0.0,
            clockwise: false,
            radius: (0.0, 10.0),
            reversed: true,
        };
        assert_eq!(axes.fraction(10.0), 0.0);
        assert_eq!(axes.fraction(0.0), 1.0);
    }

    #[test]
    fn measures_resolve_against_viewport() {
        let vp = Viewport::new(2000.0, 1000.0)
            .with_user(UserSpace::Cartesian { x: (0.0, 10.0), y: (-1.0, 1.0) });
        let p = vp
            .resolve_point(Measure::pct(50.0), Measure::user(0.0))
            .unwrap();
        assert_eq!(p, dvec2(1000.0, 500.0));
        assert_eq!(vp.resolve_length(Measure::inches(0.5), Axis::X), Some(500.0));
        assert_eq!(vp.resolve_length(Measure::user(5.0), Axis::X), Some(1000.0));
        let back = vp
            .unresolve_point(dvec2(1500.0, 750.0), (Unit::User, Unit::Pct))
            .unwrap();
        assert_eq!(back, (Measure::user(7.5), Measure::pct(75.0)));
    }

    #[test]
    fn page_cannot_resolve_relative_units() {
        let page = Viewport::page();
        assert_eq!(page.resolve_point(Measure::pct(10.0), Measure::inches(1.0)), None);
        assert_eq!(
            page.resolve_point(Measure::inches(1.0), Measure::inches(2.0)),
            Some(dvec2(1000.0, 2000.0))
        );
    }

    #[test]
    fn line_frame_maps_viewport_top_edge_onto_line() {
        let p0 = dvec2(100.0, 100.0);
        let p1 = dvec2(100.0, 300.0);
        let placement = line_placement(p0, p1).unwrap();
        let (a, b) = line_local_endpoints(200.0);
        assert!((placement.transform.transform_point2(a) - p0).length() < 1e-9);
        assert!((placement.transform.transform_point2(b) - p1).length() < 1e-9);
        assert_eq!(line_placement(p0, p0), Err(GeometryError::ZeroLength));
    }
}
