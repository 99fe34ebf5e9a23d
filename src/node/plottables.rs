//! Data plotted in a graph's user coordinates: functions and tick sets.

use glam::{DVec2, dvec2};

use super::{
    NodeBehavior, NodeKind, Placement, RenderCache, RenderEnv, expect_number, unsupported,
};
use crate::defaults;
use crate::errors::{GeometryError, PropertyError};
use crate::formula::Formula;
use crate::measure::{Measure, MeasureConstraints};
use crate::property::{PropertyId, PropertyValue};
use crate::render::{DrawOp, Outline};
use crate::viewport::{UserSpace, Viewport};

// ============================================================================
// Function
// ============================================================================

/// `y = f(x)` sampled over `[x0, x1]` in steps of `dx`
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionNode {
    formula: Formula,
    pub x0: f64,
    pub x1: f64,
    pub dx: f64,
}

impl Default for FunctionNode {
    fn default() -> Self {
        FunctionNode {
            formula: Formula::identity(),
            x0: defaults::AXIS_START,
            x1: defaults::AXIS_END,
            dx: defaults::FUNCTION_DX,
        }
    }
}

impl FunctionNode {
    pub fn new(formula: Formula) -> Self {
        FunctionNode { formula, ..Default::default() }
    }

    pub fn with_domain(mut self, x0: f64, x1: f64, dx: f64) -> Self {
        self.x0 = x0;
        self.x1 = x1;
        self.dx = dx;
        self
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub(crate) fn set_formula(&mut self, formula: Formula) {
        self.formula = formula;
    }

    /// Sample abscissas, always ending exactly on `x1`
    pub fn sample_points(&self) -> Vec<f64> {
        if !(self.x1 > self.x0) || !(self.dx > 0.0) {
            return Vec::new();
        }
        let span = self.x1 - self.x0;
        let n = ((span / self.dx).ceil() as usize).clamp(1, defaults::MAX_FUNCTION_SAMPLES);
        let step = if n == defaults::MAX_FUNCTION_SAMPLES { span / n as f64 } else { self.dx };
        let mut xs: Vec<f64> = (0..n)
            .map(|i| self.x0 + i as f64 * step)
            .filter(|x| *x < self.x1)
            .collect();
        xs.push(self.x1);
        xs
    }

    /// Polylines in the parent viewport, broken where `f` is undefined
    fn polylines(&self, viewport: &Viewport) -> Vec<Vec<DVec2>> {
        let mut runs = Vec::new();
        let mut run: Vec<DVec2> = Vec::new();
        for x in self.sample_points() {
            let y = self.formula.eval(x);
            let p = y
                .is_finite()
                .then(|| viewport.user_point(x, y))
                .flatten()
                .filter(|p| p.is_finite());
            match p {
                Some(p) => run.push(p),
                None if run.len() > 1 => runs.push(std::mem::take(&mut run)),
                None => run.clear(),
            }
        }
        if run.len() > 1 {
            runs.push(run);
        }
        runs
    }
}

impl NodeBehavior for FunctionNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Function
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::X0 => Some(self.x0.into()),
            PropertyId::X1 => Some(self.x1.into()),
            PropertyId::Dx => Some(self.dx.into()),
            _ => None,
        }
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        let v = match id {
            PropertyId::X0 | PropertyId::X1 | PropertyId::Dx => expect_number(id, value)?,
            _ => return Err(unsupported(self.kind(), id)),
        };
        let out_of_range = |reason: &str| PropertyError::OutOfRange {
            property: id,
            reason: reason.to_string(),
        };
        match id {
            PropertyId::X0 if v >= self.x1 => return Err(out_of_range("x start must be below x end")),
            PropertyId::X1 if v <= self.x0 => return Err(out_of_range("x end must be above x start")),
            PropertyId::Dx if v <= 0.0 => return Err(out_of_range("x step must be positive")),
            PropertyId::X0 => self.x0 = v,
            PropertyId::X1 => self.x1 = v,
            _ => self.dx = v,
        }
        Ok(())
    }

    fn placement(&self, _: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        Ok(Placement::in_parent())
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        !matches!(env.parent.user(), UserSpace::None)
            && env.style.is_stroked()
            && !self.polylines(env.parent).is_empty()
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        self.polylines(env.parent)
            .iter()
            .map(|run| DrawOp::stroke(Outline::polyline(run), env.style))
            .collect()
    }
}

// ============================================================================
// Tick set
// ============================================================================

/// Tick marks along a graph's x axis.
///
/// While `track` is on, `start` and `end` follow the parent graph's x range.
#[derive(Clone, Debug, PartialEq)]
pub struct TickSetNode {
    pub(crate) track: bool,
    pub start: f64,
    pub end: f64,
    pub interval: f64,
    pub tick_len: Measure,
}

impl Default for TickSetNode {
    fn default() -> Self {
        TickSetNode {
            track: true,
            start: defaults::AXIS_START,
            end: defaults::AXIS_END,
            interval: defaults::TICK_INTERVAL,
            tick_len: defaults::TICK_LENGTH,
        }
    }
}

impl TickSetNode {
    pub fn new(start: f64, end: f64, interval: f64) -> Self {
        TickSetNode { track: false, start, end, interval, ..Default::default() }
    }

    pub fn tracks_parent_axis(&self) -> bool {
        self.track
    }

    /// Set the tracking flag and range together
    pub(crate) fn set_tracking(&mut self, track: bool, start: f64, end: f64) {
        self.track = track;
        self.start = start;
        self.end = end;
    }

    /// Tick values from the low end of the range up to the high end
    pub fn tick_values(&self) -> Vec<f64> {
        if !(self.interval > 0.0) {
            return Vec::new();
        }
        let (lo, hi) = if self.start <= self.end { (self.start, self.end) } else { (self.end, self.start) };
        let tol = self.interval * 1e-9;
        (0..defaults::MAX_TICKS)
            .map(|i| lo + i as f64 * self.interval)
            .take_while(|v| *v <= hi + tol)
            .collect()
    }
}

impl NodeBehavior for TickSetNode {
    fn kind(&self) -> NodeKind {
        NodeKind::TickSet
    }

    fn property(&self, id: PropertyId) -> Option<PropertyValue> {
        match id {
            PropertyId::Start => Some(self.start.into()),
            PropertyId::End => Some(self.end.into()),
            PropertyId::Interval => Some(self.interval.into()),
            PropertyId::TickLength => Some(self.tick_len.into()),
            _ => None,
        }
    }

    fn measure_constraints(&self, _id: PropertyId) -> MeasureConstraints {
        MeasureConstraints::STROKE
    }

    fn store(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        match id {
            PropertyId::Start => self.start = expect_number(id, value)?,
            PropertyId::End => self.end = expect_number(id, value)?,
            PropertyId::Interval => {
                let v = expect_number(id, value)?;
                if v <= 0.0 {
                    return Err(PropertyError::OutOfRange {
                        property: id,
                        reason: "tick interval must be positive".into(),
                    });
                }
                self.interval = v;
            }
            PropertyId::TickLength => {
                self.tick_len = value.as_measure().ok_or(PropertyError::TypeMismatch {
                    property: id,
                    expected: "measure",
                })?
            }
            _ => return Err(unsupported(self.kind(), id)),
        }
        Ok(())
    }

    fn placement(&self, _: &Viewport, _: &RenderCache) -> Result<Placement, GeometryError> {
        Ok(Placement::in_parent())
    }

    fn is_rendered(&self, env: &RenderEnv<'_>) -> bool {
        matches!(env.parent.user(), UserSpace::Cartesian { .. })
            && env.style.is_stroked()
            && !self.tick_values().is_empty()
    }

    fn display_list(&self, env: &RenderEnv<'_>) -> Vec<DrawOp> {
        let len = self.tick_len.to_mils().map_or(0.0, |m| m.0);
        let bottom = env.parent.origin().y;
        self.tick_values()
            .into_iter()
            .filter_map(|v| env.parent.user_point(v, 0.0).map(|p| p.x))
            .map(|x| {
                let tick = Outline::polyline(&[dvec2(x, bottom), dvec2(x, bottom - len)]);
                DrawOp::stroke(tick, env.style)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ResolvedStyle;

    #[test]
    fn samples_cover_domain() {
        let f = FunctionNode::default().with_domain(0.0, 1.0, 0.3);
        let xs = f.sample_points();
        assert_eq!(xs.first(), Some(&0.0));
        assert_eq!(xs.last(), Some(&1.0));
        assert_eq!(xs.len(), 5);
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn undefined_samples_break_the_curve() {
        let f = FunctionNode::new(Formula::parse("1 / x").unwrap()).with_domain(-1.0, 1.0, 0.5);
        let vp = Viewport::new(1000.0, 1000.0).with_user(UserSpace::Cartesian {
            x: (-1.0, 1.0),
            y: (-10.0, 10.0),
        });
        let style = ResolvedStyle::default();
        let env = RenderEnv { style: &style, parent: &vp, local: None, parent_data: None };
        assert!(f.is_rendered(&env));
        // x = 0 is infinite: two runs of two points each
        assert_eq!(f.display_list(&env).len(), 2);

        let nowhere = FunctionNode::new(Formula::parse("sqrt(x)").unwrap()).with_domain(-2.0, -1.0, 0.5);
        assert!(!nowhere.is_rendered(&env));
    }

    #[test]
    fn function_domain_is_validated() {
        let mut f = FunctionNode::default();
        assert!(f.store(PropertyId::X0, 10.0.into()).is_err());
        assert!(f.store(PropertyId::Dx, 0.0.into()).is_err());
        assert!(f.store(PropertyId::X1, 20.0.into()).is_ok());
        assert_eq!(f.x1, 20.0);
    }

    #[test]
    fn ticks_are_inclusive() {
        let t = TickSetNode::new(0.0, 1.0, 0.25);
        assert_eq!(t.tick_values(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        let reversed = TickSetNode::new(2.0, 0.0, 1.0);
        assert_eq!(reversed.tick_values(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn ticks_need_cartesian_parent() {
        let style = ResolvedStyle::default();
        let plain = Viewport::new(1000.0, 1000.0);
        let env = RenderEnv { style: &style, parent: &plain, local: None, parent_data: None };
        assert!(!TickSetNode::default().is_rendered(&env));
    }
}
