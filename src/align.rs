//! Aligning several nodes on a common edge or centre line.

use std::fmt;

use glam::{DVec2, dvec2};

use crate::edit::MultiEdit;
use crate::model::GraphicModel;
use crate::node::NodeId;
use crate::types::Rect;

/// Shifts smaller than this (milli-inches) count as already aligned
const ALIGN_EPSILON: f64 = 1e-6;

/// The line nodes are aligned on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locus {
    Left,
    Right,
    Top,
    Bottom,
    /// Common vertical centre line
    HCenter,
    /// Common horizontal centre line
    VCenter,
}

impl Locus {
    /// Where this locus lies on `r`, along its axis
    fn coordinate(self, r: &Rect) -> f64 {
        match self {
            Locus::Left => r.min.x,
            Locus::Right => r.max.x,
            Locus::Top => r.max.y,
            Locus::Bottom => r.min.y,
            Locus::HCenter => r.center().x,
            Locus::VCenter => r.center().y,
        }
    }

    /// Page shift that puts `r`'s locus on `target`
    fn delta(self, r: &Rect, target: f64) -> DVec2 {
        let d = target - self.coordinate(r);
        match self {
            Locus::Left | Locus::Right | Locus::HCenter => dvec2(d, 0.0),
            Locus::Top | Locus::Bottom | Locus::VCenter => dvec2(0.0, d),
        }
    }

    /// Target for a group: the outermost edge, or the centre of the union
    fn target(self, union: &Rect) -> f64 {
        self.coordinate(union)
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locus::Left => "left",
            Locus::Right => "right",
            Locus::Top => "top",
            Locus::Bottom => "bottom",
            Locus::HCenter => "center",
            Locus::VCenter => "middle",
        })
    }
}

impl GraphicModel {
    /// Align `ids` on `locus` as one edit.
    ///
    /// Nodes without page bounds or with a degenerate frame are skipped.
    /// Returns `false` when nothing moved.
    pub fn align(&mut self, ids: &[NodeId], locus: Locus) -> bool {
        let boxes: Vec<(NodeId, Rect)> = ids
            .iter()
            .filter_map(|&id| Some((id, self.tree().global_bounds(id)?)))
            .collect();
        let union = boxes.iter().fold(Rect::EMPTY, |acc, (_, r)| acc.union(r));
        if union.is_empty() {
            return false;
        }
        let target = locus.target(&union);

        let mut multi = MultiEdit::new();
        for (id, r) in &boxes {
            let delta = locus.delta(r, target);
            if delta.length() < ALIGN_EPSILON {
                continue;
            }
            multi.extend(self.move_changes(*id, delta));
        }
        self.commit_multi(format!("Align {locus}"), multi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Measure;
    use crate::node::ShapeNode;

    fn shape(x: f64, y: f64, size: f64) -> ShapeNode {
        ShapeNode::new(
            (Measure::inches(x), Measure::inches(y)),
            Measure::inches(size),
            Measure::inches(size),
        )
    }

    #[test]
    fn left_edges_line_up() {
        let mut model = GraphicModel::default();
        let root = model.root();
        let a = model.insert(root, shape(1.0, 1.0, 0.5)).unwrap();
        let b = model.insert(root, shape(3.0, 2.0, 1.0)).unwrap();
        assert!(model.align(&[a, b], Locus::Left));
        let (ra, rb) = (
            model.tree().global_bounds(a).unwrap(),
            model.tree().global_bounds(b).unwrap(),
        );
        assert!((ra.min.x - rb.min.x).abs() < 1e-6);
        assert!(!model.align(&[a, b], Locus::Left));
        assert_eq!(model.history().len(), 1);
    }

    #[test]
    fn centers_meet_on_union_center() {
        let mut model = GraphicModel::default();
        let root = model.root();
        let a = model.insert(root, shape(1.0, 1.0, 0.5)).unwrap();
        let b = model.insert(root, shape(1.0, 3.0, 0.5)).unwrap();
        assert!(model.align(&[a, b], Locus::VCenter));
        let ca = model.tree().global_bounds(a).unwrap().center();
        let cb = model.tree().global_bounds(b).unwrap().center();
        assert!((ca.y - 2000.0).abs() < 1e-6);
        assert!((cb.y - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn empty_selection_moves_nothing() {
        let mut model = GraphicModel::default();
        assert!(!model.align(&[], Locus::Top));
    }
}
