use std::cell::RefCell;
use std::rc::Rc;

use figcore::{
    ChangeKind, Color, DefaultCodec, GraphicModel, LabelNode, LineEnd, LineNode, Locus, Measure,
    ModelListener, NodeId, PropertyId, PropertyValue, ShapeNode, StrokePattern, StyleDocument,
    StyleSet,
};
use glam::dvec2;

#[derive(Default)]
struct Log(RefCell<Vec<(NodeId, ChangeKind)>>);

impl ModelListener for Log {
    fn on_change(&self, node: NodeId, change: ChangeKind) {
        self.0.borrow_mut().push((node, change));
    }
}

/// `RUST_LOG=figcore=debug cargo test --features tracing` shows why edits fail
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn inches(x: f64, y: f64) -> (Measure, Measure) {
    (Measure::inches(x), Measure::inches(y))
}

fn revision(model: &GraphicModel, id: NodeId) -> u64 {
    model.tree().get(id).unwrap().cache().revision()
}

#[test]
fn property_edit_round_trips_and_invalidates_once_per_apply() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let label = model
        .insert(root, LabelNode::new(Measure::inches(1.0), Measure::inches(1.0), "before"))
        .unwrap();

    assert!(model.set_property_value(label, PropertyId::Title, Some("after".into())));
    let r0 = revision(&model, label);
    assert!(model.undo());
    assert_eq!(revision(&model, label), r0 + 1);
    assert_eq!(
        model.get_property_value(label, PropertyId::Title).unwrap(),
        Some(PropertyValue::Text("before".into()))
    );
    assert!(model.redo());
    assert_eq!(revision(&model, label), r0 + 2);
    assert_eq!(
        model.get_property_value(label, PropertyId::Title).unwrap(),
        Some(PropertyValue::Text("after".into()))
    );
}

#[test]
fn writing_the_current_value_changes_nothing() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let shape = model
        .insert(root, ShapeNode::new(inches(1.0, 1.0), Measure::inches(1.0), Measure::inches(1.0)))
        .unwrap();
    let log = Rc::new(Log::default());
    model.add_listener(log.clone());
    let r0 = revision(&model, shape);

    assert!(!model.set_property_value(shape, PropertyId::Width, Some(Measure::inches(1.0).into())));
    assert!(!model.set_property_value(shape, PropertyId::Width, Some(Measure::user(1.0).into())));
    assert!(model.history().is_empty());
    assert_eq!(revision(&model, shape), r0);
    assert!(log.0.borrow().is_empty());
}

#[test]
fn line_move_is_one_atomic_edit() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let line = model.insert(root, LineNode::new(inches(1.0, 1.0), inches(2.0, 1.5))).unwrap();
    let before = model.tree().get(line).unwrap().cache().revision();

    assert!(model.move_node(line, dvec2(500.0, -250.0)));
    assert_eq!(model.history().len(), 1);
    assert_eq!(model.undo_description(), Some("Move line"));
    let endpoint = |model: &GraphicModel, p| model.get_property_value(line, p).unwrap();
    assert_eq!(endpoint(&model, PropertyId::X), Some(Measure::inches(1.5).into()));
    assert_eq!(endpoint(&model, PropertyId::Y), Some(Measure::inches(0.75).into()));
    assert_eq!(endpoint(&model, PropertyId::X2), Some(Measure::inches(2.5).into()));
    assert_eq!(endpoint(&model, PropertyId::Y2), Some(Measure::inches(1.25).into()));
    // Both endpoints land in a single invalidation
    assert_eq!(model.tree().get(line).unwrap().cache().revision(), before + 1);

    assert!(model.undo());
    assert_eq!(endpoint(&model, PropertyId::X), Some(Measure::inches(1.0).into()));
    assert_eq!(endpoint(&model, PropertyId::Y2), Some(Measure::inches(1.5).into()));
    assert!(!model.can_undo());
}

#[test]
fn endpoint_drag_onto_the_other_end_keeps_the_line_unrendered() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let line = model.insert(root, LineNode::new(inches(1.0, 1.0), inches(2.0, 1.0))).unwrap();
    assert!(model.move_line_endpoint(line, LineEnd::End, dvec2(-1000.0, 0.0)));
    assert_eq!(model.tree().global_bounds(line), None);
    assert!(model.undo());
    assert!(model.tree().global_bounds(line).is_some());
}

#[test]
fn collapsed_line_can_be_dragged_back_out() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let line = model.insert(root, LineNode::new(inches(1.0, 1.0), inches(2.0, 1.0))).unwrap();
    assert!(model.move_line_endpoint(line, LineEnd::End, dvec2(-1000.0, 0.0)));
    assert_eq!(model.tree().global_bounds(line), None);
    assert!(model.move_line_endpoint(line, LineEnd::End, dvec2(1000.0, 0.0)));
    assert!(model.tree().global_bounds(line).is_some());

    assert!(model.move_line_endpoint(line, LineEnd::End, dvec2(-1000.0, 0.0)));
    assert!(model.move_node(line, dvec2(500.0, 0.0)));
    assert_eq!(
        model.get_property_value(line, PropertyId::X2).unwrap(),
        Some(Measure::inches(1.5).into())
    );
}

#[test]
fn failed_undo_of_a_group_move_keeps_the_survivors_moved() {
    init_tracing();
    let mut model = GraphicModel::default();
    let root = model.root();
    let a = model.insert(root, LabelNode::new(Measure::inches(1.0), Measure::inches(1.0), "a")).unwrap();
    let b = model.insert(root, LabelNode::new(Measure::inches(2.0), Measure::inches(1.0), "b")).unwrap();
    assert!(model.move_nodes(&[a, b], dvec2(1000.0, 0.0)));
    assert!(model.remove(a));
    assert!(!model.undo());
    assert_eq!(
        model.get_property_value(b, PropertyId::X).unwrap(),
        Some(Measure::inches(3.0).into())
    );
    assert!(!model.can_undo());
    assert!(!model.can_redo());
}

#[test]
fn undo_of_a_removed_node_fails_and_drops_redo() {
    init_tracing();
    let mut model = GraphicModel::default();
    let root = model.root();
    let label = model
        .insert(root, LabelNode::new(Measure::inches(1.0), Measure::inches(1.0), "gone"))
        .unwrap();
    assert!(model.set_property_value(label, PropertyId::Title, Some("soon".into())));
    assert!(model.remove(label));
    assert!(!model.undo());
    assert!(!model.can_undo());
    assert!(!model.can_redo());
}

#[test]
fn broadcast_over_selection_is_one_multi_edit() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let a = model.insert(root, LabelNode::new(Measure::inches(1.0), Measure::inches(1.0), "a")).unwrap();
    let b = model.insert(root, LabelNode::new(Measure::inches(2.0), Measure::inches(1.0), "b")).unwrap();
    model.select(&[a, b]);
    let log = Rc::new(Log::default());
    model.add_listener(log.clone());

    let red: PropertyValue = Color::rgb(255, 0, 0).into();
    assert!(model.set_property_value(a, PropertyId::StrokeColor, Some(red.clone())));
    assert_eq!(model.history().len(), 1);
    assert_eq!(*log.0.borrow(), vec![(root, ChangeKind::Reload)]);
    for id in [a, b] {
        assert_eq!(model.get_property_value(id, PropertyId::StrokeColor).unwrap(), Some(red.clone()));
    }

    assert!(model.undo());
    for id in [a, b] {
        assert_eq!(model.get_property_value(id, PropertyId::StrokeColor).unwrap(), None);
    }
}

#[test]
fn aligning_twice_changes_nothing_the_second_time() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let ids: Vec<NodeId> = [(1.0, 0.5), (2.5, 1.0), (4.0, 2.0)]
        .into_iter()
        .map(|(x, size)| {
            model
                .insert(root, ShapeNode::new(inches(x, x), Measure::inches(size), Measure::inches(size)))
                .unwrap()
        })
        .collect();

    for locus in [Locus::Right, Locus::Bottom, Locus::HCenter] {
        assert!(model.align(&ids, locus), "{locus} moved nothing");
        assert!(!model.align(&ids, locus), "{locus} is not idempotent");
    }
    assert_eq!(model.history().len(), 3);
}

#[test]
fn style_document_survives_json() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let shape = model
        .insert(root, ShapeNode::new(inches(1.0, 1.0), Measure::inches(1.0), Measure::inches(1.0)))
        .unwrap();
    model.set_property_value(shape, PropertyId::StrokePattern, Some(StrokePattern::DASHDOT.into()));
    model.set_property_value(shape, PropertyId::FillColor, Some(Color::rgba(0, 128, 255, 200).into()));

    let set = model.capture_style(shape).unwrap();
    let json = serde_json::to_string(&set.to_document(&DefaultCodec).unwrap()).unwrap();
    let doc: StyleDocument = serde_json::from_str(&json).unwrap();
    let back = StyleSet::from_document(&doc, &DefaultCodec).unwrap();
    assert_eq!(back, set);

    let other = model
        .insert(root, ShapeNode::new(inches(3.0, 1.0), Measure::inches(1.0), Measure::inches(1.0)))
        .unwrap();
    assert!(model.apply_style_set(other, &back));
    assert_eq!(
        model.get_property_value(other, PropertyId::StrokePattern).unwrap(),
        Some(StrokePattern::DASHDOT.into())
    );
    assert!(model.undo());
    assert_eq!(model.get_property_value(other, PropertyId::StrokePattern).unwrap(), None);
}

#[test]
fn parsed_dash_pattern_equals_named_constant() {
    let parsed: StrokePattern = "30 30".parse().unwrap();
    assert_eq!(parsed, StrokePattern::DASHED);
    assert_eq!(parsed.to_string(), "dashed");
}
