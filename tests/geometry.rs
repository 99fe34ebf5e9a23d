use figcore::node::BoxFrame;
use figcore::viewport::line_local_endpoints;
use figcore::{
    GraphicModel, LabelNode, LineNode, Measure, PolarLayout, PolarPlotNode, PropertyId, Rect,
};
use glam::{DVec2, dvec2};

const EPS: f64 = 1e-6;

fn close(a: DVec2, b: DVec2) -> bool {
    (a - b).length() < EPS
}

fn mils(v: f64) -> Measure {
    Measure::inches(v / 1000.0)
}

#[test]
fn line_viewport_puts_the_segment_on_its_top_edge() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let line = model
        .insert(root, LineNode::new((mils(0.0), mils(0.0)), (mils(100.0), mils(0.0))))
        .unwrap();
    let tree = model.tree();

    let viewport = tree.viewport(line).unwrap();
    assert_eq!(viewport.extent(), Some(dvec2(100.0, 100.0)));
    let (start, end) = line_local_endpoints(100.0);
    assert_eq!((start, end), (dvec2(0.0, 100.0), dvec2(100.0, 100.0)));
    let to_parent = tree.local_to_parent(line);
    assert!(close(to_parent.transform_point2(start), dvec2(0.0, 0.0)));
    assert!(close(to_parent.transform_point2(end), dvec2(100.0, 0.0)));

    let marker = model
        .insert(line, LabelNode::new(Measure::pct(50.0), Measure::pct(100.0), "mid"))
        .unwrap();
    let tree = model.tree();
    let midpoint = tree.local_to_global(root).transform_point2(dvec2(50.0, 0.0));
    assert!(close(tree.local_to_global(marker).transform_point2(DVec2::ZERO), midpoint));
}

#[test]
fn zero_length_line_falls_back_to_identity() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let line = model
        .insert(root, LineNode::new((mils(500.0), mils(500.0)), (mils(500.0), mils(500.0))))
        .unwrap();
    let tree = model.tree();
    assert_eq!(tree.local_to_parent(line), glam::DAffine2::IDENTITY);
    assert_eq!(tree.viewport(line), None);
    assert_eq!(tree.global_bounds(line), None);
}

fn polar_plot(model: &mut GraphicModel, w: f64, h: f64) -> figcore::NodeId {
    let root = model.root();
    let frame = BoxFrame::new(mils(500.0), mils(500.0), mils(w), mils(h));
    model.insert(root, PolarPlotNode::new(frame)).unwrap()
}

fn layout(model: &GraphicModel, id: figcore::NodeId) -> PolarLayout {
    model.tree().viewport(id).unwrap().polar().unwrap().layout
}

#[test]
fn full_circle_centers_regardless_of_direction() {
    let mut model = GraphicModel::default();
    let plot = polar_plot(&mut model, 3000.0, 2000.0);
    for (ref_angle, clockwise, reversed) in [(0.0, false, false), (90.0, true, false), (215.0, true, true)] {
        model.set_property_value(plot, PropertyId::ReferenceAngle, Some(ref_angle.into()));
        model.set_property_value(plot, PropertyId::Clockwise, Some(clockwise.into()));
        model.set_property_value(plot, PropertyId::RadiusReversed, Some(reversed.into()));
        let l = layout(&model, plot);
        assert!(close(l.origin, dvec2(1500.0, 1000.0)));
        assert!((l.radius - 1000.0).abs() < EPS);
    }
}

#[test]
fn partial_sectors_fit_tightly_after_every_edit() {
    let mut model = GraphicModel::default();
    let plot = polar_plot(&mut model, 3000.0, 2000.0);
    let bounds = Rect::from_xywh(0.0, 0.0, 3000.0, 2000.0);
    for span in [90.0, 180.0, 270.0] {
        for clockwise in [false, true] {
            for reversed in [false, true] {
                for ref_angle in [0.0, 45.0, 90.0] {
                    model.set_property_value(plot, PropertyId::ThetaMin, Some(0.0.into()));
                    model.set_property_value(plot, PropertyId::ThetaMax, Some(span.into()));
                    model.set_property_value(plot, PropertyId::Clockwise, Some(clockwise.into()));
                    model.set_property_value(plot, PropertyId::RadiusReversed, Some(reversed.into()));
                    model.set_property_value(plot, PropertyId::ReferenceAngle, Some(ref_angle.into()));

                    let l = layout(&model, plot);
                    assert_eq!(l.sweep, span, "stale layout for {span} {clockwise} {reversed}");
                    let sector = l.sector_bounds();
                    assert!(bounds.contains_rect(&sector, EPS), "{sector:?} escapes");
                    let touches = (sector.width() - 3000.0).abs() < EPS
                        || (sector.height() - 2000.0).abs() < EPS;
                    assert!(touches, "{sector:?} is not tight");
                }
            }
        }
    }
}

#[test]
fn resizing_the_plot_recomputes_its_layout() {
    let mut model = GraphicModel::default();
    let plot = polar_plot(&mut model, 3000.0, 2000.0);
    assert!(model.set_property_value(plot, PropertyId::Width, Some(mils(1000.0).into())));
    let l = layout(&model, plot);
    assert!((l.radius - 500.0).abs() < EPS);
    assert!(model.undo());
    assert!((layout(&model, plot).radius - 1000.0).abs() < EPS);
}
