use figcore::{
    Color, FullRender, GraphicModel, Measure, Mils, PolarPlotNode, PropertyId, PsOptions, Rect,
    RenderError, RenderOptions, RenderTask, ShapeNode,
};

fn model_with_square(fill: Color) -> GraphicModel {
    let mut model = GraphicModel::default();
    let root = model.root();
    let square = model
        .insert(
            root,
            ShapeNode::new((Measure::inches(3.0), Measure::inches(2.0)), Measure::inches(1.0), Measure::inches(1.0)),
        )
        .unwrap();
    assert!(model.set_property_value(square, PropertyId::FillColor, Some(fill.into())));
    model
}

#[test]
fn eps_header_and_trailer() {
    let model = model_with_square(Color::rgb(255, 0, 0));
    let options = PsOptions { title: "demo".into(), bounding_box_margin: Mils(100.0) };
    let ps = model.to_postscript(&options).unwrap();

    let header: Vec<&str> = ps.lines().take(9).collect();
    insta::assert_snapshot!(header.join("\n"), @r"
    %!PS-Adobe-3.0 EPSF-3.0
    %%BoundingBox: 0 0 447 303
    %%HiResBoundingBox: 0 0 446.4 302.4
    %%Title: demo
    %%Creator: figcore
    %%EndComments
    gsave
    0.072 0.072 scale
    100 100 translate
    ");
    assert!(ps.ends_with("grestore\nshowpage\n%%EOF\n"));
    assert!(ps.contains("1 0 0 setrgbcolor\n"));
    assert!(ps.contains("\nfill\n"));
}

#[test]
fn transparent_paint_is_left_out_of_postscript() {
    let model = model_with_square(Color::TRANSPARENT);
    let ps = model.to_postscript(&PsOptions::default()).unwrap();
    assert!(!ps.contains("\nfill\n"));
    assert_eq!(ps.matches("gsave").count(), ps.matches("grestore").count());
}

#[test]
fn polar_plot_clips_its_children_in_postscript() {
    let mut model = GraphicModel::default();
    let root = model.root();
    let plot = model.insert(root, PolarPlotNode::default().with_theta(0.0, 90.0)).unwrap();
    model
        .insert(plot, ShapeNode::new((Measure::pct(50.0), Measure::pct(50.0)), Measure::pct(200.0), Measure::pct(200.0)))
        .unwrap();
    let ps = model.to_postscript(&PsOptions::default()).unwrap();
    let clip = ps.find("\nclip\n").expect("sector clip");
    // The child is drawn after the clip is installed
    assert!(ps[clip..].contains("stroke"));
    assert!(ps.contains(" arc\n"));
}

#[test]
fn raster_paints_filled_square() {
    let model = model_with_square(Color::rgb(255, 0, 0));
    let pixmap = model.render_raster(&RenderOptions::default(), &mut FullRender).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (576, 384));
    let center = pixmap.pixel(288, 192).unwrap();
    assert_eq!((center.red(), center.green(), center.blue(), center.alpha()), (255, 0, 0, 255));
    let corner = pixmap.pixel(100, 100).unwrap();
    assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));
}

#[test]
fn raster_honors_an_explicit_page_region() {
    let model = model_with_square(Color::rgb(0, 0, 255));
    let options = RenderOptions {
        dpi: 100.0,
        page_size: Some(Rect::from_xywh(2500.0, 1500.0, 1000.0, 1000.0)),
        ..RenderOptions::default()
    };
    let pixmap = model.render_raster(&options, &mut FullRender).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (100, 100));
    let center = pixmap.pixel(50, 50).unwrap();
    assert_eq!((center.red(), center.green(), center.blue()), (0, 0, 255));
}

/// Gives up after a fixed number of nodes
struct Budget(usize);

impl RenderTask for Budget {
    fn update_progress(&mut self) -> bool {
        self.0 = self.0.saturating_sub(1);
        self.0 > 0
    }
}

#[test]
fn cancelled_render_reports_it() {
    let model = model_with_square(Color::rgb(255, 0, 0));
    let err = model.render_raster(&RenderOptions::default(), &mut Budget(1)).unwrap_err();
    assert_eq!(err, RenderError::Cancelled);
    assert!(model.render_raster(&RenderOptions::default(), &mut Budget(10)).is_ok());
}
