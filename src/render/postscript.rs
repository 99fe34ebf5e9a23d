//! Encapsulated PostScript output
//!
//! Coordinates are written in milli-inches; the prolog scales by 0.072 to
//! reach PostScript points.

use std::fmt::Write;

use glam::DAffine2;

use super::display::{DrawOp, Outline, PathSeg, StrokeStyle, TextAnchor, TextRun};
use super::{RenderTask, Surface, render_tree};
use crate::defaults;
use crate::errors::RenderError;
use crate::property::FontStyle;
use crate::tree::NodeTree;
use crate::types::{Color, Mils};

/// PostScript output settings
#[derive(Clone, Debug, PartialEq)]
pub struct PsOptions {
    pub title: String,
    /// White space added around the figure on every side
    pub bounding_box_margin: Mils,
}

impl Default for PsOptions {
    fn default() -> Self {
        PsOptions { title: String::new(), bounding_box_margin: defaults::PS_MARGIN }
    }
}

/// A [`Surface`] that writes PostScript operators
#[derive(Debug, Default)]
pub struct PsWriter {
    out: String,
}

impl PsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, s: &str) {
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn path(&mut self, outline: &Outline) {
        self.line("newpath");
        for seg in outline.segments() {
            let s = match *seg {
                PathSeg::MoveTo(p) => format!("{} {} moveto", fmt_num(p.x), fmt_num(p.y)),
                PathSeg::LineTo(p) => format!("{} {} lineto", fmt_num(p.x), fmt_num(p.y)),
                PathSeg::CubicTo(a, b, c) => format!(
                    "{} {} {} {} {} {} curveto",
                    fmt_num(a.x),
                    fmt_num(a.y),
                    fmt_num(b.x),
                    fmt_num(b.y),
                    fmt_num(c.x),
                    fmt_num(c.y)
                ),
                PathSeg::Arc { center, radius, start, sweep } => format!(
                    "{} {} {} {} {} {}",
                    fmt_num(center.x),
                    fmt_num(center.y),
                    fmt_num(radius),
                    fmt_num(start),
                    fmt_num(start + sweep),
                    if sweep < 0.0 { "arcn" } else { "arc" }
                ),
                PathSeg::Close => "closepath".to_string(),
            };
            self.line(&s);
        }
    }

    fn color(&mut self, c: Color) {
        let (r, g, b) = c.unit_rgb();
        self.line(&format!("{} {} {} setrgbcolor", fmt_num(r), fmt_num(g), fmt_num(b)));
    }

    fn stroke_params(&mut self, style: &StrokeStyle) {
        self.color(style.color);
        self.line(&format!("{} setlinewidth", fmt_num(style.width)));
        let dashes: Vec<String> = style.dashes.iter().map(|&d| fmt_num(d)).collect();
        self.line(&format!("[{}] 0 setdash", dashes.join(" ")));
    }

    fn text(&mut self, run: &TextRun) {
        self.color(run.color);
        self.line(&format!(
            "/{} findfont {} scalefont setfont",
            font_name(&run.font.family, run.font.style),
            fmt_num(run.font.size)
        ));
        self.line(&format!("{} {} moveto", fmt_num(run.at.x), fmt_num(run.at.y)));
        let s = escape(&run.text);
        match run.anchor {
            TextAnchor::Start => self.line(&format!("{s} show")),
            TextAnchor::Middle => {
                self.line(&format!("{s} dup stringwidth pop 2 div neg 0 rmoveto show"))
            }
        }
    }
}

impl Surface for PsWriter {
    fn save(&mut self) {
        self.line("gsave");
    }

    fn restore(&mut self) {
        self.line("grestore");
    }

    fn concat(&mut self, t: DAffine2) {
        if t == DAffine2::IDENTITY {
            return;
        }
        let m = t.matrix2;
        let d = t.translation;
        self.line(&format!(
            "[{} {} {} {} {} {}] concat",
            fmt_num(m.x_axis.x),
            fmt_num(m.x_axis.y),
            fmt_num(m.y_axis.x),
            fmt_num(m.y_axis.y),
            fmt_num(d.x),
            fmt_num(d.y)
        ));
    }

    fn draw(&mut self, ops: &[DrawOp]) {
        for op in ops {
            match op {
                // PostScript has no alpha; only fully transparent paint is dropped
                DrawOp::Fill { path, color } => {
                    if color.is_transparent() || path.is_empty() {
                        continue;
                    }
                    self.color(*color);
                    self.path(path);
                    self.line("fill");
                }
                DrawOp::Stroke { path, style } => {
                    if style.color.is_transparent() || style.width <= 0.0 || path.is_empty() {
                        continue;
                    }
                    self.stroke_params(style);
                    self.path(path);
                    self.line("stroke");
                }
                DrawOp::Text(run) => {
                    if !run.color.is_transparent() && !run.text.is_empty() {
                        self.text(run);
                    }
                }
                DrawOp::Clip(outline) => {
                    self.path(outline);
                    self.line("clip");
                }
            }
        }
    }
}

/// Standard PostScript font name for a family and style
fn font_name(family: &str, style: FontStyle) -> String {
    let (base, bold, italic, both) = match family.to_ascii_lowercase().as_str() {
        "helvetica" | "arial" | "sansserif" | "sans-serif" => {
            ("Helvetica", "Helvetica-Bold", "Helvetica-Oblique", "Helvetica-BoldOblique")
        }
        "times" | "times new roman" | "serif" => {
            ("Times-Roman", "Times-Bold", "Times-Italic", "Times-BoldItalic")
        }
        "courier" | "monospaced" | "monospace" => {
            ("Courier", "Courier-Bold", "Courier-Oblique", "Courier-BoldOblique")
        }
        _ => {
            let base: String = family.chars().filter(|c| !c.is_whitespace()).collect();
            return match style {
                FontStyle::Plain => base,
                FontStyle::Bold => format!("{base}-Bold"),
                FontStyle::Italic => format!("{base}-Italic"),
                FontStyle::BoldItalic => format!("{base}-BoldItalic"),
            };
        }
    };
    match style {
        FontStyle::Plain => base,
        FontStyle::Bold => bold,
        FontStyle::Italic => italic,
        FontStyle::BoldItalic => both,
    }
    .to_string()
}

/// A PostScript string literal
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            // Latin-1 as octal escapes; anything wider has no glyph in the standard fonts
            _ => {
                let code = if (c as u32) < 256 { c as u32 } else { '?' as u32 };
                let _ = write!(out, "\\{code:03o}");
            }
        }
    }
    out.push(')');
    out
}

/// Format a number with 6 significant figures, trailing zeros trimmed
pub(crate) fn fmt_num(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10_f64.powi(5 - magnitude);
    let rounded = (value * scale).round() / scale;
    let decimals = (5 - magnitude).max(0) as usize;
    let s = format!("{:.prec$}", rounded, prec = decimals);
    let s = if s.contains('.') { s.trim_end_matches('0').trim_end_matches('.') } else { &s };
    match s {
        "-0" => "0".to_string(),
        s => s.to_string(),
    }
}

/// Render the whole tree as an EPS document
pub fn to_postscript(
    tree: &NodeTree,
    options: &PsOptions,
    task: &mut dyn RenderTask,
) -> Result<String, RenderError> {
    let page = tree.page_rect().ok_or(RenderError::NoRoot)?;
    let margin = options.bounding_box_margin.0.max(0.0);
    let width_pt = (page.width() + 2.0 * margin) * 72.0 / 1000.0;
    let height_pt = (page.height() + 2.0 * margin) * 72.0 / 1000.0;

    let mut ps = PsWriter::new();
    ps.line("%!PS-Adobe-3.0 EPSF-3.0");
    ps.line(&format!(
        "%%BoundingBox: 0 0 {} {}",
        width_pt.ceil() as i64,
        height_pt.ceil() as i64
    ));
    ps.line(&format!(
        "%%HiResBoundingBox: 0 0 {} {}",
        fmt_num(width_pt),
        fmt_num(height_pt)
    ));
    if !options.title.is_empty() {
        ps.line(&format!("%%Title: {}", options.title));
    }
    ps.line("%%Creator: figcore");
    ps.line("%%EndComments");
    ps.line("gsave");
    ps.line("0.072 0.072 scale");
    ps.line(&format!(
        "{} {} translate",
        fmt_num(margin - page.min.x),
        fmt_num(margin - page.min.y)
    ));
    ps.line("1 setlinejoin 1 setlinecap");
    render_tree(tree, &mut ps, task)?;
    ps.line("grestore");
    ps.line("showpage");
    ps.line("%%EOF");
    Ok(ps.finish())
}
