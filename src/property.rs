//! The property catalog: identifiers, value types and change descriptions.

use std::fmt;
use std::str::FromStr;

use crate::measure::Measure;
use crate::node::NodeKind;
use crate::stroke::StrokePattern;
use crate::types::Color;

/// The type a property's values must have
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Measure,
    Number,
    Text,
    Bool,
    Color,
    FontStyle,
    Stroke,
    Backdrop,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Measure => "measure",
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Bool => "boolean",
            ValueType::Color => "color",
            ValueType::FontStyle => "font style",
            ValueType::Stroke => "stroke pattern",
            ValueType::Backdrop => "backdrop",
        }
    }
}

macro_rules! property_catalog {
    ($($id:ident => $tag:literal, $name:literal, $ty:ident;)*) => {
        /// Every property a node can carry
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PropertyId {
            $($id,)*
        }

        impl PropertyId {
            pub const ALL: &'static [PropertyId] = &[$(PropertyId::$id,)*];

            /// Key used in style documents
            pub fn tag(self) -> &'static str {
                match self {
                    $(PropertyId::$id => $tag,)*
                }
            }

            /// Human-readable name used in edit descriptions
            pub fn display_name(self) -> &'static str {
                match self {
                    $(PropertyId::$id => $name,)*
                }
            }

            pub fn value_type(self) -> ValueType {
                match self {
                    $(PropertyId::$id => ValueType::$ty,)*
                }
            }

            pub fn from_tag(tag: &str) -> Option<PropertyId> {
                match tag {
                    $($tag => Some(PropertyId::$id),)*
                    _ => None,
                }
            }
        }
    };
}

property_catalog! {
    X => "x", "x", Measure;
    Y => "y", "y", Measure;
    X2 => "x2", "x2", Measure;
    Y2 => "y2", "y2", Measure;
    Width => "width", "width", Measure;
    Height => "height", "height", Measure;
    Depth => "depth", "depth", Measure;
    Rotate => "rotate", "rotation", Number;
    Title => "title", "title", Text;
    XMin => "xmin", "x-axis start", Number;
    XMax => "xmax", "x-axis end", Number;
    YMin => "ymin", "y-axis start", Number;
    YMax => "ymax", "y-axis end", Number;
    ThetaMin => "theta_min", "theta start", Number;
    ThetaMax => "theta_max", "theta end", Number;
    ReferenceAngle => "ref_angle", "reference angle", Number;
    Clockwise => "clockwise", "clockwise", Bool;
    RadiusMin => "r_min", "radius start", Number;
    RadiusMax => "r_max", "radius end", Number;
    RadiusReversed => "r_reversed", "radius reversed", Bool;
    Backdrop => "backdrop", "backdrop", Backdrop;
    X0 => "x0", "x start", Number;
    X1 => "x1", "x end", Number;
    Dx => "dx", "x step", Number;
    Start => "start", "tick start", Number;
    End => "end", "tick end", Number;
    Interval => "interval", "tick interval", Number;
    TickLength => "tick_len", "tick length", Measure;
    FontFamily => "font_family", "font family", Text;
    FontStyle => "font_style", "font style", FontStyle;
    FontSize => "font_size", "font size", Number;
    StrokeColor => "stroke_color", "stroke color", Color;
    StrokeWidth => "stroke_width", "stroke width", Measure;
    StrokePattern => "stroke_pattern", "stroke pattern", Stroke;
    FillColor => "fill_color", "fill color", Color;
}

impl PropertyId {
    /// Style properties live in the shared, inheritable style block
    pub fn is_style(self) -> bool {
        matches!(
            self,
            PropertyId::FontFamily
                | PropertyId::FontStyle
                | PropertyId::FontSize
                | PropertyId::StrokeColor
                | PropertyId::StrokeWidth
                | PropertyId::StrokePattern
                | PropertyId::FillColor
        )
    }

    /// Only style properties may be set to "inherited"
    pub fn is_inheritable(self) -> bool {
        self.is_style()
    }

    /// Changes to these can alter text layout anywhere below the node
    pub fn is_font(self) -> bool {
        matches!(
            self,
            PropertyId::FontFamily | PropertyId::FontStyle | PropertyId::FontSize
        )
    }

    pub const STYLE: &'static [PropertyId] = &[
        PropertyId::FontFamily,
        PropertyId::FontStyle,
        PropertyId::FontSize,
        PropertyId::StrokeColor,
        PropertyId::StrokeWidth,
        PropertyId::StrokePattern,
        PropertyId::FillColor,
    ];
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Font style variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Plain,
    Italic,
    Bold,
    BoldItalic,
}

impl FontStyle {
    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontStyle::Plain => "plain",
            FontStyle::Italic => "italic",
            FontStyle::Bold => "bold",
            FontStyle::BoldItalic => "bolditalic",
        })
    }
}

impl FromStr for FontStyle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "plain" => Ok(FontStyle::Plain),
            "italic" => Ok(FontStyle::Italic),
            "bold" => Ok(FontStyle::Bold),
            "bolditalic" => Ok(FontStyle::BoldItalic),
            other => Err(format!("bad font style: {other:?}")),
        }
    }
}

/// How a 3D graph draws the box around its data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Backdrop {
    Hidden,
    #[default]
    Box3D,
    OpenBox3D,
    AxesBack,
    /// Only the XY backplane
    XYPlane,
}

impl fmt::Display for Backdrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backdrop::Hidden => "hidden",
            Backdrop::Box3D => "box3d",
            Backdrop::OpenBox3D => "openbox3d",
            Backdrop::AxesBack => "axesback",
            Backdrop::XYPlane => "xyplane",
        })
    }
}

impl FromStr for Backdrop {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hidden" => Ok(Backdrop::Hidden),
            "box3d" => Ok(Backdrop::Box3D),
            "openbox3d" => Ok(Backdrop::OpenBox3D),
            "axesback" => Ok(Backdrop::AxesBack),
            "xyplane" => Ok(Backdrop::XYPlane),
            other => Err(format!("bad backdrop: {other:?}")),
        }
    }
}

/// A property value
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Measure(Measure),
    Number(f64),
    Text(String),
    Bool(bool),
    Color(Color),
    FontStyle(FontStyle),
    Stroke(StrokePattern),
    Backdrop(Backdrop),
}

impl PropertyValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::Measure(_) => ValueType::Measure,
            PropertyValue::Number(_) => ValueType::Number,
            PropertyValue::Text(_) => ValueType::Text,
            PropertyValue::Bool(_) => ValueType::Bool,
            PropertyValue::Color(_) => ValueType::Color,
            PropertyValue::FontStyle(_) => ValueType::FontStyle,
            PropertyValue::Stroke(_) => ValueType::Stroke,
            PropertyValue::Backdrop(_) => ValueType::Backdrop,
        }
    }

    pub fn as_measure(&self) -> Option<Measure> {
        match self {
            PropertyValue::Measure(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_font_style(&self) -> Option<FontStyle> {
        match self {
            PropertyValue::FontStyle(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_stroke(&self) -> Option<StrokePattern> {
        match self {
            PropertyValue::Stroke(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_backdrop(&self) -> Option<Backdrop> {
        match self {
            PropertyValue::Backdrop(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Measure(m) => write!(f, "{m}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Text(s) => write!(f, "{s}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Color(c) => write!(f, "{c}"),
            PropertyValue::FontStyle(s) => write!(f, "{s}"),
            PropertyValue::Stroke(p) => write!(f, "{p}"),
            PropertyValue::Backdrop(b) => write!(f, "{b}"),
        }
    }
}

impl From<Measure> for PropertyValue {
    fn from(m: Measure) -> Self {
        PropertyValue::Measure(m)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<Color> for PropertyValue {
    fn from(c: Color) -> Self {
        PropertyValue::Color(c)
    }
}

impl From<StrokePattern> for PropertyValue {
    fn from(p: StrokePattern) -> Self {
        PropertyValue::Stroke(p)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

/// Format one side of a change for a description string
pub fn format_value(property: PropertyId, value: Option<&PropertyValue>) -> String {
    match (property, value) {
        (_, None) => "inherited".to_string(),
        (PropertyId::FontSize, Some(PropertyValue::Number(n))) => format!("{n}pt"),
        (_, Some(v)) => v.to_string(),
    }
}

/// `Change {property} from {old} to {new} on {kind}`
pub fn describe_change(
    kind: NodeKind,
    property: PropertyId,
    old: Option<&PropertyValue>,
    new: Option<&PropertyValue>,
) -> String {
    format!(
        "Change {} from {} to {} on {}",
        property.display_name(),
        format_value(property, old),
        format_value(property, new),
        kind
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for &id in PropertyId::ALL {
            assert_eq!(PropertyId::from_tag(id.tag()), Some(id));
        }
        assert_eq!(PropertyId::from_tag("nope"), None);
    }

    #[test]
    fn only_style_properties_inherit() {
        for &id in PropertyId::ALL {
            assert_eq!(id.is_inheritable(), PropertyId::STYLE.contains(&id));
        }
    }

    #[test]
    fn color_description() {
        let s = describe_change(
            NodeKind::Line,
            PropertyId::StrokeColor,
            Some(&Color::BLACK.into()),
            Some(&Color::rgba(255, 0, 0, 128).into()),
        );
        assert_eq!(
            s,
            "Change stroke color from (0,0,0) to (255,0,0) alpha=128 on line"
        );
    }

    #[test]
    fn font_size_description() {
        let s = describe_change(
            NodeKind::Label,
            PropertyId::FontSize,
            Some(&PropertyValue::Number(12.0)),
            None,
        );
        assert_eq!(s, "Change font size from 12pt to inherited on label");
    }

    #[test]
    fn measure_description() {
        let s = describe_change(
            NodeKind::Shape,
            PropertyId::Width,
            Some(&Measure::inches(1.0).into()),
            Some(&Measure::pct(50.0).into()),
        );
        assert_eq!(s, "Change width from 1in to 50% on shape");
    }
}
