//! Default sizes and settings (lengths in milli-inches)

use crate::measure::Measure;
use crate::types::Mils;

// Root style
pub const FONT_FAMILY: &str = "Helvetica";
/// Points
pub const FONT_SIZE: f64 = 12.0;
pub const MIN_FONT_SIZE: f64 = 1.0;
pub const MAX_FONT_SIZE: f64 = 99.0;
pub const STROKE_WIDTH: Mils = Mils(10.0);

// Figure (page box)
pub const FIGURE_WIDTH: Measure = Measure::inches(6.0);
pub const FIGURE_HEIGHT: Measure = Measure::inches(4.0);

// Data containers inside a figure
pub const GRAPH_X: Measure = Measure::pct(15.0);
pub const GRAPH_Y: Measure = Measure::pct(15.0);
pub const GRAPH_WIDTH: Measure = Measure::pct(70.0);
pub const GRAPH_HEIGHT: Measure = Measure::pct(70.0);
pub const AXIS_START: f64 = 0.0;
pub const AXIS_END: f64 = 10.0;
pub const GRAPH3D_DEPTH: Measure = Measure::inches(1.0);

/// Oblique projection of the 3D depth axis
pub const DEPTH_ANGLE_DEG: f64 = 30.0;
pub const DEPTH_SCALE: f64 = 0.5;

// Polar plots
pub const THETA_MIN: f64 = 0.0;
pub const THETA_MAX: f64 = 360.0;
pub const RADIUS_MIN: f64 = 0.0;
pub const RADIUS_MAX: f64 = 1.0;

// Primitives
pub const LABEL_TEXT: &str = "label";
pub const SHAPE_SIZE: Measure = Measure::inches(0.5);
pub const TICK_LENGTH: Measure = Measure::inches(0.06);
pub const TICK_INTERVAL: f64 = 1.0;
pub const FUNCTION_DX: f64 = 0.1;

/// Most samples a function node evaluates in one pass
pub const MAX_FUNCTION_SAMPLES: usize = 10_000;
/// Most ticks a tick set draws
pub const MAX_TICKS: usize = 1_000;

/// Average glyph advance as a fraction of the font size
pub const CHAR_WIDTH: f64 = 0.6;

// Editing
pub const HISTORY_CAPACITY: usize = 100;

// Output
pub const DPI: f64 = 96.0;
pub const PS_MARGIN: Mils = Mils(0.0);
