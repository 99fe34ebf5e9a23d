//! Stroke dash patterns.
//!
//! A pattern is a dash-gap array whose entries are in tenths of the stroke
//! width, so a pattern scales with the line it decorates. Equality is by
//! value: a pattern parsed from `"30 30"` is the same pattern as
//! [`StrokePattern::DASHED`].

use std::fmt;
use std::str::FromStr;

/// Most dash-gap entries a pattern may hold
pub const MAX_DASHES: usize = 6;

/// Largest single dash or gap entry
pub const MAX_DASH_LEN: u8 = 99;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StrokePattern {
    dashes: [u8; MAX_DASHES],
    len: u8,
}

/// The built-in patterns and the names they round-trip through
const NAMED: [(&str, StrokePattern); 5] = [
    ("solid", StrokePattern::SOLID),
    ("dotted", StrokePattern::DOTTED),
    ("dashed", StrokePattern::DASHED),
    ("dashdot", StrokePattern::DASHDOT),
    ("dashdotdot", StrokePattern::DASHDOTDOT),
];

impl StrokePattern {
    pub const SOLID: StrokePattern = StrokePattern::from_slice_const(&[]);
    pub const DOTTED: StrokePattern = StrokePattern::from_slice_const(&[10, 30]);
    pub const DASHED: StrokePattern = StrokePattern::from_slice_const(&[30, 30]);
    pub const DASHDOT: StrokePattern = StrokePattern::from_slice_const(&[30, 30, 10, 30]);
    pub const DASHDOTDOT: StrokePattern =
        StrokePattern::from_slice_const(&[30, 30, 10, 30, 10, 30]);

    const fn from_slice_const(src: &[u8]) -> StrokePattern {
        let mut dashes = [0u8; MAX_DASHES];
        let mut i = 0;
        while i < src.len() {
            dashes[i] = src[i];
            i += 1;
        }
        StrokePattern { dashes, len: src.len() as u8 }
    }

    /// Build a custom pattern.
    ///
    /// The array must be empty (solid) or hold an even number of entries
    /// (dash-gap pairs), at most [`MAX_DASHES`], each in `1..=MAX_DASH_LEN`.
    pub fn custom(dashes: &[u8]) -> Option<StrokePattern> {
        let valid = dashes.len() <= MAX_DASHES
            && dashes.len() % 2 == 0
            && dashes.iter().all(|&d| (1..=MAX_DASH_LEN).contains(&d));
        valid.then(|| StrokePattern::from_slice_const(dashes))
    }

    pub fn dashes(&self) -> &[u8] {
        &self.dashes[..self.len as usize]
    }

    pub fn is_solid(&self) -> bool {
        self.len == 0
    }

    /// Name of the built-in pattern with the same dash array, if any
    pub fn name(&self) -> Option<&'static str> {
        NAMED.iter().find(|(_, p)| p == self).map(|(n, _)| *n)
    }

    /// Dash array in absolute lengths for a stroke of `stroke_width`
    pub fn dash_array(&self, stroke_width: f64) -> Vec<f64> {
        self.dashes()
            .iter()
            .map(|&d| d as f64 * stroke_width / 10.0)
            .collect()
    }
}

impl Default for StrokePattern {
    fn default() -> Self {
        Self::SOLID
    }
}

impl fmt::Display for StrokePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return f.write_str(name);
        }
        let parts: Vec<String> = self.dashes().iter().map(|d| d.to_string()).collect();
        f.write_str(&parts.join(" "))
    }
}

impl FromStr for StrokePattern {
    type Err = String;

    /// Accepts a built-in name or a whitespace/comma separated dash array
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((_, p)) = NAMED.iter().find(|(n, _)| n.eq_ignore_ascii_case(s)) {
            return Ok(*p);
        }
        let dashes = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| format!("bad stroke pattern: {s:?}"))?;
        StrokePattern::custom(&dashes).ok_or_else(|| format!("bad stroke pattern: {s:?}"))
    }
}
