//! Measures: numeric quantities tagged with a unit.
//!
//! Physical units convert straight to milli-inches. Percentages and user
//! units are relative and can only be resolved by a parent viewport.

use std::fmt;
use std::str::FromStr;

use crate::types::Mils;

/// Units a measure can be declared in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    In,
    Cm,
    Mm,
    Pt,
    /// Percentage of the parent viewport's extent
    Pct,
    /// Data units of the parent's user coordinate system
    User,
}

impl Unit {
    /// Milli-inches per unit, `None` for relative units
    pub fn mils_per_unit(self) -> Option<f64> {
        match self {
            Unit::In => Some(1000.0),
            Unit::Cm => Some(1000.0 / 2.54),
            Unit::Mm => Some(100.0 / 2.54),
            Unit::Pt => Some(1000.0 / 72.0),
            Unit::Pct | Unit::User => None,
        }
    }

    pub fn is_physical(self) -> bool {
        self.mils_per_unit().is_some()
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::Pt => "pt",
            Unit::Pct => "%",
            Unit::User => "",
        }
    }
}

/// A number and its unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measure {
    pub value: f64,
    pub unit: Unit,
}

impl Measure {
    pub const fn new(value: f64, unit: Unit) -> Self {
        Measure { value, unit }
    }

    pub const fn inches(value: f64) -> Self {
        Self::new(value, Unit::In)
    }

    pub const fn pct(value: f64) -> Self {
        Self::new(value, Unit::Pct)
    }

    pub const fn user(value: f64) -> Self {
        Self::new(value, Unit::User)
    }

    pub const fn pt(value: f64) -> Self {
        Self::new(value, Unit::Pt)
    }

    /// Physical length in milli-inches, `None` for relative units
    pub fn to_mils(self) -> Option<Mils> {
        self.unit.mils_per_unit().map(|k| Mils(self.value * k))
    }

    /// Express a physical length in `unit`; relative units are not supported
    pub fn from_mils(len: Mils, unit: Unit) -> Option<Measure> {
        unit.mils_per_unit().map(|k| Measure::new(len.0 / k, unit))
    }

    pub fn is_relative(self) -> bool {
        !self.unit.is_physical()
    }

    /// Same unit, value multiplied by `factor`
    pub fn scaled(self, factor: f64) -> Measure {
        Measure::new(self.value * factor, self.unit)
    }

    /// Same unit, value shifted by `delta`
    pub fn offset(self, delta: f64) -> Measure {
        Measure::new(self.value + delta, self.unit)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (num, unit) = [
            ("in", Unit::In),
            ("cm", Unit::Cm),
            ("mm", Unit::Mm),
            ("pt", Unit::Pt),
            ("%", Unit::Pct),
        ]
        .into_iter()
        .find_map(|(suffix, unit)| s.strip_suffix(suffix).map(|n| (n, unit)))
        .unwrap_or((s, Unit::User));
        let value: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("bad measure: {s:?}"))?;
        if !value.is_finite() {
            return Err(format!("bad measure: {s:?}"));
        }
        Ok(Measure::new(value, unit))
    }
}

/// Limits a node places on one of its measured properties
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureConstraints {
    /// Smallest physical length allowed
    pub min: Mils,
    /// Largest physical length allowed
    pub max: Mils,
    pub allow_relative: bool,
    pub allow_user: bool,
    /// Fractional digits kept after constraining
    pub max_frac_digits: u8,
}

impl MeasureConstraints {
    /// Node locations: any unit, generous range
    pub const LOCATION: MeasureConstraints = MeasureConstraints {
        min: Mils(-100_000.0),
        max: Mils(100_000.0),
        allow_relative: true,
        allow_user: true,
        max_frac_digits: 3,
    };

    /// Extents of boxes inside another node
    pub const SIZE: MeasureConstraints = MeasureConstraints {
        min: Mils(0.0),
        max: Mils(100_000.0),
        allow_relative: true,
        allow_user: false,
        max_frac_digits: 3,
    };

    /// Extents that must be physical (the figure page box, 3D depth)
    pub const PHYSICAL_SIZE: MeasureConstraints = MeasureConstraints {
        min: Mils(0.0),
        max: Mils(100_000.0),
        allow_relative: false,
        allow_user: false,
        max_frac_digits: 3,
    };

    /// Stroke widths and tick lengths
    pub const STROKE: MeasureConstraints = MeasureConstraints {
        min: Mils(0.0),
        max: Mils(1000.0),
        allow_relative: false,
        allow_user: false,
        max_frac_digits: 3,
    };

    pub fn accepts_unit(&self, unit: Unit) -> bool {
        match unit {
            Unit::Pct => self.allow_relative,
            Unit::User => self.allow_user,
            _ => true,
        }
    }

    /// Bring `m` inside these limits, or `None` if its unit is not allowed.
    ///
    /// Physical values are clamped to `[min, max]` and rounded to
    /// `max_frac_digits` in their own unit; relative values are only rounded.
    pub fn constrain(&self, m: Measure) -> Option<Measure> {
        if !self.accepts_unit(m.unit) || !m.value.is_finite() {
            return None;
        }
        let mut value = m.value;
        if let Some(k) = m.unit.mils_per_unit() {
            value = value.clamp(self.min.0 / k, self.max.0 / k);
        }
        let p = 10f64.powi(self.max_frac_digits as i32);
        value = (value * p).round() / p;
        Some(Measure::new(value, m.unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_units_convert_to_mils() {
        assert_eq!(Measure::inches(1.5).to_mils(), Some(Mils(1500.0)));
        assert_eq!(Measure::pt(72.0).to_mils(), Some(Mils(1000.0)));
        let cm = Measure::new(2.54, Unit::Cm).to_mils().unwrap();
        assert!((cm.0 - 1000.0).abs() < 1e-9);
        assert_eq!(Measure::pct(50.0).to_mils(), None);
        assert_eq!(Measure::user(3.0).to_mils(), None);
    }

    #[test]
    fn from_mils_is_inverse() {
        let m = Measure::from_mils(Mils(250.0), Unit::In).unwrap();
        assert_eq!(m, Measure::inches(0.25));
        assert_eq!(Measure::from_mils(Mils(1.0), Unit::Pct), None);
    }

    #[test]
    fn parse_and_display() {
        for text in ["1.5in", "2cm", "10mm", "12pt", "50%", "-3.25"] {
            let m: Measure = text.parse().unwrap();
            assert_eq!(m.to_string(), text);
        }
        assert!("abc".parse::<Measure>().is_err());
        assert!("in".parse::<Measure>().is_err());
    }

    #[test]
    fn constrain_clamps_and_rounds() {
        let c = MeasureConstraints::STROKE;
        assert_eq!(c.constrain(Measure::inches(2.0)), Some(Measure::inches(1.0)));
        assert_eq!(c.constrain(Measure::inches(-1.0)), Some(Measure::inches(0.0)));
        assert_eq!(c.constrain(Measure::pct(10.0)), None);
        assert_eq!(
            MeasureConstraints::LOCATION.constrain(Measure::pct(12.34567)),
            Some(Measure::pct(12.346))
        );
        assert_eq!(MeasureConstraints::SIZE.constrain(Measure::user(1.0)), None);
    }
}
