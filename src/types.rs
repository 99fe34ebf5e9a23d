//! Strongly-typed numeric primitives (zero-cost newtypes).
//!
//! All physical geometry is carried in milli-inches ([`Mils`]); raw `f64`
//! coordinates only appear inside `glam` vectors once a value has been
//! resolved into some node's local frame.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use glam::{DAffine2, DVec2, dvec2};

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is negative when non-negative required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Length in milli-inches (the canonical physical unit)
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
#[repr(transparent)]
pub struct Mils(pub f64);

impl Mils {
    pub const ZERO: Mils = Mils(0.0);

    pub const PER_INCH: f64 = 1000.0;

    /// Create a length with validation (rejects NaN/infinite)
    #[inline]
    pub fn try_new(val: f64) -> Result<Mils, NumericError> {
        if val.is_nan() {
            Err(NumericError::NaN)
        } else if val.is_infinite() {
            Err(NumericError::Infinite)
        } else {
            Ok(Mils(val))
        }
    }

    /// Create a non-negative length with validation
    #[inline]
    pub fn try_non_negative(val: f64) -> Result<Mils, NumericError> {
        let l = Self::try_new(val)?;
        if l.0 < 0.0 {
            Err(NumericError::Negative)
        } else {
            Ok(l)
        }
    }

    #[inline]
    pub fn from_inches(val: f64) -> Mils {
        Mils(val * Self::PER_INCH)
    }

    #[inline]
    pub fn inches(self) -> f64 {
        self.0 / Self::PER_INCH
    }

    /// Typographic points (1/72 in)
    #[inline]
    pub fn points(self) -> f64 {
        self.inches() * 72.0
    }

    #[inline]
    pub fn abs(self) -> Mils {
        Mils(self.0.abs())
    }

    #[inline]
    pub fn min(self, other: Mils) -> Mils {
        Mils(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Mils) -> Mils {
        Mils(self.0.max(other.0))
    }

    /// Get the raw value (use sparingly, prefer typed operations)
    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Checked ratio, `None` if the divisor is zero
    #[inline]
    pub fn checked_div(self, rhs: Mils) -> Option<f64> {
        if rhs.0 == 0.0 { None } else { Some(self.0 / rhs.0) }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Add for Mils {
    type Output = Mils;
    fn add(self, rhs: Mils) -> Mils {
        Mils(self.0 + rhs.0)
    }
}

impl Sub for Mils {
    type Output = Mils;
    fn sub(self, rhs: Mils) -> Mils {
        Mils(self.0 - rhs.0)
    }
}

impl Mul<f64> for Mils {
    type Output = Mils;
    fn mul(self, rhs: f64) -> Mils {
        Mils(self.0 * rhs)
    }
}

impl Div<f64> for Mils {
    type Output = Mils;
    fn div(self, rhs: f64) -> Mils {
        Mils(self.0 / rhs)
    }
}

// Ratios of two lengths go through `Mils::checked_div`

impl Neg for Mils {
    type Output = Mils;
    fn neg(self) -> Mils {
        Mils(-self.0)
    }
}

impl AddAssign for Mils {
    fn add_assign(&mut self, rhs: Mils) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Mils {
    fn sub_assign(&mut self, rhs: Mils) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Mils {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mi", self.0)
    }
}

/// Angle in degrees
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Angle(pub f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    #[inline]
    pub fn degrees(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Same direction, mapped into `[0, 360)`
    pub fn normalized(self) -> Angle {
        let a = self.0.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        Angle(if a >= 360.0 { 0.0 } else { a })
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}deg", self.0)
    }
}

/// Axis-aligned rectangle in some node frame, coordinates in milli-inches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for Rect {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Rect {
    /// A rectangle that will take the shape of the first point expanded into it
    pub const EMPTY: Rect = Rect {
        min: DVec2::splat(f64::MAX),
        max: DVec2::splat(f64::MIN),
    };

    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        Rect { min: a.min(b), max: a.max(b) }
    }

    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::from_corners(dvec2(x, y), dvec2(x + w, y + h))
    }

    /// Check if the rect is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Rect { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Grow outward by `d` on every side
    pub fn inflate(&self, d: f64) -> Rect {
        if self.is_empty() {
            return *self;
        }
        Rect { min: self.min - DVec2::splat(d), max: self.max + DVec2::splat(d) }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            dvec2(self.max.x, self.min.y),
            self.max,
            dvec2(self.min.x, self.max.y),
        ]
    }

    /// Bounding box of this rect after an affine transform
    pub fn transformed(&self, xf: &DAffine2) -> Rect {
        if self.is_empty() {
            return *self;
        }
        let mut out = Rect::EMPTY;
        for c in self.corners() {
            out.expand_point(xf.transform_point2(c));
        }
        out
    }

    /// Containment with a tolerance for accumulated float error
    pub fn contains_rect(&self, other: &Rect, eps: f64) -> bool {
        other.min.x >= self.min.x - eps
            && other.min.y >= self.min.y - eps
            && other.max.x <= self.max.x + eps
            && other.max.y <= self.max.y + eps
    }
}

/// An sRGB color with alpha; alpha 0 means fully transparent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Channels as fractions in `[0, 1]`, for PostScript `setrgbcolor`
    pub fn unit_rgb(self) -> (f64, f64, f64) {
        (self.r as f64 / 255.0, self.g as f64 / 255.0, self.b as f64 / 255.0)
    }

    /// Hex form: `rrggbb` when opaque, `aarrggbb` otherwise
    pub fn to_hex(self) -> String {
        if self.is_opaque() {
            format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, " alpha={}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parse the [`Color::to_hex`] form, or the word `none` for transparent
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Ok(Color::TRANSPARENT);
        }
        let byte = |i: usize| {
            s.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| format!("bad hex color: {s:?}"))
        };
        match s.len() {
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color::rgba(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
            _ => Err(format!("bad hex color: {s:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mils_try_new_rejects_nan_and_infinity() {
        assert_eq!(Mils::try_new(f64::NAN), Err(NumericError::NaN));
        assert_eq!(Mils::try_new(f64::INFINITY), Err(NumericError::Infinite));
        assert!(Mils::try_new(-3.0).is_ok());
        assert_eq!(Mils::try_non_negative(-3.0), Err(NumericError::Negative));
    }

    #[test]
    fn mils_arithmetic() {
        let a = Mils(300.0);
        let b = Mils(200.0);
        assert_eq!(a + b, Mils(500.0));
        assert_eq!(a - b, Mils(100.0));
        assert_eq!(a * 2.0, Mils(600.0));
        assert_eq!(a / 2.0, Mils(150.0));
        assert_eq!(-a, Mils(-300.0));
        assert_eq!(a.checked_div(Mils::ZERO), None);
        assert_eq!(Mils::from_inches(1.5), Mils(1500.0));
        assert_eq!(Mils(1000.0).points(), 72.0);
    }

    #[test]
    fn angle_normalization() {
        assert_eq!(Angle(-90.0).normalized(), Angle(270.0));
        assert_eq!(Angle(720.0).normalized(), Angle(0.0));
        assert_eq!(Angle(45.0).normalized(), Angle(45.0));
    }

    #[test]
    fn rect_expand_and_union() {
        let mut r = Rect::EMPTY;
        assert!(r.is_empty());
        r.expand_point(dvec2(1.0, 2.0));
        r.expand_point(dvec2(5.0, -1.0));
        assert_eq!(r.min, dvec2(1.0, -1.0));
        assert_eq!(r.max, dvec2(5.0, 2.0));
        let u = r.union(&Rect::from_xywh(0.0, 0.0, 1.0, 1.0));
        assert_eq!(u.min, dvec2(0.0, -1.0));
        assert_eq!(Rect::EMPTY.union(&r), r);
    }

    #[test]
    fn rect_transformed_by_rotation() {
        let r = Rect::from_xywh(0.0, 0.0, 2.0, 1.0);
        let xf = DAffine2::from_angle(std::f64::consts::FRAC_PI_2);
        let t = r.transformed(&xf);
        assert!((t.min.x - -1.0).abs() < 1e-12);
        assert!((t.max.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn color_display_marks_alpha() {
        assert_eq!(Color::rgb(255, 0, 10).to_string(), "(255,0,10)");
        assert_eq!(Color::rgba(1, 2, 3, 128).to_string(), "(1,2,3) alpha=128");
    }

    #[test]
    fn color_hex_round_trip() {
        for c in [Color::BLACK, Color::rgb(18, 52, 86), Color::rgba(1, 2, 3, 4)] {
            assert_eq!(c.to_hex().parse::<Color>(), Ok(c));
        }
        assert_eq!("none".parse::<Color>(), Ok(Color::TRANSPARENT));
        assert!("12345".parse::<Color>().is_err());
    }
}
