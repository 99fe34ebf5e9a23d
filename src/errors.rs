//! Error types with diagnostics using miette
//!
//! The public editing API of [`GraphicModel`](crate::GraphicModel) collapses
//! these into `bool`/`Option` results; the typed errors are what the lower
//! layers return and what gets logged.

use miette::Diagnostic;
use thiserror::Error;

use crate::node::NodeKind;
use crate::property::PropertyId;

// ============================================================================
// Property Errors
// ============================================================================

/// Errors raised when a property write is rejected
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum PropertyError {
    #[error("{kind} nodes have no {property} property")]
    #[diagnostic(code(figcore::property::unsupported))]
    Unsupported { kind: NodeKind, property: PropertyId },

    #[error("wrong value type for {property}: expected {expected}")]
    #[diagnostic(code(figcore::property::type_mismatch))]
    TypeMismatch {
        property: PropertyId,
        expected: &'static str,
    },

    #[error("value out of range for {property}: {reason}")]
    #[diagnostic(code(figcore::property::out_of_range))]
    OutOfRange {
        property: PropertyId,
        reason: String,
    },

    #[error("{property} cannot be inherited")]
    #[diagnostic(
        code(figcore::property::not_inheritable),
        help("only style properties accept an inherited (empty) value")
    )]
    NotInheritable { property: PropertyId },

    #[error("invalid formula: {message}")]
    #[diagnostic(code(figcore::property::invalid_formula))]
    InvalidFormula { message: String },

    #[error("node is not attached to this model")]
    #[diagnostic(code(figcore::property::detached))]
    Detached,
}

// ============================================================================
// Geometry Errors
// ============================================================================

/// Ill-defined geometry; callers fall back to a no-op instead of failing
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("node has no parent viewport")]
    #[diagnostic(code(figcore::geometry::no_viewport))]
    NoViewport,

    #[error("location cannot be resolved in the parent's units")]
    #[diagnostic(code(figcore::geometry::unresolved))]
    Unresolved,

    #[error("line has zero length")]
    #[diagnostic(code(figcore::geometry::zero_length))]
    ZeroLength,

    #[error("transform is not invertible")]
    #[diagnostic(code(figcore::geometry::not_invertible))]
    NotInvertible,
}

// ============================================================================
// Style Errors
// ============================================================================

/// Failure converting a style set to or from its document form
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("style document has no node kind")]
    #[diagnostic(code(figcore::style::missing_kind))]
    MissingKind,

    #[error("unknown node kind: {0}")]
    #[diagnostic(code(figcore::style::unknown_kind))]
    UnknownKind(String),

    #[error("unknown property: {0}")]
    #[diagnostic(code(figcore::style::unknown_property))]
    UnknownProperty(String),

    #[error("cannot convert {property} value {text:?}")]
    #[diagnostic(code(figcore::style::bad_value))]
    BadValue { property: PropertyId, text: String },

    #[error("{property} is not a style property")]
    #[diagnostic(code(figcore::style::not_style))]
    NotStyle { property: PropertyId },

    #[error("cannot encode {property} for {kind}")]
    #[diagnostic(code(figcore::style::unencodable))]
    Unencodable { kind: NodeKind, property: PropertyId },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors that occur during rendering
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} pixmap")]
    #[diagnostic(code(figcore::render::pixmap))]
    Pixmap { width: u32, height: u32 },

    #[error("invalid resolution: {value}")]
    #[diagnostic(code(figcore::render::invalid_dpi))]
    InvalidDpi { value: f64 },

    #[error("render cancelled")]
    #[diagnostic(code(figcore::render::cancelled))]
    Cancelled,

    #[error("model has no root figure")]
    #[diagnostic(code(figcore::render::no_root))]
    NoRoot,
}
