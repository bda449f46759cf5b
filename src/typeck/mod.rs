//! Type & constraint resolution: uniform/varying types, lane constraints,
//! casts and cross-lane builtin signatures.

pub mod builtins;
pub mod cast;
pub mod check;
pub mod env;
pub mod infer;
pub mod resolve;
pub mod types;

use crate::diagnostics::{CompileError, TypeErrorKind};
use crate::span::Span;
use types::{LaneType, Scalar, Width, WidthClash};

pub(crate) fn width_clash(clash: WidthClash, span: Span) -> CompileError {
    match clash {
        WidthClash::Mismatch(a, b) => CompileError::type_err(
            TypeErrorKind::MismatchedConstraint,
            format!("lane constraints differ: varying[{a}] vs varying[{b}]"),
            span,
        ),
        WidthClash::Universal => universal_operand(span),
    }
}

pub(crate) fn universal_operand(span: Span) -> CompileError {
    CompileError::type_err(
        TypeErrorKind::OperationOnUniversalConstrained,
        "a varying[] value must be narrowed with a type switch or passed to lanes.FromConstrained before use",
        span,
    )
}

/// Scalars agree, or an untyped integer literal adopts the expected numeric scalar.
pub(crate) fn scalars_match(actual: Scalar, expected: Scalar, int_literal: bool, span: Span) -> Result<(), CompileError> {
    if actual == expected || (int_literal && actual.is_integer() && expected.is_numeric()) {
        return Ok(());
    }
    Err(CompileError::type_err(
        TypeErrorKind::TypeMismatch,
        format!("expected {expected}, found {actual}"),
        span,
    ))
}

/// Can a value of type `actual` flow into a slot of type `expected`
/// (binding, assignment, argument, return, channel send)?
pub(crate) fn check_assignable(
    actual: &LaneType,
    expected: &LaneType,
    int_literal: bool,
    span: Span,
) -> Result<(), CompileError> {
    match (actual, expected) {
        (LaneType::Varying(..), LaneType::Uniform(_)) => Err(CompileError::type_err(
            TypeErrorKind::VaryingToUniform,
            format!("cannot use {actual} where uniform {expected} is expected"),
            span,
        )),
        (LaneType::Uniform(a), LaneType::Uniform(e)) | (LaneType::Uniform(a), LaneType::Varying(e, _)) => {
            scalars_match(*a, *e, int_literal, span)
        }
        (LaneType::Varying(a, aw), LaneType::Varying(e, ew)) => {
            scalars_match(*a, *e, false, span)?;
            match (aw, ew) {
                (_, Width::Universal) => Ok(()),
                (Width::Universal, _) => Err(universal_operand(span)),
                (Width::Native, _) => Ok(()),
                (Width::Fixed(a), Width::Fixed(b)) if a == b => Ok(()),
                (Width::Fixed(a), Width::Fixed(b)) => Err(width_clash(WidthClash::Mismatch(*a, *b), span)),
                (Width::Fixed(n), Width::Native) => Err(CompileError::type_err(
                    TypeErrorKind::MismatchedConstraint,
                    format!("varying[{n}] cannot be used where a native-width varying is expected"),
                    span,
                )),
            }
        }
        _ if actual == expected => Ok(()),
        _ => Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("expected {expected}, found {actual}"),
            span,
        )),
    }
}
