use crate::config::MAX_REGISTER_BITS;
use crate::diagnostics::{CompileError, TypeErrorKind};
use crate::span::Span;
use super::types::{LaneType, Width};
use super::{universal_operand, width_clash};

/// ValidateCast. Narrowing or same-width conversions are always legal. A
/// varying value may never be widened per lane: that would need a wider
/// logical register than the source declared, and whether it fits would then
/// depend on the target. Constrained results must also stay within
/// MAX_REGISTER_BITS.
pub fn validate_cast(src: &LaneType, dst: &LaneType, span: Span) -> Result<(), CompileError> {
    match (src, dst) {
        (LaneType::Uniform(_), LaneType::Uniform(_)) => Ok(()),
        (LaneType::Uniform(_), LaneType::Varying(d, w)) => match w {
            Width::Universal => Err(universal_operand(span)),
            _ => check_register(*w, d.bits(), src, dst, span),
        },
        (LaneType::Varying(..), LaneType::Uniform(_)) => Err(CompileError::type_err(
            TypeErrorKind::VaryingToUniform,
            format!("cannot cast {src} to uniform {dst}; use a reduce.* operation"),
            span,
        )),
        (LaneType::Varying(s, sw), LaneType::Varying(d, dw)) => {
            if *sw == Width::Universal || *dw == Width::Universal {
                return Err(universal_operand(span));
            }
            let width = sw.combine(*dw).map_err(|c| width_clash(c, span))?;
            if d.bits() > s.bits() {
                return Err(CompileError::type_err(
                    TypeErrorKind::IllegalUpcast,
                    format!(
                        "cannot widen {src} to {dst}: {}-bit lanes need a wider register than the declared {}-bit lanes",
                        d.bits(),
                        s.bits()
                    ),
                    span,
                ));
            }
            check_register(width, d.bits(), src, dst, span)
        }
        _ => Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("cannot cast {src} to {dst}"),
            span,
        )),
    }
}

fn check_register(width: Width, dst_bits: u32, src: &LaneType, dst: &LaneType, span: Span) -> Result<(), CompileError> {
    if let Width::Fixed(n) = width
        && u64::from(n) * u64::from(dst_bits) > u64::from(MAX_REGISTER_BITS)
    {
        return Err(CompileError::type_err(
            TypeErrorKind::IllegalUpcast,
            format!("cast from {src} to {dst} exceeds the {MAX_REGISTER_BITS}-bit register limit"),
            span,
        ));
    }
    Ok(())
}
