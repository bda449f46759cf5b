//! Static signatures of the cross-lane and reduction library.
//!
//! Library operations are ordinary calls to reserved dotted names. They are
//! context-independent: the same rules hold inside and outside SPMD regions.

use crate::ast::Expr;
use crate::diagnostics::{CompileError, TypeErrorKind};
use crate::span::{Span, Spanned};
use super::env::TypeEnv;
use super::infer::{expect_uniform_int, infer_expr};
use super::resolve::eval_const;
use super::types::{LaneType, Scalar, Width};
use super::{universal_operand, width_clash};

pub const BUILTINS: &[&str] = &[
    "lanes.Broadcast",
    "lanes.Rotate",
    "lanes.Swizzle",
    "lanes.ShiftLeft",
    "lanes.ShiftRight",
    "lanes.FromConstrained",
    "reduce.Add",
    "reduce.Mul",
    "reduce.Max",
    "reduce.Min",
    "reduce.Or",
    "reduce.And",
    "reduce.Xor",
    "reduce.Any",
    "reduce.All",
    "reduce.FindFirstSet",
    "reduce.Mask",
    "reduce.From",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

pub(crate) fn infer_builtin(
    name: &Spanned<String>,
    args: &[Spanned<Expr>],
    span: Span,
    env: &TypeEnv,
) -> Result<LaneType, CompileError> {
    let callee = name.node.as_str();
    let expected = if matches!(
        callee,
        "lanes.Broadcast" | "lanes.Rotate" | "lanes.Swizzle" | "lanes.ShiftLeft" | "lanes.ShiftRight"
    ) {
        2
    } else {
        1
    };
    if args.len() != expected {
        return Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("'{callee}' expects {expected} argument(s), got {}", args.len()),
            span,
        ));
    }

    if callee == "lanes.FromConstrained" {
        return match infer_expr(&args[0].node, args[0].span, env)? {
            LaneType::Varying(s, _) => Ok(LaneType::Groups(s)),
            other => Err(CompileError::type_err(
                TypeErrorKind::TypeMismatch,
                format!("'{callee}' expects a varying operand, found {other}"),
                args[0].span,
            )),
        };
    }

    let (scalar, width) = varying_operand(callee, &args[0], env)?;
    match callee {
        "lanes.Broadcast" => {
            let lane = eval_const(&args[1], env).map_err(|_| {
                CompileError::type_err(
                    TypeErrorKind::NonConstantLaneIndex,
                    "lane index of lanes.Broadcast must be statically known",
                    args[1].span,
                )
            })?;
            let count = match width {
                Width::Fixed(n) => n,
                _ => env.target.lane_width(scalar),
            };
            if lane < 0 || lane >= i64::from(count) {
                return Err(CompileError::type_err(
                    TypeErrorKind::NonConstantLaneIndex,
                    format!("lane {lane} is out of range for {count} lanes"),
                    args[1].span,
                ));
            }
            Ok(LaneType::Varying(scalar, width))
        }
        "lanes.Rotate" => {
            expect_uniform_int(&args[1], env, "rotate offset")?;
            Ok(LaneType::Varying(scalar, width))
        }
        "lanes.Swizzle" => {
            let (idx, idx_width) = varying_operand(callee, &args[1], env)?;
            if !idx.is_integer() {
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("swizzle indices must be varying integers, found {idx}"),
                    args[1].span,
                ));
            }
            let w = width.combine(idx_width).map_err(|c| width_clash(c, span))?;
            Ok(LaneType::Varying(scalar, w))
        }
        "lanes.ShiftLeft" | "lanes.ShiftRight" => {
            let w = match infer_expr(&args[1].node, args[1].span, env)? {
                LaneType::Uniform(s) if s.is_integer() => width,
                LaneType::Varying(s, aw) if s.is_integer() => {
                    width.combine(aw).map_err(|c| width_clash(c, span))?
                }
                other => {
                    return Err(CompileError::type_err(
                        TypeErrorKind::TypeMismatch,
                        format!("shift amount must be an integer, found {other}"),
                        args[1].span,
                    ));
                }
            };
            Ok(LaneType::Varying(scalar, w))
        }
        "reduce.Add" | "reduce.Mul" | "reduce.Max" | "reduce.Min" => {
            require(callee, scalar.is_numeric(), scalar, "numeric", args[0].span)?;
            Ok(LaneType::Uniform(scalar))
        }
        "reduce.Or" | "reduce.And" | "reduce.Xor" => {
            require(callee, scalar.is_integer() || scalar == Scalar::Bool, scalar, "integer or bool", args[0].span)?;
            Ok(LaneType::Uniform(scalar))
        }
        "reduce.Any" | "reduce.All" => {
            require(callee, scalar == Scalar::Bool, scalar, "bool", args[0].span)?;
            Ok(LaneType::Uniform(Scalar::Bool))
        }
        "reduce.FindFirstSet" => {
            require(callee, scalar == Scalar::Bool, scalar, "bool", args[0].span)?;
            Ok(LaneType::Uniform(Scalar::Int64))
        }
        "reduce.Mask" => {
            require(callee, scalar == Scalar::Bool, scalar, "bool", args[0].span)?;
            let lanes = match width {
                Width::Fixed(n) => n,
                _ => env.target.lane_width(scalar),
            };
            if lanes > 64 {
                return Err(CompileError::type_err(
                    TypeErrorKind::ConstraintTooWide,
                    format!("reduce.Mask packs one bit per lane into uint64; {lanes} lanes do not fit"),
                    args[0].span,
                ));
            }
            Ok(LaneType::Uniform(Scalar::Uint64))
        }
        _ => Ok(LaneType::Seq(scalar)),
    }
}

/// First operand of every library op except FromConstrained: a concrete varying value.
fn varying_operand(callee: &str, arg: &Spanned<Expr>, env: &TypeEnv) -> Result<(Scalar, Width), CompileError> {
    match infer_expr(&arg.node, arg.span, env)? {
        LaneType::Varying(_, Width::Universal) => Err(universal_operand(arg.span)),
        LaneType::Varying(s, w) => Ok((s, w)),
        other => Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("'{callee}' expects a varying operand, found {other}"),
            arg.span,
        )),
    }
}

fn require(callee: &str, ok: bool, scalar: Scalar, what: &str, span: Span) -> Result<(), CompileError> {
    if ok {
        return Ok(());
    }
    Err(CompileError::type_err(
        TypeErrorKind::TypeMismatch,
        format!("'{callee}' requires {what} lanes, found {scalar}"),
        span,
    ))
}
