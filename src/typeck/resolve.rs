use crate::ast::{BinOp, ConstraintExpr, Expr, Function, Program, TypeExpr, UnaryOp};
use crate::diagnostics::{CompileError, TypeErrorKind};
use crate::span::{Span, Spanned};
use super::env::{FuncSig, TypeEnv};
use super::types::{LaneType, Scalar, Width};

pub(crate) fn resolve_scalar(name: &str, span: Span) -> Result<Scalar, CompileError> {
    Scalar::from_name(name).ok_or_else(|| {
        CompileError::type_err(TypeErrorKind::Unresolved, format!("unknown type '{name}'"), span)
    })
}

pub fn resolve_type(ty: &Spanned<TypeExpr>, env: &TypeEnv) -> Result<LaneType, CompileError> {
    match &ty.node {
        TypeExpr::Named(name) => {
            if name == "void" {
                return Ok(LaneType::Void);
            }
            Ok(LaneType::Uniform(resolve_scalar(name, ty.span)?))
        }
        TypeExpr::Varying { elem, lanes } => {
            let scalar = match &elem.node {
                TypeExpr::Named(name) => resolve_scalar(name, elem.span)?,
                other => {
                    return Err(CompileError::type_err(
                        TypeErrorKind::TypeMismatch,
                        format!("varying element must be a scalar, found {other:?}"),
                        elem.span,
                    ));
                }
            };
            let width = match lanes {
                None => Width::Native,
                Some(c) => {
                    let n = resolve_constraint(c, env)?;
                    validate_constraint(n, scalar, c.span)?
                }
            };
            Ok(LaneType::Varying(scalar, width))
        }
        TypeExpr::Chan(inner) => Ok(LaneType::Chan(Box::new(resolve_type(inner, env)?))),
    }
}

/// Fold a constraint expression to its integer value.
pub(crate) fn resolve_constraint(c: &Spanned<ConstraintExpr>, env: &TypeEnv) -> Result<i64, CompileError> {
    match &c.node {
        ConstraintExpr::Lit(n) => Ok(*n),
        ConstraintExpr::Universal => Ok(0),
        ConstraintExpr::Name(name) => env.consts.get(name).copied().ok_or_else(|| {
            let why = if env.lookup(name).is_some() { "a runtime value" } else { "not a declared constant" };
            CompileError::type_err(
                TypeErrorKind::NonConstantConstraint,
                format!("lane constraint '{name}' is {why}"),
                c.span,
            )
        }),
    }
}

/// ValidateConstraint: N must be a nonnegative compile-time integer, and a
/// concrete N must keep N·bits(T) within the maximum register width.
pub fn validate_constraint(n: i64, scalar: Scalar, span: Span) -> Result<Width, CompileError> {
    if n < 0 {
        return Err(CompileError::type_err(
            TypeErrorKind::NonConstantConstraint,
            format!("lane constraint must be a nonnegative compile-time integer, got {n}"),
            span,
        ));
    }
    if n == 0 {
        return Ok(Width::Universal);
    }
    let width = u32::try_from(n).map(Width::Fixed).map_err(|_| too_wide(n, scalar, span))?;
    if !width.fits(scalar) {
        return Err(too_wide(n, scalar, span));
    }
    Ok(width)
}

fn too_wide(n: i64, scalar: Scalar, span: Span) -> CompileError {
    CompileError::type_err(
        TypeErrorKind::ConstraintTooWide,
        format!(
            "varying[{n}] {scalar} needs {} bits, more than the {}-bit register limit",
            i128::from(n) * i128::from(scalar.bits()),
            crate::config::MAX_REGISTER_BITS
        ),
        span,
    )
}

/// Evaluate a compile-time integer expression over literals and constants.
pub(crate) fn eval_const(expr: &Spanned<Expr>, env: &TypeEnv) -> Result<i64, CompileError> {
    let not_const = |what: &str| {
        CompileError::type_err(
            TypeErrorKind::NonConstantConstraint,
            format!("{what} is not a compile-time integer"),
            expr.span,
        )
    };
    match &expr.node {
        Expr::IntLit(v) => Ok(*v),
        Expr::Ident(name) => env.consts.get(name).copied().ok_or_else(|| not_const(&format!("'{name}'"))),
        Expr::UnaryOp { op: UnaryOp::Neg, operand } => {
            eval_const(operand, env)?.checked_neg().ok_or_else(|| not_const("negation"))
        }
        Expr::BinOp { op, lhs, rhs } => {
            let (l, r) = (eval_const(lhs, env)?, eval_const(rhs, env)?);
            let folded = match op {
                BinOp::Add => l.checked_add(r),
                BinOp::Sub => l.checked_sub(r),
                BinOp::Mul => l.checked_mul(r),
                BinOp::Div => l.checked_div(r),
                BinOp::Mod => l.checked_rem(r),
                BinOp::Shl => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
                _ => None,
            };
            folded.ok_or_else(|| not_const(&format!("'{op}' expression")))
        }
        _ => Err(not_const("expression")),
    }
}

/// Register constants in declaration order, so later constants may use earlier ones.
pub(crate) fn register_consts(program: &Program, env: &mut TypeEnv) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for c in &program.consts {
        match eval_const(&c.node.value, env) {
            Ok(v) => {
                env.consts.insert(c.node.name.node.clone(), v);
            }
            Err(e) => errors.push(e),
        }
    }
    errors
}

fn resolve_signature(f: &Function, span: Span, env: &TypeEnv) -> Result<FuncSig, CompileError> {
    let params = f
        .params
        .iter()
        .map(|p| resolve_type(&p.ty, env))
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = match &f.return_type {
        Some(rt) => resolve_type(rt, env)?,
        None => LaneType::Void,
    };
    Ok(FuncSig { params, return_type, is_pub: f.is_pub, span })
}

/// Resolve every function signature. A function whose signature fails is
/// left out of the table and reported; the others are still checked.
pub(crate) fn register_functions(program: &Program, env: &mut TypeEnv) -> Vec<(String, CompileError)> {
    let mut errors = Vec::new();
    for func in &program.functions {
        let f = &func.node;
        let sig = resolve_signature(f, func.span, env);
        match sig {
            Ok(sig) => {
                env.functions.insert(f.name.node.clone(), sig);
            }
            Err(e) => errors.push((f.name.node.clone(), e)),
        }
    }
    errors
}
