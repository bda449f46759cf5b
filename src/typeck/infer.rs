use crate::ast::*;
use crate::diagnostics::{CompileError, TypeErrorKind};
use crate::span::{Span, Spanned};
use super::builtins;
use super::cast::validate_cast;
use super::env::TypeEnv;
use super::resolve::resolve_type;
use super::types::{LaneType, Scalar};
use super::{check_assignable, universal_operand, width_clash};

/// Infer: uniform op uniform is uniform, any varying operand makes the result
/// varying, and two constrained operands must agree on their lane count.
pub fn infer_expr(expr: &Expr, span: Span, env: &TypeEnv) -> Result<LaneType, CompileError> {
    match expr {
        Expr::IntLit(_) => Ok(LaneType::Uniform(Scalar::Int64)),
        Expr::FloatLit(_) => Ok(LaneType::Uniform(Scalar::Float64)),
        Expr::BoolLit(_) => Ok(LaneType::Uniform(Scalar::Bool)),
        Expr::Ident(name) => {
            if let Some(binding) = env.lookup(name) {
                return Ok(binding.ty.clone());
            }
            if env.consts.contains_key(name) {
                return Ok(LaneType::Uniform(Scalar::Int64));
            }
            Err(CompileError::type_err(
                TypeErrorKind::Unresolved,
                format!("undefined variable '{name}'"),
                span,
            ))
        }
        Expr::BinOp { op, lhs, rhs } => infer_binop(*op, lhs, rhs, span, env),
        Expr::UnaryOp { op, operand } => {
            let t = infer_expr(&operand.node, operand.span, env)?;
            if t.is_universal() {
                return Err(universal_operand(operand.span));
            }
            let ok = match (op, t.scalar()) {
                (UnaryOp::Neg, Some(s)) => s.is_numeric(),
                (UnaryOp::Not, Some(s)) => s == Scalar::Bool,
                (UnaryOp::BitNot, Some(s)) => s.is_integer(),
                (_, None) => false,
            };
            if !ok {
                let sym = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                    UnaryOp::BitNot => "~",
                };
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("cannot apply '{sym}' to type {t}"),
                    span,
                ));
            }
            Ok(t)
        }
        Expr::Cast { expr: inner, target } => {
            let src = infer_expr(&inner.node, inner.span, env)?;
            let dst = resolve_type(target, env)?;
            validate_cast(&src, &dst, span)?;
            Ok(dst)
        }
        Expr::Call { name, args } => {
            if builtins::is_builtin(&name.node) {
                builtins::infer_builtin(name, args, span, env)
            } else {
                infer_call(name, args, span, env)
            }
        }
        Expr::Range { start, end } => {
            let s = expect_uniform_int(start, env, "range bound")?;
            let e = expect_uniform_int(end, env, "range bound")?;
            if s != e && !is_int_literal(start) && !is_int_literal(end) {
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("range bounds differ: {s} and {e}"),
                    span,
                ));
            }
            let elem = if is_int_literal(start) { e } else { s };
            Ok(LaneType::Seq(elem))
        }
        Expr::Recv { chan } => match infer_expr(&chan.node, chan.span, env)? {
            LaneType::Chan(inner) => Ok(*inner),
            other => Err(CompileError::type_err(
                TypeErrorKind::TypeMismatch,
                format!("cannot receive from non-channel type {other}"),
                chan.span,
            )),
        },
    }
}

pub(crate) fn is_int_literal(expr: &Spanned<Expr>) -> bool {
    match &expr.node {
        Expr::IntLit(_) => true,
        Expr::UnaryOp { op: UnaryOp::Neg, operand } => is_int_literal(operand),
        _ => false,
    }
}

/// A uniform integer operand, such as a range bound or a rotate offset.
pub(crate) fn expect_uniform_int(expr: &Spanned<Expr>, env: &TypeEnv, what: &str) -> Result<Scalar, CompileError> {
    match infer_expr(&expr.node, expr.span, env)? {
        LaneType::Uniform(s) if s.is_integer() => Ok(s),
        t @ LaneType::Varying(..) => Err(CompileError::type_err(
            TypeErrorKind::VaryingToUniform,
            format!("{what} must be uniform, found {t}"),
            expr.span,
        )),
        t => Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("{what} must be a uniform integer, found {t}"),
            expr.span,
        )),
    }
}

fn infer_binop(
    op: BinOp,
    lhs: &Spanned<Expr>,
    rhs: &Spanned<Expr>,
    span: Span,
    env: &TypeEnv,
) -> Result<LaneType, CompileError> {
    let lt = infer_expr(&lhs.node, lhs.span, env)?;
    let rt = infer_expr(&rhs.node, rhs.span, env)?;
    if lt.is_universal() {
        return Err(universal_operand(lhs.span));
    }
    if rt.is_universal() {
        return Err(universal_operand(rhs.span));
    }
    let (Some(ls), Some(rs)) = (lt.scalar(), rt.scalar()) else {
        return Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("operator '{op}' cannot be applied to {lt} and {rt}"),
            span,
        ));
    };

    let scalar = if ls == rs {
        ls
    } else if is_int_literal(lhs) && rs.is_numeric() {
        rs
    } else if is_int_literal(rhs) && ls.is_numeric() {
        ls
    } else {
        return Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("operand type mismatch: {lt} vs {rt}"),
            span,
        ));
    };

    let supported = if op.is_logical() {
        scalar == Scalar::Bool
    } else if op.is_bitwise() {
        scalar.is_integer()
    } else if matches!(op, BinOp::Eq | BinOp::Neq) {
        true
    } else {
        scalar.is_numeric()
    };
    if !supported {
        return Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("operator '{op}' not supported for type {scalar}"),
            span,
        ));
    }

    let result = if op.is_comparison() { Scalar::Bool } else { scalar };
    match (lt.width(), rt.width()) {
        (None, None) => Ok(LaneType::Uniform(result)),
        (Some(w), None) | (None, Some(w)) => Ok(LaneType::Varying(result, w)),
        (Some(a), Some(b)) => {
            let w = a.combine(b).map_err(|c| width_clash(c, span))?;
            Ok(LaneType::Varying(result, w))
        }
    }
}

fn infer_call(
    name: &Spanned<String>,
    args: &[Spanned<Expr>],
    span: Span,
    env: &TypeEnv,
) -> Result<LaneType, CompileError> {
    let sig = env.functions.get(&name.node).ok_or_else(|| {
        CompileError::type_err(
            TypeErrorKind::Unresolved,
            format!("unknown function '{}'", name.node),
            name.span,
        )
    })?;
    if args.len() != sig.params.len() {
        return Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!(
                "function '{}' expects {} arguments, got {}",
                name.node,
                sig.params.len(),
                args.len()
            ),
            span,
        ));
    }
    for (arg, param) in args.iter().zip(&sig.params) {
        let actual = infer_expr(&arg.node, arg.span, env)?;
        check_assignable(&actual, param, is_int_literal(arg), arg.span)?;
    }
    Ok(sig.return_type.clone())
}
