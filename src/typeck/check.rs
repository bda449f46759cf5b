use std::collections::HashMap;

use crate::ast::*;
use crate::diagnostics::{CompileError, ControlFlowErrorKind, TypeErrorKind};
use crate::span::{Span, Spanned};
use super::check_assignable;
use super::env::TypeEnv;
use super::infer::{infer_expr, is_int_literal};
use super::resolve::{resolve_constraint, resolve_type, validate_constraint};
use super::types::{LaneType, Width};
use super::universal_operand;

/// Types of statement-level expressions (conditions, scrutinees, operands of
/// panic/defer/spawn/send, initializers) keyed by span. Later passes read
/// uniform/varying facts from here instead of re-inferring.
pub type ExprTypes = HashMap<Span, LaneType>;

struct FnCx {
    return_type: LaneType,
    loop_depth: u32,
    types: ExprTypes,
}

pub fn check_function(func: &Spanned<Function>, env: &mut TypeEnv) -> Result<ExprTypes, CompileError> {
    let f = &func.node;
    let return_type = env
        .functions
        .get(&f.name.node)
        .ok_or_else(|| {
            CompileError::type_err(
                TypeErrorKind::Unresolved,
                format!("unknown function '{}'", f.name.node),
                f.name.span,
            )
        })?
        .return_type
        .clone();

    let base = env.scope_depth();
    env.push_scope();
    let mut cx = FnCx { return_type, loop_depth: 0, types: ExprTypes::new() };
    let result = check_params(f, env).and_then(|()| check_block(&f.body.node, env, &mut cx, 0));
    env.truncate_scopes(base);
    result.map(|()| cx.types)
}

fn check_params(f: &Function, env: &mut TypeEnv) -> Result<(), CompileError> {
    for p in &f.params {
        let ty = resolve_type(&p.ty, env)?;
        env.define(p.name.node.clone(), ty, 0);
    }
    Ok(())
}

fn check_block(block: &Block, env: &mut TypeEnv, cx: &mut FnCx, depth: u32) -> Result<(), CompileError> {
    for stmt in &block.stmts {
        check_stmt(&stmt.node, stmt.span, env, cx, depth)?;
    }
    Ok(())
}

fn scoped(
    block: &Block,
    env: &mut TypeEnv,
    cx: &mut FnCx,
    depth: u32,
    bind: Option<(&str, LaneType)>,
) -> Result<(), CompileError> {
    env.push_scope();
    if let Some((name, ty)) = bind {
        env.define(name.to_string(), ty, depth);
    }
    check_block(block, env, cx, depth)?;
    env.pop_scope();
    Ok(())
}

fn infer_at(expr: &Spanned<Expr>, env: &TypeEnv, cx: &mut FnCx) -> Result<LaneType, CompileError> {
    let ty = infer_expr(&expr.node, expr.span, env)?;
    cx.types.insert(expr.span, ty.clone());
    Ok(ty)
}

/// Conditions are bool, uniform or varying. Returns the depth the guarded
/// code runs at.
fn check_condition(cond: &Spanned<Expr>, env: &TypeEnv, cx: &mut FnCx, depth: u32, what: &str) -> Result<u32, CompileError> {
    let ty = infer_at(cond, env, cx)?;
    if ty.is_universal() {
        return Err(universal_operand(cond.span));
    }
    if !ty.is_bool() {
        return Err(CompileError::type_err(
            TypeErrorKind::TypeMismatch,
            format!("{what} condition must be bool, found {ty}"),
            cond.span,
        ));
    }
    Ok(depth + u32::from(ty.is_varying()))
}

fn check_stmt(stmt: &Stmt, span: Span, env: &mut TypeEnv, cx: &mut FnCx, depth: u32) -> Result<(), CompileError> {
    match stmt {
        Stmt::Let { name, ty, value } => {
            let val_type = infer_at(value, env, cx)?;
            if matches!(val_type, LaneType::Void) {
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("cannot bind '{}' to a void value", name.node),
                    value.span,
                ));
            }
            let bound = match ty {
                Some(declared) => {
                    let expected = resolve_type(declared, env)?;
                    check_assignable(&val_type, &expected, is_int_literal(value), value.span)?;
                    expected
                }
                None => val_type,
            };
            cx.types.insert(name.span, bound.clone());
            env.define(name.node.clone(), bound, depth);
        }
        Stmt::Assign { target, value } => {
            let binding = env.lookup(&target.node).cloned().ok_or_else(|| {
                CompileError::type_err(
                    TypeErrorKind::Unresolved,
                    format!("undefined variable '{}'", target.node),
                    target.span,
                )
            })?;
            let val_type = infer_at(value, env, cx)?;
            check_assignable(&val_type, &binding.ty, is_int_literal(value), value.span)?;
            if !binding.ty.is_varying() && binding.varying_depth < depth {
                return Err(CompileError::control_flow(
                    ControlFlowErrorKind::UniformAssignInVaryingBranch,
                    format!(
                        "uniform '{}' is declared outside this varying branch; lanes would disagree on its value",
                        target.node
                    ),
                    span,
                ));
            }
            cx.types.insert(target.span, binding.ty);
        }
        Stmt::If { condition, then_block, else_block } => {
            let inner = check_condition(condition, env, cx, depth, "if")?;
            scoped(&then_block.node, env, cx, inner, None)?;
            if let Some(else_blk) = else_block {
                scoped(&else_blk.node, env, cx, inner, None)?;
            }
        }
        Stmt::Switch { scrutinee, cases, default } => {
            let ty = infer_at(scrutinee, env, cx)?;
            if ty.is_universal() {
                return Err(universal_operand(scrutinee.span));
            }
            let scalar = ty.scalar().ok_or_else(|| {
                CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("cannot switch on {ty}"),
                    scrutinee.span,
                )
            })?;
            let inner = depth + u32::from(ty.is_varying());
            for case in cases {
                for value in &case.values {
                    let vt = infer_at(value, env, cx)?;
                    check_assignable(&vt, &LaneType::Uniform(scalar), is_int_literal(value), value.span)?;
                }
                scoped(&case.body.node, env, cx, inner, None)?;
            }
            if let Some(d) = default {
                scoped(&d.node, env, cx, inner, None)?;
            }
        }
        Stmt::TypeSwitch { binding, scrutinee, cases, default } => {
            let ty = infer_at(scrutinee, env, cx)?;
            let LaneType::Varying(scalar, Width::Universal) = ty else {
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("type switch requires a varying[] value, found {ty}"),
                    scrutinee.span,
                ));
            };
            for case in cases {
                let n = resolve_constraint(&case.lanes, env)?;
                let width = validate_constraint(n, scalar, case.lanes.span)?;
                if width == Width::Universal {
                    return Err(CompileError::type_err(
                        TypeErrorKind::NonConstantConstraint,
                        "type switch case needs a concrete lane count",
                        case.lanes.span,
                    ));
                }
                let narrowed = LaneType::Varying(scalar, width);
                scoped(&case.body.node, env, cx, depth, Some((&binding.node, narrowed)))?;
            }
            if let Some(d) = default {
                scoped(&d.node, env, cx, depth, Some((&binding.node, ty)))?;
            }
        }
        Stmt::For { var, iterable, body } => {
            let elem = match infer_at(iterable, env, cx)? {
                LaneType::Seq(s) => LaneType::Uniform(s),
                LaneType::Groups(s) => LaneType::Varying(s, Width::Native),
                other => {
                    return Err(CompileError::type_err(
                        TypeErrorKind::TypeMismatch,
                        format!("for loop requires a range or sequence, found {other}"),
                        iterable.span,
                    ));
                }
            };
            cx.loop_depth += 1;
            scoped(&body.node, env, cx, depth, Some((&var.node, elem)))?;
            cx.loop_depth -= 1;
        }
        Stmt::While { condition, body } => {
            let inner = check_condition(condition, env, cx, depth, "while")?;
            cx.loop_depth += 1;
            scoped(&body.node, env, cx, inner, None)?;
            cx.loop_depth -= 1;
        }
        Stmt::GoFor { var, range, lanes, body } => {
            let scalar = match infer_at(range, env, cx)? {
                LaneType::Seq(s) if s.is_integer() => s,
                other => {
                    return Err(CompileError::type_err(
                        TypeErrorKind::TypeMismatch,
                        format!("go for requires a uniform integer range, found {other}"),
                        range.span,
                    ));
                }
            };
            let width = match lanes {
                None => Width::Native,
                Some(c) => {
                    let n = resolve_constraint(c, env)?;
                    match validate_constraint(n, scalar, c.span)? {
                        Width::Universal => {
                            return Err(CompileError::type_err(
                                TypeErrorKind::NonConstantConstraint,
                                "go for needs a concrete lane count",
                                c.span,
                            ));
                        }
                        w => w,
                    }
                }
            };
            cx.loop_depth += 1;
            scoped(&body.node, env, cx, depth, Some((&var.node, LaneType::Varying(scalar, width))))?;
            cx.loop_depth -= 1;
        }
        Stmt::Return(value) => {
            let expected = cx.return_type.clone();
            match value {
                Some(expr) => {
                    let actual = infer_at(expr, env, cx)?;
                    check_assignable(&actual, &expected, is_int_literal(expr), expr.span)?;
                }
                None if expected != LaneType::Void => {
                    return Err(CompileError::type_err(
                        TypeErrorKind::TypeMismatch,
                        format!("return type mismatch: expected {expected}, found void"),
                        span,
                    ));
                }
                None => {}
            }
        }
        Stmt::Break | Stmt::Continue => {
            if cx.loop_depth == 0 {
                let word = if matches!(stmt, Stmt::Break) { "break" } else { "continue" };
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("'{word}' can only be used inside a loop"),
                    span,
                ));
            }
        }
        Stmt::Panic(value) => {
            infer_at(value, env, cx)?;
        }
        Stmt::Defer(call) | Stmt::Spawn(call) => {
            if call.node.call_name().is_none() {
                let word = if matches!(stmt, Stmt::Defer(_)) { "defer" } else { "spawn" };
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    format!("{word} requires a function call"),
                    call.span,
                ));
            }
            infer_at(call, env, cx)?;
        }
        Stmt::Send { chan, value } => {
            let LaneType::Chan(elem) = infer_at(chan, env, cx)? else {
                return Err(CompileError::type_err(
                    TypeErrorKind::TypeMismatch,
                    "cannot send on a non-channel value",
                    chan.span,
                ));
            };
            let vt = infer_at(value, env, cx)?;
            check_assignable(&vt, &elem, is_int_literal(value), value.span)?;
        }
        Stmt::Expr(expr) => {
            infer_at(expr, env, cx)?;
        }
    }
    Ok(())
}

/// Whether a recorded expression type is varying. Unrecorded spans count as uniform.
pub fn is_varying_at(types: &ExprTypes, span: Span) -> bool {
    types.get(&span).is_some_and(LaneType::is_varying)
}
