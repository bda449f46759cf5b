//! Terse constructors for spanned AST nodes.
//!
//! Every node built here gets a fresh, distinct span from a thread-local
//! cursor, so mask points and diagnostics can be told apart without a real
//! source file. Use [`at`] to pin a node to a specific span.

use std::cell::Cell;

use super::*;
use crate::span::{Span, Spanned};

thread_local! {
    static CURSOR: Cell<usize> = const { Cell::new(0) };
}

fn next_span() -> Span {
    CURSOR.with(|c| {
        let start = c.get();
        c.set(start + 2);
        Span::new(start, start + 1)
    })
}

fn sp<T>(node: T) -> Spanned<T> {
    Spanned::new(node, next_span())
}

/// Re-span a node.
pub fn at<T>(node: Spanned<T>, start: usize, end: usize) -> Spanned<T> {
    Spanned::new(node.node, Span::new(start, end))
}

pub fn program(functions: Vec<Spanned<Function>>) -> Program {
    Program { consts: Vec::new(), functions }
}

pub fn constant(name: &str, value: Spanned<Expr>) -> Spanned<ConstDecl> {
    sp(ConstDecl { name: sp(name.to_string()), value })
}

pub fn func(
    name: &str,
    params: Vec<Param>,
    return_type: Option<Spanned<TypeExpr>>,
    body: Vec<Spanned<Stmt>>,
) -> Spanned<Function> {
    sp(Function {
        name: sp(name.to_string()),
        params,
        return_type,
        body: block(body),
        is_pub: false,
    })
}

pub fn pub_func(
    name: &str,
    params: Vec<Param>,
    return_type: Option<Spanned<TypeExpr>>,
    body: Vec<Spanned<Stmt>>,
) -> Spanned<Function> {
    let mut f = func(name, params, return_type, body);
    f.node.is_pub = true;
    f
}

pub fn param(name: &str, ty: Spanned<TypeExpr>) -> Param {
    Param { name: sp(name.to_string()), ty }
}

// ── Types ────────────────────────────────────────────────────────────────────

pub fn uniform(scalar: &str) -> Spanned<TypeExpr> {
    sp(TypeExpr::Named(scalar.to_string()))
}

pub fn varying(scalar: &str) -> Spanned<TypeExpr> {
    sp(TypeExpr::Varying { elem: Box::new(uniform(scalar)), lanes: None })
}

pub fn varying_n(scalar: &str, lanes: i64) -> Spanned<TypeExpr> {
    sp(TypeExpr::Varying {
        elem: Box::new(uniform(scalar)),
        lanes: Some(sp(ConstraintExpr::Lit(lanes))),
    })
}

pub fn varying_named(scalar: &str, constant: &str) -> Spanned<TypeExpr> {
    sp(TypeExpr::Varying {
        elem: Box::new(uniform(scalar)),
        lanes: Some(sp(ConstraintExpr::Name(constant.to_string()))),
    })
}

pub fn varying_universal(scalar: &str) -> Spanned<TypeExpr> {
    sp(TypeExpr::Varying {
        elem: Box::new(uniform(scalar)),
        lanes: Some(sp(ConstraintExpr::Universal)),
    })
}

pub fn chan(elem: Spanned<TypeExpr>) -> Spanned<TypeExpr> {
    sp(TypeExpr::Chan(Box::new(elem)))
}

pub fn lanes(n: i64) -> Spanned<ConstraintExpr> {
    sp(ConstraintExpr::Lit(n))
}

// ── Statements ───────────────────────────────────────────────────────────────

pub fn block(stmts: Vec<Spanned<Stmt>>) -> Spanned<Block> {
    sp(Block { stmts })
}

pub fn let_(name: &str, value: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Let { name: sp(name.to_string()), ty: None, value })
}

pub fn let_typed(name: &str, ty: Spanned<TypeExpr>, value: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Let { name: sp(name.to_string()), ty: Some(ty), value })
}

pub fn assign(target: &str, value: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Assign { target: sp(target.to_string()), value })
}

pub fn if_(condition: Spanned<Expr>, then: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::If { condition, then_block: block(then), else_block: None })
}

pub fn if_else(
    condition: Spanned<Expr>,
    then: Vec<Spanned<Stmt>>,
    otherwise: Vec<Spanned<Stmt>>,
) -> Spanned<Stmt> {
    sp(Stmt::If {
        condition,
        then_block: block(then),
        else_block: Some(block(otherwise)),
    })
}

pub fn switch(
    scrutinee: Spanned<Expr>,
    cases: Vec<(Vec<Spanned<Expr>>, Vec<Spanned<Stmt>>)>,
    default: Option<Vec<Spanned<Stmt>>>,
) -> Spanned<Stmt> {
    sp(Stmt::Switch {
        scrutinee,
        cases: cases
            .into_iter()
            .map(|(values, body)| SwitchCase { values, body: block(body) })
            .collect(),
        default: default.map(block),
    })
}

pub fn type_switch(
    binding: &str,
    scrutinee: Spanned<Expr>,
    cases: Vec<(i64, Vec<Spanned<Stmt>>)>,
    default: Option<Vec<Spanned<Stmt>>>,
) -> Spanned<Stmt> {
    sp(Stmt::TypeSwitch {
        binding: sp(binding.to_string()),
        scrutinee,
        cases: cases
            .into_iter()
            .map(|(n, body)| TypeCase { lanes: lanes(n), body: block(body) })
            .collect(),
        default: default.map(block),
    })
}

pub fn for_(var: &str, iterable: Spanned<Expr>, body: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::For { var: sp(var.to_string()), iterable, body: block(body) })
}

pub fn while_(condition: Spanned<Expr>, body: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::While { condition, body: block(body) })
}

pub fn go_for(var: &str, range: Spanned<Expr>, body: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    sp(Stmt::GoFor { var: sp(var.to_string()), range, lanes: None, body: block(body) })
}

pub fn go_for_n(
    var: &str,
    n: i64,
    range: Spanned<Expr>,
    body: Vec<Spanned<Stmt>>,
) -> Spanned<Stmt> {
    sp(Stmt::GoFor {
        var: sp(var.to_string()),
        range,
        lanes: Some(lanes(n)),
        body: block(body),
    })
}

pub fn ret(value: Option<Spanned<Expr>>) -> Spanned<Stmt> {
    sp(Stmt::Return(value))
}

pub fn brk() -> Spanned<Stmt> {
    sp(Stmt::Break)
}

pub fn cont() -> Spanned<Stmt> {
    sp(Stmt::Continue)
}

pub fn panic(value: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Panic(value))
}

pub fn defer(call: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Defer(call))
}

pub fn spawn(call: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Spawn(call))
}

pub fn send(chan: Spanned<Expr>, value: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Send { chan, value })
}

pub fn expr(e: Spanned<Expr>) -> Spanned<Stmt> {
    sp(Stmt::Expr(e))
}

// ── Expressions ──────────────────────────────────────────────────────────────

pub fn int(v: i64) -> Spanned<Expr> {
    sp(Expr::IntLit(v))
}

pub fn float(v: f64) -> Spanned<Expr> {
    sp(Expr::FloatLit(v))
}

pub fn boolean(v: bool) -> Spanned<Expr> {
    sp(Expr::BoolLit(v))
}

pub fn ident(name: &str) -> Spanned<Expr> {
    sp(Expr::Ident(name.to_string()))
}

pub fn bin(op: BinOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
}

pub fn unary(op: UnaryOp, operand: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::UnaryOp { op, operand: Box::new(operand) })
}

pub fn cast(e: Spanned<Expr>, target: Spanned<TypeExpr>) -> Spanned<Expr> {
    sp(Expr::Cast { expr: Box::new(e), target })
}

pub fn call(name: &str, args: Vec<Spanned<Expr>>) -> Spanned<Expr> {
    sp(Expr::Call { name: sp(name.to_string()), args })
}

pub fn range(start: Spanned<Expr>, end: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::Range { start: Box::new(start), end: Box::new(end) })
}

pub fn recv(chan: Spanned<Expr>) -> Spanned<Expr> {
    sp(Expr::Recv { chan: Box::new(chan) })
}
