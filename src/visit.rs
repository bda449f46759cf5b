//! AST visitor infrastructure
//!
//! `Visitor` is a read-only traversal: implement it for an analysis pass,
//! override only the methods you need, and call the matching `walk_*`
//! function inside the override to keep the default recursion. Omitting the
//! walk call prunes traversal at that node.
//!
//! ```rust
//! use lanec::visit::{Visitor, walk_expr};
//! use lanec::ast::Expr;
//! use lanec::span::Spanned;
//!
//! struct CallCounter { calls: usize }
//!
//! impl Visitor for CallCounter {
//!     fn visit_expr(&mut self, expr: &Spanned<Expr>) {
//!         if let Expr::Call { .. } = &expr.node {
//!             self.calls += 1;
//!         }
//!         walk_expr(self, expr);
//!     }
//! }
//! ```
//!
//! The mask engine's statement walk matches by hand; it threads region state
//! through every arm.

use crate::ast::*;
use crate::span::Spanned;

pub trait Visitor: Sized {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_function(&mut self, func: &Spanned<Function>) {
        walk_function(self, func);
    }

    fn visit_block(&mut self, block: &Spanned<Block>) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        walk_expr(self, expr);
    }

    fn visit_type_expr(&mut self, te: &Spanned<TypeExpr>) {
        walk_type_expr(self, te);
    }
}

pub fn walk_program<V: Visitor>(v: &mut V, program: &Program) {
    for c in &program.consts {
        v.visit_expr(&c.node.value);
    }
    for func in &program.functions {
        v.visit_function(func);
    }
}

pub fn walk_function<V: Visitor>(v: &mut V, func: &Spanned<Function>) {
    for param in &func.node.params {
        v.visit_type_expr(&param.ty);
    }
    if let Some(rt) = &func.node.return_type {
        v.visit_type_expr(rt);
    }
    v.visit_block(&func.node.body);
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Spanned<Block>) {
    for stmt in &block.node.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Spanned<Stmt>) {
    match &stmt.node {
        Stmt::Let { ty, value, .. } => {
            if let Some(t) = ty {
                v.visit_type_expr(t);
            }
            v.visit_expr(value);
        }
        Stmt::Assign { value, .. } => v.visit_expr(value),
        Stmt::If { condition, then_block, else_block } => {
            v.visit_expr(condition);
            v.visit_block(then_block);
            if let Some(eb) = else_block {
                v.visit_block(eb);
            }
        }
        Stmt::Switch { scrutinee, cases, default } => {
            v.visit_expr(scrutinee);
            for case in cases {
                for value in &case.values {
                    v.visit_expr(value);
                }
                v.visit_block(&case.body);
            }
            if let Some(d) = default {
                v.visit_block(d);
            }
        }
        Stmt::TypeSwitch { scrutinee, cases, default, .. } => {
            v.visit_expr(scrutinee);
            for case in cases {
                v.visit_block(&case.body);
            }
            if let Some(d) = default {
                v.visit_block(d);
            }
        }
        Stmt::For { iterable, body, .. } => {
            v.visit_expr(iterable);
            v.visit_block(body);
        }
        Stmt::While { condition, body } => {
            v.visit_expr(condition);
            v.visit_block(body);
        }
        Stmt::GoFor { range, body, .. } => {
            v.visit_expr(range);
            v.visit_block(body);
        }
        Stmt::Return(value) => {
            if let Some(e) = value {
                v.visit_expr(e);
            }
        }
        Stmt::Panic(e) | Stmt::Defer(e) | Stmt::Spawn(e) | Stmt::Expr(e) => v.visit_expr(e),
        Stmt::Send { chan, value } => {
            v.visit_expr(chan);
            v.visit_expr(value);
        }
        Stmt::Break | Stmt::Continue => {}
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Spanned<Expr>) {
    match &expr.node {
        Expr::BinOp { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        Expr::UnaryOp { operand, .. } => v.visit_expr(operand),
        Expr::Cast { expr: inner, target } => {
            v.visit_expr(inner);
            v.visit_type_expr(target);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Range { start, end } => {
            v.visit_expr(start);
            v.visit_expr(end);
        }
        Expr::Recv { chan } => v.visit_expr(chan),
        Expr::IntLit(_) | Expr::FloatLit(_) | Expr::BoolLit(_) | Expr::Ident(_) => {}
    }
}

pub fn walk_type_expr<V: Visitor>(v: &mut V, te: &Spanned<TypeExpr>) {
    match &te.node {
        TypeExpr::Varying { elem, .. } | TypeExpr::Chan(elem) => v.visit_type_expr(elem),
        TypeExpr::Named(_) => {}
    }
}
