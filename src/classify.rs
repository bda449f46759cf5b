//! SPMD context classification.
//!
//! A function is SPMD iff it declares a varying parameter; a block is an SPMD
//! region iff it is an SPMD function's body or a go-for body. Regions never
//! nest, neither lexically nor through a chain of calls.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::ast::*;
use crate::diagnostics::{CompileError, ContextErrorKind};
use crate::span::{Span, Spanned};
use crate::typeck::check::{is_varying_at, ExprTypes};
use crate::typeck::env::FuncSig;
use crate::visit::{walk_expr, walk_stmt, Visitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionKind {
    GoFor,
    SpmdFunction,
}

/// An SPMD region to be walked by the mask engine.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    pub kind: RegionKind,
    pub function: &'a str,
    pub span: Span,
    pub body: &'a Spanned<Block>,
}

#[derive(Default)]
struct FnEffects {
    has_go_for: bool,
    calls: HashSet<String>,
}

impl Visitor for FnEffects {
    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        if matches!(stmt.node, Stmt::GoFor { .. }) {
            self.has_go_for = true;
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        if let Some(name) = expr.node.call_name() {
            self.calls.insert(name.to_string());
        }
        walk_expr(self, expr);
    }
}

/// Functions that open a go-for region when called, directly or through any
/// chain of calls. Computed to a fixed point over the call graph.
pub fn region_launchers(program: &Program) -> HashSet<String> {
    let mut edges: HashMap<String, HashSet<String>> = HashMap::new();
    let mut launchers = HashSet::new();
    for func in &program.functions {
        let mut effects = FnEffects::default();
        effects.visit_block(&func.node.body);
        let name = func.node.name.node.clone();
        if effects.has_go_for {
            launchers.insert(name.clone());
        }
        edges.insert(name, effects.calls);
    }

    loop {
        let mut changed = false;
        for (fn_name, callees) in &edges {
            if launchers.contains(fn_name) {
                continue;
            }
            if callees.iter().any(|c| launchers.contains(c)) {
                launchers.insert(fn_name.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    log::debug!("{} function(s) open go-for regions", launchers.len());
    launchers
}

/// An exported function may not expose varying values in its signature.
pub fn check_signature(name: &str, sig: &FuncSig) -> Result<(), CompileError> {
    if sig.is_pub && sig.exposes_varying() {
        return Err(CompileError::context(
            ContextErrorKind::PublicSpmdSignature,
            format!("public function '{name}' has a varying parameter or return type; keep lane widths internal to the module"),
            sig.span,
        ));
    }
    Ok(())
}

struct ContextWalker<'a> {
    fn_is_spmd: bool,
    in_region: bool,
    types: &'a ExprTypes,
    launchers: &'a HashSet<String>,
    error: Option<CompileError>,
}

impl ContextWalker<'_> {
    fn fail(&mut self, kind: ContextErrorKind, msg: String, span: Span) {
        if self.error.is_none() {
            self.error = Some(CompileError::context(kind, msg, span));
        }
    }

    fn check_condition(&mut self, cond: &Spanned<Expr>, what: &str) {
        if !self.in_region && is_varying_at(self.types, cond.span) {
            self.fail(
                ContextErrorKind::VaryingControlFlowOutsideRegion,
                format!("{what} on a varying condition is only allowed inside an SPMD region"),
                cond.span,
            );
        }
    }
}

impl Visitor for ContextWalker<'_> {
    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        if self.error.is_some() {
            return;
        }
        match &stmt.node {
            Stmt::GoFor { range, body, .. } => {
                if self.fn_is_spmd {
                    self.fail(
                        ContextErrorKind::GoForInSpmdFunctionBody,
                        "go for is not allowed in the body of a function with varying parameters".into(),
                        stmt.span,
                    );
                } else if self.in_region {
                    self.fail(
                        ContextErrorKind::InvalidNestedSpmdRegion,
                        "go for cannot be nested inside another SPMD region".into(),
                        stmt.span,
                    );
                } else {
                    self.visit_expr(range);
                    self.in_region = true;
                    self.visit_block(body);
                    self.in_region = false;
                }
                return;
            }
            Stmt::If { condition, .. } => self.check_condition(condition, "branching"),
            Stmt::While { condition, .. } => self.check_condition(condition, "looping"),
            Stmt::Switch { scrutinee, .. } => self.check_condition(scrutinee, "switching"),
            Stmt::Panic(value) if !self.in_region && is_varying_at(self.types, value.span) => {
                self.fail(
                    ContextErrorKind::VaryingPanicOutsideRegion,
                    "panic with a varying value is only allowed inside an SPMD region".into(),
                    value.span,
                );
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        if self.error.is_some() {
            return;
        }
        if self.in_region
            && let Some(name) = expr.node.call_name()
            && self.launchers.contains(name)
        {
            self.fail(
                ContextErrorKind::InvalidNestedSpmdRegion,
                format!("call to '{name}' opens a go for region inside this SPMD region"),
                expr.span,
            );
            return;
        }
        walk_expr(self, expr);
    }
}

/// Context rules for one type-checked function body.
pub fn check_context(
    func: &Spanned<Function>,
    sig: &FuncSig,
    types: &ExprTypes,
    launchers: &HashSet<String>,
) -> Result<(), CompileError> {
    let mut walker = ContextWalker {
        fn_is_spmd: sig.is_spmd(),
        in_region: sig.is_spmd(),
        types,
        launchers,
        error: None,
    };
    walker.visit_block(&func.node.body);
    match walker.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct GoForCollector<'a> {
    function: &'a str,
    found: Vec<Region<'a>>,
}

impl<'a> GoForCollector<'a> {
    fn collect(&mut self, block: &'a Spanned<Block>) {
        for stmt in &block.node.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &'a Spanned<Stmt>) {
        match &stmt.node {
            Stmt::GoFor { body, .. } => self.found.push(Region {
                kind: RegionKind::GoFor,
                function: self.function,
                span: stmt.span,
                body,
            }),
            Stmt::If { then_block, else_block, .. } => {
                self.collect(then_block);
                if let Some(b) = else_block {
                    self.collect(b);
                }
            }
            Stmt::Switch { cases, default, .. } => {
                for case in cases {
                    self.collect(&case.body);
                }
                if let Some(d) = default {
                    self.collect(d);
                }
            }
            Stmt::TypeSwitch { cases, default, .. } => {
                for case in cases {
                    self.collect(&case.body);
                }
                if let Some(d) = default {
                    self.collect(d);
                }
            }
            Stmt::For { body, .. } | Stmt::While { body, .. } => self.collect(body),
            _ => {}
        }
    }
}

/// The SPMD regions of a context-checked function: its whole body if it is
/// SPMD, otherwise each outermost go-for body.
pub fn regions<'a>(func: &'a Spanned<Function>, sig: &FuncSig) -> Vec<Region<'a>> {
    let name = func.node.name.node.as_str();
    if sig.is_spmd() {
        return vec![Region {
            kind: RegionKind::SpmdFunction,
            function: name,
            span: func.span,
            body: &func.node.body,
        }];
    }
    let mut collector = GoForCollector { function: name, found: Vec::new() };
    collector.collect(&func.node.body);
    log::trace!("'{name}': {} go-for region(s)", collector.found.len());
    collector.found
}
