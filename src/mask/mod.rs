//! Execution mask engine.
//!
//! Walks one SPMD region at a time and decides, statement by statement,
//! whether divergent lanes can still share one static instruction stream.
//! Two facts are threaded through the walk as plain values:
//!
//! - `Flow`: the current mask id plus the lexical varying-condition depth.
//!   Each arm of a varying branch gets a narrowed copy; nothing is restored.
//! - `Alteration`: CLEAN until a `continue` is taken under a varying
//!   condition, TAINTED for the rest of the region after that.
//!
//! Exits (`return`, `break`) and channel operations are legal only at depth 0
//! in a CLEAN region.

pub mod table;

use serde::Serialize;

use crate::ast::*;
use crate::classify::{Region, RegionKind};
use crate::diagnostics::{CompileError, ControlFlowErrorKind};
use crate::span::{Span, Spanned};
use crate::typeck::check::{is_varying_at, ExprTypes};
use crate::typeck::env::TypeEnv;
use crate::visit::{walk_expr, walk_stmt, Visitor};
pub use table::{EntryMask, MaskDef, MaskId, MaskInputs, MaskTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alteration {
    Clean,
    Tainted,
}

impl Alteration {
    /// State after two paths merge.
    pub fn join(self, other: Alteration) -> Alteration {
        if self == Alteration::Tainted || other == Alteration::Tainted {
            Alteration::Tainted
        } else {
            Alteration::Clean
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Flow {
    mask: MaskId,
    depth: u32,
    /// Depth at which the innermost enclosing loop was entered. `break` and
    /// `continue` only leave that loop, and a uniform loop exits for all of
    /// its active lanes together, so a uniform loop nested under a varying
    /// branch may break. Only varying branches inside the loop count.
    /// `return` leaves the whole function and uses `depth` instead.
    loop_base: u32,
}

impl Flow {
    fn narrow(self, mask: MaskId) -> Flow {
        Flow { mask, depth: self.depth + 1, ..self }
    }

    fn enter_loop(self) -> Flow {
        Flow { loop_base: self.depth, ..self }
    }

    fn in_varying_loop_branch(self) -> bool {
        self.depth > self.loop_base
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskPoint {
    pub span: Span,
    pub mask: MaskId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeferredCall {
    pub callee: String,
    pub span: Span,
    /// Mask at registration; the call runs under it during unwind.
    pub mask: MaskId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnSite {
    pub callee: String,
    pub span: Span,
    /// Captured once; the task runs as one unit over these lanes.
    pub mask: MaskId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalleeMask {
    /// Called from uniform code: the callee starts all-true.
    Fresh,
    /// Called inside a region: the callee inherits this mask.
    Caller(MaskId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpmdCall {
    pub caller: String,
    pub callee: String,
    pub span: Span,
    pub mask: CalleeMask,
}

/// What the code generator needs to know about one region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub kind: RegionKind,
    pub function: String,
    pub span: Span,
    pub entry: MaskId,
    pub masks: MaskTable,
    pub points: Vec<MaskPoint>,
    /// In registration order.
    pub defers: Vec<DeferredCall>,
    pub spawns: Vec<SpawnSite>,
    pub calls: Vec<SpmdCall>,
    pub final_state: Alteration,
}

impl RegionReport {
    /// Deferred calls in the order they run: strict reverse registration.
    pub fn unwind_order(&self) -> impl Iterator<Item = &DeferredCall> {
        self.defers.iter().rev()
    }

    pub fn mask_at(&self, span: Span) -> Option<MaskId> {
        self.points.iter().find(|p| p.span == span).map(|p| p.mask)
    }
}

struct Mark {
    masks: usize,
    points: usize,
    defers: usize,
    spawns: usize,
    calls: usize,
}

struct Engine<'a> {
    function: &'a str,
    env: &'a TypeEnv,
    types: &'a ExprTypes,
    masks: MaskTable,
    points: Vec<MaskPoint>,
    defers: Vec<DeferredCall>,
    spawns: Vec<SpawnSite>,
    calls: Vec<SpmdCall>,
}

/// Check one region and collect its mask lineage.
pub fn analyze_region(region: &Region<'_>, env: &TypeEnv, types: &ExprTypes) -> Result<RegionReport, CompileError> {
    let mut engine = Engine {
        function: region.function,
        env,
        types,
        masks: MaskTable::new(),
        points: Vec::new(),
        defers: Vec::new(),
        spawns: Vec::new(),
        calls: Vec::new(),
    };
    let entry = engine.masks.entry(match region.kind {
        RegionKind::GoFor => EntryMask::AllTrue,
        RegionKind::SpmdFunction => EntryMask::Inherited,
    });
    let flow = Flow { mask: entry, depth: 0, loop_base: 0 };
    let final_state = engine.walk_block(&region.body.node, flow, Alteration::Clean)?;
    log::debug!(
        "region {:?} in '{}': {} masks, final state {:?}",
        region.kind,
        region.function,
        engine.masks.len(),
        final_state
    );
    Ok(RegionReport {
        kind: region.kind,
        function: region.function.to_string(),
        span: region.span,
        entry,
        masks: engine.masks,
        points: engine.points,
        defers: engine.defers,
        spawns: engine.spawns,
        calls: engine.calls,
        final_state,
    })
}

impl Engine<'_> {
    fn mark(&self) -> Mark {
        Mark {
            masks: self.masks.len(),
            points: self.points.len(),
            defers: self.defers.len(),
            spawns: self.spawns.len(),
            calls: self.calls.len(),
        }
    }

    fn rewind(&mut self, mark: Mark) {
        self.masks.truncate(mark.masks);
        self.points.truncate(mark.points);
        self.defers.truncate(mark.defers);
        self.spawns.truncate(mark.spawns);
        self.calls.truncate(mark.calls);
    }

    fn is_varying(&self, expr: &Spanned<Expr>) -> bool {
        is_varying_at(self.types, expr.span)
    }

    fn walk_block(&mut self, block: &Block, flow: Flow, state: Alteration) -> Result<Alteration, CompileError> {
        block
            .stmts
            .iter()
            .try_fold(state, |state, stmt| self.walk_stmt(stmt, flow, state))
    }

    /// A loop body runs again after a taint, so a body that taints itself is
    /// re-checked as if entered TAINTED. The second pass records nothing.
    fn walk_loop(&mut self, body: &Block, flow: Flow, state: Alteration) -> Result<Alteration, CompileError> {
        let out = self.walk_block(body, flow, state)?;
        if out == Alteration::Tainted && state == Alteration::Clean {
            let mark = self.mark();
            let again = self.walk_block(body, flow, Alteration::Tainted);
            self.rewind(mark);
            again?;
        }
        Ok(out)
    }

    fn walk_stmt(&mut self, stmt: &Spanned<Stmt>, flow: Flow, state: Alteration) -> Result<Alteration, CompileError> {
        self.points.push(MaskPoint { span: stmt.span, mask: flow.mask });
        match &stmt.node {
            Stmt::Let { value, .. } | Stmt::Assign { value, .. } | Stmt::Expr(value) | Stmt::Panic(value) => {
                self.scan_expr(value, flow, state)?;
                Ok(state)
            }
            Stmt::If { condition, then_block, else_block } => {
                self.scan_expr(condition, flow, state)?;
                let (then_flow, else_flow) = if self.is_varying(condition) {
                    let t = self.masks.and(flow.mask, condition.span);
                    let e = self.masks.and_not(flow.mask, condition.span);
                    (flow.narrow(t), flow.narrow(e))
                } else {
                    (flow, flow)
                };
                let after_then = self.walk_block(&then_block.node, then_flow, state)?;
                let after_else = match else_block {
                    Some(b) => self.walk_block(&b.node, else_flow, state)?,
                    None => state,
                };
                Ok(after_then.join(after_else))
            }
            Stmt::Switch { scrutinee, cases, default } => {
                self.scan_expr(scrutinee, flow, state)?;
                for case in cases {
                    for value in &case.values {
                        self.scan_expr(value, flow, state)?;
                    }
                }
                let varying = self.is_varying(scrutinee);
                let mut out = state;
                for (i, case) in cases.iter().enumerate() {
                    let arm = if varying {
                        flow.narrow(self.masks.case(flow.mask, scrutinee.span, i))
                    } else {
                        flow
                    };
                    out = out.join(self.walk_block(&case.body.node, arm, state)?);
                }
                if let Some(d) = default {
                    let arm = if varying {
                        flow.narrow(self.masks.default_case(flow.mask, scrutinee.span, cases.len()))
                    } else {
                        flow
                    };
                    out = out.join(self.walk_block(&d.node, arm, state)?);
                }
                Ok(out)
            }
            Stmt::TypeSwitch { scrutinee, cases, default, .. } => {
                self.scan_expr(scrutinee, flow, state)?;
                let mut out = state;
                for case in cases {
                    out = out.join(self.walk_block(&case.body.node, flow, state)?);
                }
                if let Some(d) = default {
                    out = out.join(self.walk_block(&d.node, flow, state)?);
                }
                Ok(out)
            }
            Stmt::For { iterable, body, .. } => {
                self.scan_expr(iterable, flow, state)?;
                self.walk_loop(&body.node, flow.enter_loop(), state)
            }
            Stmt::While { condition, body } => {
                self.scan_expr(condition, flow, state)?;
                let looped = flow.enter_loop();
                let inner = if self.is_varying(condition) {
                    looped.narrow(self.masks.and(flow.mask, condition.span))
                } else {
                    looped
                };
                self.walk_loop(&body.node, inner, state)
            }
            Stmt::GoFor { range, body, .. } => {
                // rejected by the classifier before we get here
                self.scan_expr(range, flow, state)?;
                self.walk_loop(&body.node, flow.enter_loop(), state)
            }
            Stmt::Return(value) => {
                if let Some(v) = value {
                    self.scan_expr(v, flow, state)?;
                }
                check_exit(
                    flow.depth > 0,
                    state,
                    ControlFlowErrorKind::VaryingConditionReturn,
                    ControlFlowErrorKind::MaskAlteredReturn,
                    "return",
                    stmt.span,
                )?;
                Ok(state)
            }
            Stmt::Break => {
                check_exit(
                    flow.in_varying_loop_branch(),
                    state,
                    ControlFlowErrorKind::VaryingConditionBreak,
                    ControlFlowErrorKind::MaskAlteredBreak,
                    "break",
                    stmt.span,
                )?;
                Ok(state)
            }
            Stmt::Continue => {
                if flow.in_varying_loop_branch() {
                    if state == Alteration::Clean {
                        log::trace!("'{}': varying continue at {:?} taints the region", self.function, stmt.span);
                    }
                    return Ok(Alteration::Tainted);
                }
                Ok(state)
            }
            Stmt::Defer(call) => {
                self.scan_call_args(call, flow, state)?;
                self.defers.push(DeferredCall {
                    callee: callee_name(call),
                    span: stmt.span,
                    mask: flow.mask,
                });
                Ok(state)
            }
            Stmt::Spawn(call) => {
                self.scan_call_args(call, flow, state)?;
                self.spawns.push(SpawnSite {
                    callee: callee_name(call),
                    span: stmt.span,
                    mask: flow.mask,
                });
                Ok(state)
            }
            Stmt::Send { chan, value } => {
                self.scan_expr(chan, flow, state)?;
                self.scan_expr(value, flow, state)?;
                check_channel(flow, state, "send", stmt.span)?;
                Ok(state)
            }
        }
    }

    /// Record SPMD calls and check receives inside an expression.
    fn scan_expr(&mut self, expr: &Spanned<Expr>, flow: Flow, state: Alteration) -> Result<(), CompileError> {
        match &expr.node {
            Expr::Call { name, args } => {
                for arg in args {
                    self.scan_expr(arg, flow, state)?;
                }
                if self.env.is_spmd_fn(&name.node) {
                    self.calls.push(SpmdCall {
                        caller: self.function.to_string(),
                        callee: name.node.clone(),
                        span: expr.span,
                        mask: CalleeMask::Caller(flow.mask),
                    });
                }
                Ok(())
            }
            Expr::Recv { chan } => {
                self.scan_expr(chan, flow, state)?;
                check_channel(flow, state, "receive", expr.span)
            }
            Expr::BinOp { lhs, rhs, .. } => {
                self.scan_expr(lhs, flow, state)?;
                self.scan_expr(rhs, flow, state)
            }
            Expr::Range { start, end } => {
                self.scan_expr(start, flow, state)?;
                self.scan_expr(end, flow, state)
            }
            Expr::UnaryOp { operand: inner, .. } | Expr::Cast { expr: inner, .. } => self.scan_expr(inner, flow, state),
            Expr::IntLit(_) | Expr::FloatLit(_) | Expr::BoolLit(_) | Expr::Ident(_) => Ok(()),
        }
    }

    /// Deferred and spawned calls evaluate their arguments now but run the
    /// callee later under the captured mask.
    fn scan_call_args(&mut self, call: &Spanned<Expr>, flow: Flow, state: Alteration) -> Result<(), CompileError> {
        if let Expr::Call { args, .. } = &call.node {
            for arg in args {
                self.scan_expr(arg, flow, state)?;
            }
        }
        Ok(())
    }
}

fn callee_name(call: &Spanned<Expr>) -> String {
    call.node.call_name().unwrap_or_default().to_string()
}

fn check_exit(
    varying: bool,
    state: Alteration,
    varying_kind: ControlFlowErrorKind,
    altered_kind: ControlFlowErrorKind,
    what: &str,
    span: Span,
) -> Result<(), CompileError> {
    if varying {
        return Err(CompileError::control_flow(
            varying_kind,
            format!("{what} under a varying condition would let only some lanes leave"),
            span,
        ));
    }
    if state == Alteration::Tainted {
        return Err(CompileError::control_flow(
            altered_kind,
            format!("{what} after a varying continue: lanes no longer agree on loop position"),
            span,
        ));
    }
    Ok(())
}

fn check_channel(flow: Flow, state: Alteration, what: &str, span: Span) -> Result<(), CompileError> {
    check_exit(
        flow.depth > 0,
        state,
        ControlFlowErrorKind::VaryingConditionChannelOp,
        ControlFlowErrorKind::MaskAlteredChannelOp,
        &format!("channel {what}"),
        span,
    )
}

struct FreshCalls<'a> {
    caller: &'a str,
    env: &'a TypeEnv,
    found: Vec<SpmdCall>,
}

impl Visitor for FreshCalls<'_> {
    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        // go-for bodies are regions; their calls are recorded there
        if !matches!(stmt.node, Stmt::GoFor { .. }) {
            walk_stmt(self, stmt);
        }
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        if let Some(name) = expr.node.call_name()
            && self.env.is_spmd_fn(name)
        {
            self.found.push(SpmdCall {
                caller: self.caller.to_string(),
                callee: name.to_string(),
                span: expr.span,
                mask: CalleeMask::Fresh,
            });
        }
        walk_expr(self, expr);
    }
}

/// SPMD calls made from the uniform part of a non-SPMD function. Each one
/// starts the callee with a fresh all-true mask.
pub fn fresh_calls(func: &Spanned<Function>, env: &TypeEnv) -> Vec<SpmdCall> {
    if env.is_spmd_fn(&func.node.name.node) {
        return Vec::new();
    }
    let mut v = FreshCalls { caller: &func.node.name.node, env, found: Vec::new() };
    v.visit_block(&func.node.body);
    v.found
}
