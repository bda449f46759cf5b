mod common;
use common::*;

use lanec::ast::BinOp;
use lanec::ast::build::*;
use lanec::diagnostics::{ControlFlowErrorKind, DiagnosticKind};
use lanec::mask::{Alteration, EntryMask, MaskDef};

fn flow(kind: ControlFlowErrorKind) -> DiagnosticKind {
    DiagnosticKind::ControlFlow(kind)
}

/// `f(n int32)` with one go-for over `i` wrapping `body`.
fn go_for_fn(body: Vec<lanec::span::Spanned<lanec::ast::Stmt>>) -> lanec::ast::Program {
    program(vec![func(
        "f",
        vec![param("n", uniform("int32"))],
        None,
        vec![go_for("i", range(int(0), int(64)), body)],
    )])
}

fn i_gt(k: i64) -> lanec::span::Spanned<lanec::ast::Expr> {
    bin(BinOp::Gt, ident("i"), int(k))
}

fn n_gt(k: i64) -> lanec::span::Spanned<lanec::ast::Expr> {
    bin(BinOp::Gt, ident("n"), int(k))
}

// ── Exits ───────────────────────────────────────────────────────────────────

#[test]
fn return_after_varying_continue() {
    let p = go_for_fn(vec![
        for_("j", range(int(0), ident("n")), vec![if_(i_gt(4), vec![cont()])]),
        if_(n_gt(2), vec![ret(None)]),
    ]);
    assert_rejects(&p, flow(ControlFlowErrorKind::MaskAlteredReturn));
}

#[test]
fn return_after_uniform_continue() {
    let p = go_for_fn(vec![
        for_("j", range(int(0), ident("n")), vec![if_(n_gt(4), vec![cont()])]),
        if_(n_gt(2), vec![ret(None)]),
    ]);
    assert_accepts(&p);
}

#[test]
fn return_under_varying_condition() {
    let p = program(vec![func(
        "f",
        vec![param("x", varying("float64"))],
        None,
        vec![if_(bin(BinOp::Lt, ident("x"), float(0.0)), vec![ret(None)])],
    )]);
    assert_rejects(&p, flow(ControlFlowErrorKind::VaryingConditionReturn));
}

#[test]
fn return_nested_below_varying_then_uniform() {
    let p = go_for_fn(vec![if_(i_gt(1), vec![if_(n_gt(1), vec![ret(None)])])]);
    assert_rejects(&p, flow(ControlFlowErrorKind::VaryingConditionReturn));
}

#[test]
fn break_under_varying_condition() {
    let p = go_for_fn(vec![for_(
        "j",
        range(int(0), int(8)),
        vec![if_(bin(BinOp::Gt, ident("i"), ident("j")), vec![brk()])],
    )]);
    assert_rejects(&p, flow(ControlFlowErrorKind::VaryingConditionBreak));
}

#[test]
fn break_after_varying_continue() {
    let p = go_for_fn(vec![for_(
        "j",
        range(int(0), int(8)),
        vec![if_(i_gt(2), vec![cont()]), if_(n_gt(1), vec![brk()])],
    )]);
    assert_rejects(&p, flow(ControlFlowErrorKind::MaskAlteredBreak));
}

#[test]
fn uniform_break_in_clean_loop() {
    let p = go_for_fn(vec![for_("j", range(int(0), int(8)), vec![if_(n_gt(1), vec![brk()])])]);
    assert_accepts(&p);
}

#[test]
fn uniform_assignment_in_varying_branch() {
    let p = go_for_fn(vec![let_("total", int(0)), if_(i_gt(3), vec![assign("total", int(1))])]);
    assert_rejects(&p, flow(ControlFlowErrorKind::UniformAssignInVaryingBranch));
}

#[test]
fn varying_assignment_in_varying_branch() {
    let p = go_for_fn(vec![let_("acc", ident("i")), if_(i_gt(3), vec![assign("acc", int(0))])]);
    assert_accepts(&p);
}

// ── Mask lineage ────────────────────────────────────────────────────────────

#[test]
fn nested_branch_lineage() {
    let outer = i_gt(1);
    let inner = i_gt(5);
    let (outer_span, inner_span) = (outer.span, inner.span);
    let leaf = let_("z", int(0));
    let leaf_span = leaf.span;
    let p = go_for_fn(vec![if_(outer, vec![if_else(inner, vec![], vec![leaf])])]);
    let a = assert_accepts(&p);
    let r = a.regions_of("f").next().unwrap();

    let m = r.mask_at(leaf_span).unwrap();
    let chain = r.masks.lineage(m);
    assert_eq!(chain.len(), 3);
    assert_eq!(r.masks.get(chain[0]), Some(&MaskDef::Entry(EntryMask::AllTrue)));
    assert_eq!(r.masks.get(chain[1]), Some(&MaskDef::And { parent: chain[0], cond: outer_span }));
    assert_eq!(r.masks.get(chain[2]), Some(&MaskDef::AndNot { parent: chain[1], cond: inner_span }));
}

#[test]
fn uniform_branch_keeps_mask() {
    let leaf = let_("z", int(0));
    let leaf_span = leaf.span;
    let p = go_for_fn(vec![if_(n_gt(1), vec![leaf])]);
    let a = assert_accepts(&p);
    let r = a.regions_of("f").next().unwrap();
    assert_eq!(r.mask_at(leaf_span), Some(r.entry));
    assert_eq!(r.masks.len(), 1);
}

#[test]
fn varying_switch_case_masks() {
    let scrutinee = ident("x");
    let scrutinee_span = scrutinee.span;
    let (a0, a1, d) = (let_("a", int(0)), let_("b", int(1)), let_("c", int(2)));
    let spans = (a0.span, a1.span, d.span);
    let p = program(vec![func(
        "f",
        vec![param("x", varying("int32"))],
        None,
        vec![switch(
            scrutinee,
            vec![(vec![int(1)], vec![a0]), (vec![int(2), int(3)], vec![a1])],
            Some(vec![d]),
        )],
    )]);
    let a = assert_accepts(&p);
    let r = a.regions_of("f").next().unwrap();
    let entry = r.entry;

    let m = r.mask_at(spans.0).unwrap();
    assert_eq!(r.masks.get(m), Some(&MaskDef::Case { parent: entry, scrutinee: scrutinee_span, index: 0 }));
    let m = r.mask_at(spans.1).unwrap();
    assert_eq!(r.masks.get(m), Some(&MaskDef::Case { parent: entry, scrutinee: scrutinee_span, index: 1 }));
    let m = r.mask_at(spans.2).unwrap();
    assert_eq!(r.masks.get(m), Some(&MaskDef::Default { parent: entry, scrutinee: scrutinee_span, cases: 2 }));
}

#[test]
fn return_in_varying_switch_arm() {
    let p = program(vec![func(
        "f",
        vec![param("x", varying("int32"))],
        None,
        vec![switch(ident("x"), vec![(vec![int(1)], vec![ret(None)])], None)],
    )]);
    assert_rejects(&p, flow(ControlFlowErrorKind::VaryingConditionReturn));
}

#[test]
fn return_in_uniform_switch_arm() {
    let p = go_for_fn(vec![switch(ident("n"), vec![(vec![int(1)], vec![ret(None)])], None)]);
    assert_accepts(&p);
}

// ── Defers and final state ──────────────────────────────────────────────────

#[test]
fn defers_run_in_reverse_with_their_masks() {
    let p = program(vec![
        func("close_a", vec![], None, vec![]),
        func("close_b", vec![], None, vec![]),
        func("close_c", vec![], None, vec![]),
        func(
            "f",
            vec![],
            None,
            vec![go_for(
                "i",
                range(int(0), int(16)),
                vec![
                    defer(call("close_a", vec![])),
                    if_(i_gt(7), vec![defer(call("close_b", vec![]))]),
                    defer(call("close_c", vec![])),
                ],
            )],
        ),
    ]);
    let a = assert_accepts(&p);
    let r = a.regions_of("f").next().unwrap();
    let order: Vec<&str> = r.unwind_order().map(|d| d.callee.as_str()).collect();
    assert_eq!(order, vec!["close_c", "close_b", "close_a"]);
    let masks: Vec<_> = r.unwind_order().map(|d| d.mask).collect();
    assert_eq!(masks[0], r.entry);
    assert_eq!(masks[2], r.entry);
    assert!(matches!(r.masks.get(masks[1]), Some(MaskDef::And { .. })));
}

#[test]
fn final_state_reports_taint() {
    let tainted = go_for_fn(vec![if_(i_gt(2), vec![cont()])]);
    let a = assert_accepts(&tainted);
    assert_eq!(a.regions_of("f").next().unwrap().final_state, Alteration::Tainted);

    let clean = go_for_fn(vec![if_(n_gt(2), vec![cont()])]);
    let a = assert_accepts(&clean);
    assert_eq!(a.regions_of("f").next().unwrap().final_state, Alteration::Clean);
}

#[test]
fn loop_back_edge_carries_taint() {
    // the break precedes the continue, but runs again on the next iteration
    let p = go_for_fn(vec![for_(
        "j",
        range(int(0), int(8)),
        vec![if_(n_gt(5), vec![brk()]), if_(i_gt(2), vec![cont()])],
    )]);
    assert_rejects(&p, flow(ControlFlowErrorKind::MaskAlteredBreak));
}
