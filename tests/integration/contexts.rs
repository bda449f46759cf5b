mod common;
use common::*;

use lanec::ast::BinOp;
use lanec::ast::build::*;
use lanec::classify::RegionKind;
use lanec::diagnostics::{ContextErrorKind, DiagnosticKind};
use lanec::mask::{CalleeMask, EntryMask, MaskDef};

fn ctx(kind: ContextErrorKind) -> DiagnosticKind {
    DiagnosticKind::Context(kind)
}

#[test]
fn go_for_nested_in_go_for() {
    let p = program(vec![func(
        "f",
        vec![],
        None,
        vec![go_for(
            "i",
            range(int(0), int(16)),
            vec![go_for("j", range(int(0), int(16)), vec![])],
        )],
    )]);
    assert_rejects(&p, ctx(ContextErrorKind::InvalidNestedSpmdRegion));
}

#[test]
fn go_for_nested_under_uniform_branch_in_go_for() {
    let p = program(vec![func(
        "f",
        vec![param("n", uniform("int32"))],
        None,
        vec![go_for(
            "i",
            range(int(0), int(16)),
            vec![if_(
                bin(BinOp::Gt, ident("n"), int(2)),
                vec![go_for("j", range(int(0), int(4)), vec![])],
            )],
        )],
    )]);
    assert_rejects(&p, ctx(ContextErrorKind::InvalidNestedSpmdRegion));
}

#[test]
fn go_for_in_spmd_function_body() {
    let p = program(vec![func(
        "f",
        vec![param("x", varying("float32"))],
        None,
        vec![go_for("i", range(int(0), int(8)), vec![])],
    )]);
    assert_rejects(&p, ctx(ContextErrorKind::GoForInSpmdFunctionBody));
}

#[test]
fn nested_region_through_call_chain() {
    let p = program(vec![
        func("leaf", vec![], None, vec![go_for("k", range(int(0), int(8)), vec![])]),
        func("middle", vec![], None, vec![expr(call("leaf", vec![]))]),
        func(
            "outer",
            vec![],
            None,
            vec![go_for("i", range(int(0), int(8)), vec![expr(call("middle", vec![]))])],
        ),
    ]);
    let a = assert_rejects(&p, ctx(ContextErrorKind::InvalidNestedSpmdRegion));
    assert_eq!(a.regions_of("leaf").count(), 1);
}

#[test]
fn spmd_function_calling_region_launcher() {
    let p = program(vec![
        func("launch", vec![], None, vec![go_for("k", range(int(0), int(8)), vec![])]),
        func("f", vec![param("x", varying("int32"))], None, vec![expr(call("launch", vec![]))]),
    ]);
    assert_rejects(&p, ctx(ContextErrorKind::InvalidNestedSpmdRegion));
}

#[test]
fn sequential_go_fors_are_separate_regions() {
    let p = program(vec![func(
        "f",
        vec![],
        None,
        vec![
            go_for("i", range(int(0), int(8)), vec![]),
            go_for_n("j", 4, range(int(0), int(8)), vec![]),
        ],
    )]);
    let a = assert_accepts(&p);
    let regions: Vec<_> = a.regions_of("f").collect();
    assert_eq!(regions.len(), 2);
    for r in regions {
        assert_eq!(r.kind, RegionKind::GoFor);
        assert_eq!(r.masks.get(r.entry), Some(&MaskDef::Entry(EntryMask::AllTrue)));
    }
}

// ── Visibility ──────────────────────────────────────────────────────────────

#[test]
fn exported_varying_parameter_rejected() {
    let p = program(vec![pub_func("f", vec![param("x", varying("int32"))], None, vec![])]);
    assert_rejects(&p, ctx(ContextErrorKind::PublicSpmdSignature));
}

#[test]
fn same_signature_unexported_accepted() {
    let p = program(vec![func("f", vec![param("x", varying("int32"))], None, vec![])]);
    let a = assert_accepts(&p);
    let r = a.regions_of("f").next().unwrap();
    assert_eq!(r.kind, RegionKind::SpmdFunction);
    assert_eq!(r.masks.get(r.entry), Some(&MaskDef::Entry(EntryMask::Inherited)));
}

#[test]
fn exported_varying_return_rejected() {
    let p = program(vec![pub_func(
        "f",
        vec![param("n", uniform("int32"))],
        Some(varying("int32")),
        vec![ret(Some(ident("n")))],
    )]);
    assert_rejects(&p, ctx(ContextErrorKind::PublicSpmdSignature));
}

#[test]
fn exported_uniform_signature_accepted() {
    let p = program(vec![pub_func(
        "f",
        vec![param("n", uniform("int32"))],
        None,
        vec![go_for("i", range(int(0), ident("n")), vec![])],
    )]);
    assert_accepts(&p);
}

// ── Callee masks ────────────────────────────────────────────────────────────

#[test]
fn spmd_call_inherits_caller_mask() {
    let guarded = call("kernel", vec![ident("i")]);
    let cond = bin(BinOp::Lt, ident("i"), int(10));
    let p = program(vec![
        func("kernel", vec![param("x", varying("int64"))], None, vec![]),
        func(
            "f",
            vec![],
            None,
            vec![go_for("i", range(int(0), int(16)), vec![if_(cond, vec![expr(guarded)])])],
        ),
    ]);
    let a = assert_accepts(&p);
    let r = a.regions_of("f").next().unwrap();
    assert_eq!(r.calls.len(), 1);
    let CalleeMask::Caller(m) = r.calls[0].mask else {
        panic!("expected the caller's mask");
    };
    assert!(matches!(r.masks.get(m), Some(MaskDef::And { .. })));
    assert!(a.fresh_calls.is_empty());
}

#[test]
fn spmd_call_from_uniform_code_is_fresh() {
    let p = program(vec![
        func("kernel", vec![param("x", varying("int64"))], None, vec![]),
        func("main", vec![], None, vec![expr(call("kernel", vec![int(7)]))]),
    ]);
    let a = assert_accepts(&p);
    assert_eq!(a.fresh_calls.len(), 1);
    assert_eq!(a.fresh_calls[0].caller, "main");
    assert_eq!(a.fresh_calls[0].mask, CalleeMask::Fresh);
}

// ── Varying values outside regions ──────────────────────────────────────────

fn producer() -> lanec::span::Spanned<lanec::ast::Function> {
    func(
        "lanes_of",
        vec![param("n", uniform("int32"))],
        Some(varying("int32")),
        vec![ret(Some(ident("n")))],
    )
}

#[test]
fn varying_branch_outside_region() {
    let p = program(vec![
        producer(),
        func(
            "f",
            vec![],
            None,
            vec![
                let_("v", call("lanes_of", vec![int(3)])),
                if_(bin(BinOp::Gt, ident("v"), int(0)), vec![]),
            ],
        ),
    ]);
    assert_rejects(&p, ctx(ContextErrorKind::VaryingControlFlowOutsideRegion));
}

#[test]
fn varying_panic_outside_region() {
    let p = program(vec![
        producer(),
        func("f", vec![], None, vec![let_("v", call("lanes_of", vec![int(3)])), panic(ident("v"))]),
    ]);
    assert_rejects(&p, ctx(ContextErrorKind::VaryingPanicOutsideRegion));
}

#[test]
fn varying_panic_inside_region() {
    let p = program(vec![func(
        "f",
        vec![],
        None,
        vec![go_for("i", range(int(0), int(8)), vec![panic(ident("i"))])],
    )]);
    assert_accepts(&p);
}
