#![allow(dead_code)]

use lanec::ast::Program;
use lanec::config::TargetConfig;
use lanec::diagnostics::DiagnosticKind;
use lanec::{Analysis, check_program};

pub fn analyze(program: &Program) -> Analysis {
    check_program(program, TargetConfig::default())
}

pub fn analyze_on(program: &Program, preset: &str) -> Analysis {
    let target = TargetConfig::preset(preset).unwrap_or_else(|| panic!("unknown preset {preset}"));
    check_program(program, target)
}

pub fn kinds(analysis: &Analysis) -> Vec<DiagnosticKind> {
    analysis.diagnostics.iter().map(|d| d.kind).collect()
}

pub fn assert_accepts(program: &Program) -> Analysis {
    let analysis = analyze(program);
    assert!(analysis.is_ok(), "unexpected diagnostics: {:#?}", analysis.diagnostics);
    analysis
}

pub fn assert_rejects(program: &Program, kind: DiagnosticKind) -> Analysis {
    let analysis = analyze(program);
    assert_eq!(kinds(&analysis), vec![kind], "diagnostics: {:#?}", analysis.diagnostics);
    analysis
}
