pub mod span;
pub mod diagnostics;
pub mod ast;
pub mod visit;
pub mod config;
pub mod typeck;
pub mod classify;
pub mod mask;
pub mod lanes;
pub mod convert;
pub mod spawn;

use std::collections::{HashMap, HashSet};

use ast::{Function, Program};
use config::TargetConfig;
use diagnostics::{CompileError, Diagnostic, DiagnosticSink};
use mask::{RegionReport, SpmdCall};
use span::Spanned;
use typeck::env::{FuncSig, TypeEnv};

/// Everything the checker hands to code generation.
#[derive(Debug)]
pub struct Analysis {
    /// Signatures that resolved, including those of functions that later failed.
    pub signatures: HashMap<String, FuncSig>,
    pub regions: Vec<RegionReport>,
    /// SPMD calls from uniform code; each starts its callee all-true.
    pub fresh_calls: Vec<SpmdCall>,
    /// At most one per failing declaration.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn regions_of<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a RegionReport> + 'a {
        self.regions.iter().filter(move |r| r.function == function)
    }

    pub fn emit_to(&self, sink: &mut impl DiagnosticSink) {
        for d in &self.diagnostics {
            sink.emit(d.clone());
        }
    }

    pub fn diagnostics_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.diagnostics)
    }
}

/// Check a whole program (types → SPMD contexts → mask legality). A failing
/// declaration is reported and skipped; the rest are still checked.
pub fn check_program(program: &Program, target: TargetConfig) -> Analysis {
    let mut env = TypeEnv::new(target);
    let mut errors: Vec<CompileError> = typeck::resolve::register_consts(program, &mut env);
    errors.extend(
        typeck::resolve::register_functions(program, &mut env)
            .into_iter()
            .map(|(_, e)| e),
    );
    let launchers = classify::region_launchers(program);

    let mut regions = Vec::new();
    let mut fresh_calls = Vec::new();
    for func in &program.functions {
        let name = &func.node.name.node;
        let Some(sig) = env.functions.get(name).cloned() else {
            continue;
        };
        log::debug!("checking '{name}' (spmd: {})", sig.is_spmd());
        match check_declaration(func, &sig, &mut env, &launchers) {
            Ok((reports, calls)) => {
                regions.extend(reports);
                fresh_calls.extend(calls);
            }
            Err(e) => {
                log::debug!("'{name}' rejected: {e}");
                errors.push(e);
            }
        }
    }

    Analysis {
        signatures: env.functions,
        regions,
        fresh_calls,
        diagnostics: errors.iter().filter_map(CompileError::to_diagnostic).collect(),
    }
}

/// `check_program` against the target named by `LANEC_TARGET`.
pub fn check_program_from_env(program: &Program) -> Result<Analysis, CompileError> {
    Ok(check_program(program, TargetConfig::from_env()?))
}

fn check_declaration(
    func: &Spanned<Function>,
    sig: &FuncSig,
    env: &mut TypeEnv,
    launchers: &HashSet<String>,
) -> Result<(Vec<RegionReport>, Vec<SpmdCall>), CompileError> {
    classify::check_signature(&func.node.name.node, sig)?;
    let types = typeck::check::check_function(func, env)?;
    classify::check_context(func, sig, &types, launchers)?;
    let reports = classify::regions(func, sig)
        .iter()
        .map(|r| mask::analyze_region(r, env, &types))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((reports, mask::fresh_calls(func, env)))
}
