use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeErrorKind {
    MismatchedConstraint,
    IllegalUpcast,
    NonConstantConstraint,
    OperationOnUniversalConstrained,
    TypeMismatch,
    Unresolved,
    ConstraintTooWide,
    VaryingToUniform,
    NonConstantLaneIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextErrorKind {
    #[serde(rename = "InvalidNestedSPMDRegion")]
    InvalidNestedSpmdRegion,
    #[serde(rename = "GoForInSPMDFunctionBody")]
    GoForInSpmdFunctionBody,
    #[serde(rename = "PublicSPMDSignature")]
    PublicSpmdSignature,
    VaryingControlFlowOutsideRegion,
    VaryingPanicOutsideRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlFlowErrorKind {
    VaryingConditionReturn,
    VaryingConditionBreak,
    MaskAlteredReturn,
    MaskAlteredBreak,
    VaryingConditionChannelOp,
    MaskAlteredChannelOp,
    UniformAssignInVaryingBranch,
}

/// The kind of a checker diagnostic, grouped by the pass that raises it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "kind")]
pub enum DiagnosticKind {
    Type(TypeErrorKind),
    Context(ContextErrorKind),
    ControlFlow(ControlFlowErrorKind),
}

impl DiagnosticKind {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::Type(k) => match k {
                TypeErrorKind::MismatchedConstraint => "MismatchedConstraint",
                TypeErrorKind::IllegalUpcast => "IllegalUpcast",
                TypeErrorKind::NonConstantConstraint => "NonConstantConstraint",
                TypeErrorKind::OperationOnUniversalConstrained => "OperationOnUniversalConstrained",
                TypeErrorKind::TypeMismatch => "TypeMismatch",
                TypeErrorKind::Unresolved => "Unresolved",
                TypeErrorKind::ConstraintTooWide => "ConstraintTooWide",
                TypeErrorKind::VaryingToUniform => "VaryingToUniform",
                TypeErrorKind::NonConstantLaneIndex => "NonConstantLaneIndex",
            },
            DiagnosticKind::Context(k) => match k {
                ContextErrorKind::InvalidNestedSpmdRegion => "InvalidNestedSPMDRegion",
                ContextErrorKind::GoForInSpmdFunctionBody => "GoForInSPMDFunctionBody",
                ContextErrorKind::PublicSpmdSignature => "PublicSPMDSignature",
                ContextErrorKind::VaryingControlFlowOutsideRegion => "VaryingControlFlowOutsideRegion",
                ContextErrorKind::VaryingPanicOutsideRegion => "VaryingPanicOutsideRegion",
            },
            DiagnosticKind::ControlFlow(k) => match k {
                ControlFlowErrorKind::VaryingConditionReturn => "VaryingConditionReturn",
                ControlFlowErrorKind::VaryingConditionBreak => "VaryingConditionBreak",
                ControlFlowErrorKind::MaskAlteredReturn => "MaskAlteredReturn",
                ControlFlowErrorKind::MaskAlteredBreak => "MaskAlteredBreak",
                ControlFlowErrorKind::VaryingConditionChannelOp => "VaryingConditionChannelOp",
                ControlFlowErrorKind::MaskAlteredChannelOp => "MaskAlteredChannelOp",
                ControlFlowErrorKind::UniformAssignInVaryingBranch => "UniformAssignInVaryingBranch",
            },
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("type error: {msg}")]
    Type { kind: TypeErrorKind, msg: String, span: Span },

    #[error("context error: {msg}")]
    Context { kind: ContextErrorKind, msg: String, span: Span },

    #[error("control flow error: {msg}")]
    ControlFlow { kind: ControlFlowErrorKind, msg: String, span: Span },

    #[error("target config error: {msg}")]
    Config { msg: String, path: Option<PathBuf> },
}

impl CompileError {
    pub fn type_err(kind: TypeErrorKind, msg: impl Into<String>, span: Span) -> Self {
        Self::Type { kind, msg: msg.into(), span }
    }

    pub fn context(kind: ContextErrorKind, msg: impl Into<String>, span: Span) -> Self {
        Self::Context { kind, msg: msg.into(), span }
    }

    pub fn control_flow(kind: ControlFlowErrorKind, msg: impl Into<String>, span: Span) -> Self {
        Self::ControlFlow { kind, msg: msg.into(), span }
    }

    pub fn config(msg: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    /// The checker kind, or `None` for configuration failures.
    pub fn kind(&self) -> Option<DiagnosticKind> {
        match self {
            CompileError::Type { kind, .. } => Some(DiagnosticKind::Type(*kind)),
            CompileError::Context { kind, .. } => Some(DiagnosticKind::Context(*kind)),
            CompileError::ControlFlow { kind, .. } => Some(DiagnosticKind::ControlFlow(*kind)),
            CompileError::Config { .. } => None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Type { span, .. }
            | CompileError::Context { span, .. }
            | CompileError::ControlFlow { span, .. } => Some(*span),
            CompileError::Config { .. } => None,
        }
    }

    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        let (kind, span) = (self.kind()?, self.span()?);
        let message = match self {
            CompileError::Type { msg, .. }
            | CompileError::Context { msg, .. }
            | CompileError::ControlFlow { msg, .. } => msg.clone(),
            CompileError::Config { .. } => return None,
        };
        Some(Diagnostic { kind, span, message })
    }
}

/// Structured record handed to the diagnostics sink. The checker never formats
/// or prints these itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub message: String,
}

pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Render a diagnostic with ariadne, without colors, into `out`.
pub fn render_diagnostic(
    source: &str,
    diagnostic: &Diagnostic,
    out: &mut impl std::io::Write,
) -> std::io::Result<()> {
    use ariadne::{Config, Label, Report, ReportKind, Source};

    let span = diagnostic.span;
    Report::build(ReportKind::Error, (), span.start)
        .with_config(Config::default().with_color(false))
        .with_message(diagnostic.kind.name())
        .with_label(Label::new(span.range()).with_message(&diagnostic.message))
        .finish()
        .write(Source::from(source), out)
}

/// Render a CompileError to stderr for terminal tooling.
pub fn render_error(source: &str, err: &CompileError) {
    match err.to_diagnostic() {
        Some(diagnostic) => {
            let mut stderr = std::io::stderr();
            if render_diagnostic(source, &diagnostic, &mut stderr).is_err() {
                eprintln!("error: {err}");
            }
        }
        None => match err {
            CompileError::Config { msg, path: Some(path) } => {
                eprintln!("error[config]: {msg}");
                eprintln!("  --> {}", path.display());
            }
            _ => eprintln!("error: {err}"),
        },
    }
}
