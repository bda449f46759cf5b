use std::collections::HashMap;

use super::types::LaneType;
use crate::config::TargetConfig;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct FuncSig {
    pub params: Vec<LaneType>,
    pub return_type: LaneType,
    pub is_pub: bool,
    pub span: Span,
}

impl FuncSig {
    /// A function is SPMD iff it declares at least one varying parameter.
    pub fn is_spmd(&self) -> bool {
        self.params.iter().any(LaneType::is_varying)
    }

    pub fn exposes_varying(&self) -> bool {
        self.is_spmd() || self.return_type.is_varying()
    }
}

/// A local binding. `varying_depth` is the varying-condition depth at which
/// it was declared, used to reject uniform writes from narrower masks.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: LaneType,
    pub varying_depth: u32,
}

#[derive(Debug)]
pub struct TypeEnv {
    scopes: Vec<HashMap<String, Binding>>,
    pub functions: HashMap<String, FuncSig>,
    pub consts: HashMap<String, i64>,
    pub target: TargetConfig,
}

impl TypeEnv {
    pub fn new(target: TargetConfig) -> Self {
        Self {
            scopes: vec![HashMap::new()],
            functions: HashMap::new(),
            consts: HashMap::new(),
            target,
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Drop scopes left open by a check that bailed out early.
    pub fn truncate_scopes(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }

    pub fn define(&mut self, name: String, ty: LaneType, varying_depth: u32) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, Binding { ty, varying_depth });
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn is_spmd_fn(&self, name: &str) -> bool {
        self.functions.get(name).is_some_and(FuncSig::is_spmd)
    }
}
