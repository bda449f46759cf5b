use serde::Serialize;

use crate::lanes::{LaneError, Mask};
use crate::span::Span;

/// Handle to an immutable mask definition. Masks are never updated in
/// place: each branch arm derives a new id from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MaskId(u32);

impl MaskId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryMask {
    /// Go-for bodies, and SPMD functions called from uniform code.
    AllTrue,
    /// SPMD function bodies: the caller's mask at the call site.
    Inherited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MaskDef {
    Entry(EntryMask),
    And { parent: MaskId, cond: Span },
    AndNot { parent: MaskId, cond: Span },
    /// Lanes whose scrutinee matches case `index` and no earlier case.
    Case { parent: MaskId, scrutinee: Span, index: usize },
    /// Lanes matching none of the `cases` cases.
    Default { parent: MaskId, scrutinee: Span, cases: usize },
}

impl MaskDef {
    pub fn parent(&self) -> Option<MaskId> {
        match self {
            MaskDef::Entry(_) => None,
            MaskDef::And { parent, .. }
            | MaskDef::AndNot { parent, .. }
            | MaskDef::Case { parent, .. }
            | MaskDef::Default { parent, .. } => Some(*parent),
        }
    }
}

/// Runtime values needed to turn mask definitions into concrete masks.
pub trait MaskInputs {
    fn entry(&self, kind: EntryMask) -> Mask;
    /// Per-lane value of the varying condition at `span`.
    fn condition(&self, span: Span) -> Option<Mask>;
    /// Lanes whose scrutinee at `span` equals one of case `index`'s values.
    fn case_match(&self, scrutinee: Span, index: usize) -> Option<Mask>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaskTable {
    defs: Vec<MaskDef>,
}

impl MaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, def: MaskDef) -> MaskId {
        let id = MaskId(self.defs.len() as u32);
        self.defs.push(def);
        id
    }

    pub fn entry(&mut self, kind: EntryMask) -> MaskId {
        self.push(MaskDef::Entry(kind))
    }

    pub fn and(&mut self, parent: MaskId, cond: Span) -> MaskId {
        self.push(MaskDef::And { parent, cond })
    }

    pub fn and_not(&mut self, parent: MaskId, cond: Span) -> MaskId {
        self.push(MaskDef::AndNot { parent, cond })
    }

    pub fn case(&mut self, parent: MaskId, scrutinee: Span, index: usize) -> MaskId {
        self.push(MaskDef::Case { parent, scrutinee, index })
    }

    pub fn default_case(&mut self, parent: MaskId, scrutinee: Span, cases: usize) -> MaskId {
        self.push(MaskDef::Default { parent, scrutinee, cases })
    }

    pub fn get(&self, id: MaskId) -> Option<&MaskDef> {
        self.defs.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.defs.truncate(len);
    }

    /// Ids from the region entry down to `id`.
    pub fn lineage(&self, id: MaskId) -> Vec<MaskId> {
        let mut chain = vec![id];
        let mut cur = id;
        while let Some(parent) = self.get(cur).and_then(MaskDef::parent) {
            chain.push(parent);
            cur = parent;
        }
        chain.reverse();
        chain
    }

    /// Number of varying narrowings between the entry and `id`.
    pub fn depth(&self, id: MaskId) -> usize {
        self.lineage(id).len().saturating_sub(1)
    }

    /// Concrete lanes of `id`. Returns `Ok(None)` when an input is missing.
    pub fn evaluate(&self, id: MaskId, inputs: &impl MaskInputs) -> Result<Option<Mask>, LaneError> {
        let Some(def) = self.get(id) else {
            return Ok(None);
        };
        let parent = match def.parent() {
            Some(p) => match self.evaluate(p, inputs)? {
                Some(m) => m,
                None => return Ok(None),
            },
            None => Mask::none(0),
        };
        let mask = match def {
            MaskDef::Entry(kind) => Some(inputs.entry(*kind)),
            MaskDef::And { cond, .. } => inputs.condition(*cond).map(|c| parent.and(&c)).transpose()?,
            MaskDef::AndNot { cond, .. } => inputs.condition(*cond).map(|c| parent.and_not(&c)).transpose()?,
            MaskDef::Case { scrutinee, index, .. } => {
                match earlier_cases(inputs, *scrutinee, *index, parent.width())? {
                    Some(taken) => inputs
                        .case_match(*scrutinee, *index)
                        .map(|m| parent.and(&m)?.and_not(&taken))
                        .transpose()?,
                    None => None,
                }
            }
            MaskDef::Default { scrutinee, cases, .. } => {
                earlier_cases(inputs, *scrutinee, *cases, parent.width())?
                    .map(|taken| parent.and_not(&taken))
                    .transpose()?
            }
        };
        Ok(mask)
    }
}

/// Union of the matches of cases `0..upto`.
fn earlier_cases(
    inputs: &impl MaskInputs,
    scrutinee: Span,
    upto: usize,
    width: usize,
) -> Result<Option<Mask>, LaneError> {
    let mut taken = Mask::none(width);
    for i in 0..upto {
        match inputs.case_match(scrutinee, i) {
            Some(m) => taken = taken.or(&m)?,
            None => return Ok(None),
        }
    }
    Ok(Some(taken))
}
