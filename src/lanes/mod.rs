//! Reference semantics for lane values: masks, varying values, cross-lane
//! operations and reductions.
//!
//! `Mask` is deliberately not a `Varying<bool>`. A mask is the engine's
//! per-lane activity record, while `Varying<bool>` is the logical bit-packed
//! boolean vector of the language. Conversions between the two are explicit
//! (`Varying::to_mask`, `Mask::to_varying`), so a target whose mask layout
//! differs from its boolean-vector layout only has to handle those two calls.

pub mod cross;
pub mod reduce;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaneError {
    #[error("lane count mismatch: {left} vs {right}")]
    WidthMismatch { left: usize, right: usize },
    #[error("lane {lane} is out of range for {width} lanes")]
    LaneOutOfRange { lane: usize, width: usize },
    #[error("a {width}-lane mask does not fit in a 64-bit bitmask")]
    MaskTooWide { width: usize },
    #[error("native width must be at least one lane")]
    ZeroNativeWidth,
    #[error("lane {lane} is not active")]
    InactiveLane { lane: usize },
}

fn same_width(left: usize, right: usize) -> Result<(), LaneError> {
    if left != right {
        return Err(LaneError::WidthMismatch { left, right });
    }
    Ok(())
}

/// Per-lane activity. Immutable: derivations return a new mask.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mask {
    active: Vec<bool>,
}

impl Mask {
    pub fn all(width: usize) -> Self {
        Self { active: vec![true; width] }
    }

    pub fn none(width: usize) -> Self {
        Self { active: vec![false; width] }
    }

    pub fn from_lanes(lanes: &[bool]) -> Self {
        Self { active: lanes.to_vec() }
    }

    /// Lanes `0..active` on, the rest off. Used for tail groups.
    pub fn prefix(width: usize, active: usize) -> Self {
        Self { active: (0..width).map(|i| i < active).collect() }
    }

    pub fn width(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, lane: usize) -> bool {
        self.active.get(lane).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    pub fn any(&self) -> bool {
        self.active.iter().any(|a| *a)
    }

    pub fn all_active(&self) -> bool {
        self.active.iter().all(|a| *a)
    }

    pub fn active_lanes(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.iter().enumerate().filter(|(_, a)| **a).map(|(i, _)| i)
    }

    pub fn lanes(&self) -> impl Iterator<Item = bool> + '_ {
        self.active.iter().copied()
    }

    pub fn and(&self, cond: &Mask) -> Result<Mask, LaneError> {
        self.zip(cond, |m, c| m && c)
    }

    pub fn and_not(&self, cond: &Mask) -> Result<Mask, LaneError> {
        self.zip(cond, |m, c| m && !c)
    }

    pub fn or(&self, other: &Mask) -> Result<Mask, LaneError> {
        self.zip(other, |a, b| a || b)
    }

    pub fn not(&self) -> Mask {
        Mask { active: self.active.iter().map(|a| !a).collect() }
    }

    fn zip(&self, other: &Mask, f: impl Fn(bool, bool) -> bool) -> Result<Mask, LaneError> {
        same_width(self.width(), other.width())?;
        Ok(Mask {
            active: self.active.iter().zip(&other.active).map(|(a, b)| f(*a, *b)).collect(),
        })
    }

    /// Bit i set iff lane i is active.
    pub fn to_bits(&self) -> Result<u64, LaneError> {
        if self.width() > 64 {
            return Err(LaneError::MaskTooWide { width: self.width() });
        }
        Ok(self.active_lanes().fold(0u64, |bits, i| bits | (1 << i)))
    }

    pub fn to_varying(&self) -> Varying<bool> {
        Varying::new(self.active.clone())
    }
}

/// One value per lane.
#[derive(Debug, Clone, PartialEq)]
pub struct Varying<T> {
    lanes: Vec<T>,
}

impl<T: Clone> Varying<T> {
    pub fn new(lanes: Vec<T>) -> Self {
        Self { lanes }
    }

    pub fn splat(value: T, width: usize) -> Self {
        Self { lanes: vec![value; width] }
    }

    pub fn width(&self) -> usize {
        self.lanes.len()
    }

    pub fn get(&self, lane: usize) -> Result<&T, LaneError> {
        self.lanes.get(lane).ok_or(LaneError::LaneOutOfRange { lane, width: self.lanes.len() })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.lanes
    }

    pub fn into_vec(self) -> Vec<T> {
        self.lanes
    }

    pub fn map<U: Clone>(&self, f: impl Fn(&T) -> U) -> Varying<U> {
        Varying { lanes: self.lanes.iter().map(f).collect() }
    }

    pub fn zip_with<U: Clone, R: Clone>(
        &self,
        other: &Varying<U>,
        f: impl Fn(&T, &U) -> R,
    ) -> Result<Varying<R>, LaneError> {
        same_width(self.width(), other.width())?;
        Ok(Varying { lanes: self.lanes.iter().zip(&other.lanes).map(|(a, b)| f(a, b)).collect() })
    }

    /// Masked update: active lanes take `incoming`, inactive lanes keep `self`.
    pub fn blend(&self, incoming: &Varying<T>, mask: &Mask) -> Result<Varying<T>, LaneError> {
        same_width(self.width(), incoming.width())?;
        same_width(self.width(), mask.width())?;
        Ok(Varying {
            lanes: self
                .lanes
                .iter()
                .zip(&incoming.lanes)
                .enumerate()
                .map(|(i, (old, new))| if mask.is_active(i) { new.clone() } else { old.clone() })
                .collect(),
        })
    }
}

impl Varying<bool> {
    pub fn to_mask(&self) -> Mask {
        Mask::from_lanes(&self.lanes)
    }
}
