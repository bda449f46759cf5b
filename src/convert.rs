//! Constrained/unconstrained conversion: splitting a `varying[N]` value into
//! native-width groups plus masks, and reassembling it.

use serde::Serialize;

use crate::config::TargetConfig;
use crate::lanes::{LaneError, Mask, Varying};
use crate::typeck::types::Scalar;

/// One native-width slice of a constrained value. Transient: produced on
/// demand and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintGroup<T> {
    pub values: Varying<T>,
    pub mask: Mask,
}

/// Static shape of a decomposition, as code generation sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupPlan {
    pub native_width: u32,
    pub groups: u32,
    /// Active lanes in the final group.
    pub tail_active: u32,
}

impl GroupPlan {
    pub fn new(lanes: u32, native_width: u32) -> Result<Self, LaneError> {
        if native_width == 0 {
            return Err(LaneError::ZeroNativeWidth);
        }
        let groups = lanes.div_ceil(native_width);
        let tail_active = match lanes % native_width {
            0 if lanes > 0 => native_width,
            rem => rem,
        };
        Ok(Self { native_width, groups, tail_active })
    }

    pub fn for_target(lanes: u32, scalar: Scalar, target: &TargetConfig) -> Result<Self, LaneError> {
        Self::new(lanes, target.lane_width(scalar))
    }

    /// Whether the constrained value is wider than one native register.
    pub fn needs_split(&self) -> bool {
        self.groups > 1
    }
}

/// FromConstrained: group g, local lane j holds global lane g·W + j. Tail
/// lanes past N are inactive and hold `T::default()`.
pub fn from_constrained<T: Clone + Default>(
    v: &Varying<T>,
    native_width: usize,
) -> Result<Vec<ConstraintGroup<T>>, LaneError> {
    if native_width == 0 {
        return Err(LaneError::ZeroNativeWidth);
    }
    Ok(v
        .as_slice()
        .chunks(native_width)
        .map(|chunk| {
            let mut values = chunk.to_vec();
            values.resize(native_width, T::default());
            ConstraintGroup {
                values: Varying::new(values),
                mask: Mask::prefix(native_width, chunk.len()),
            }
        })
        .collect())
}

/// Concatenate the active lanes of each group, in group order.
pub fn to_constrained<T: Clone>(groups: &[ConstraintGroup<T>]) -> Result<Varying<T>, LaneError> {
    let mut lanes = Vec::new();
    for group in groups {
        if group.values.width() != group.mask.width() {
            return Err(LaneError::WidthMismatch {
                left: group.values.width(),
                right: group.mask.width(),
            });
        }
        lanes.extend(group.mask.active_lanes().map(|i| group.values.as_slice()[i].clone()));
    }
    Ok(Varying::new(lanes))
}
