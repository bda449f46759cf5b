//! Folds over the active lanes of a varying value. Inactive lanes contribute
//! the operation's identity, so a fold over an all-off mask is the identity.

use super::{LaneError, Mask, Varying, same_width};

/// Element types that support the arithmetic reductions.
pub trait Numeric: Copy + PartialOrd {
    const ZERO: Self;
    const ONE: Self;
    /// Identity of `max`.
    const LOWEST: Self;
    /// Identity of `min`.
    const HIGHEST: Self;
    fn lane_add(self, other: Self) -> Self;
    fn lane_mul(self, other: Self) -> Self;
}

/// Element types that support the bitwise reductions.
pub trait Bitwise: Copy {
    const NONE: Self;
    const ALL_ONES: Self;
    fn lane_or(self, other: Self) -> Self;
    fn lane_and(self, other: Self) -> Self;
    fn lane_xor(self, other: Self) -> Self;
}

macro_rules! int_lanes {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const LOWEST: Self = <$t>::MIN;
            const HIGHEST: Self = <$t>::MAX;
            fn lane_add(self, other: Self) -> Self { self.wrapping_add(other) }
            fn lane_mul(self, other: Self) -> Self { self.wrapping_mul(other) }
        }

        impl Bitwise for $t {
            const NONE: Self = 0;
            const ALL_ONES: Self = !0;
            fn lane_or(self, other: Self) -> Self { self | other }
            fn lane_and(self, other: Self) -> Self { self & other }
            fn lane_xor(self, other: Self) -> Self { self ^ other }
        }
    )*};
}

macro_rules! float_lanes {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const LOWEST: Self = <$t>::NEG_INFINITY;
            const HIGHEST: Self = <$t>::INFINITY;
            fn lane_add(self, other: Self) -> Self { self + other }
            fn lane_mul(self, other: Self) -> Self { self * other }
        }
    )*};
}

int_lanes!(i8, i16, i32, i64, u8, u16, u32, u64);
float_lanes!(f32, f64);

impl Bitwise for bool {
    const NONE: Self = false;
    const ALL_ONES: Self = true;
    fn lane_or(self, other: Self) -> Self {
        self | other
    }
    fn lane_and(self, other: Self) -> Self {
        self & other
    }
    fn lane_xor(self, other: Self) -> Self {
        self ^ other
    }
}

/// Fold the active lanes, starting from `identity`.
pub fn fold<T: Copy>(v: &Varying<T>, mask: &Mask, identity: T, f: impl Fn(T, T) -> T) -> Result<T, LaneError> {
    same_width(v.width(), mask.width())?;
    Ok(v
        .as_slice()
        .iter()
        .zip(mask.lanes())
        .fold(identity, |acc, (x, active)| if active { f(acc, *x) } else { acc }))
}

pub fn add<T: Numeric>(v: &Varying<T>, mask: &Mask) -> Result<T, LaneError> {
    fold(v, mask, T::ZERO, T::lane_add)
}

pub fn mul<T: Numeric>(v: &Varying<T>, mask: &Mask) -> Result<T, LaneError> {
    fold(v, mask, T::ONE, T::lane_mul)
}

pub fn max<T: Numeric>(v: &Varying<T>, mask: &Mask) -> Result<T, LaneError> {
    fold(v, mask, T::LOWEST, |a, b| if b > a { b } else { a })
}

pub fn min<T: Numeric>(v: &Varying<T>, mask: &Mask) -> Result<T, LaneError> {
    fold(v, mask, T::HIGHEST, |a, b| if b < a { b } else { a })
}

pub fn or<T: Bitwise>(v: &Varying<T>, mask: &Mask) -> Result<T, LaneError> {
    fold(v, mask, T::NONE, T::lane_or)
}

pub fn and<T: Bitwise>(v: &Varying<T>, mask: &Mask) -> Result<T, LaneError> {
    fold(v, mask, T::ALL_ONES, T::lane_and)
}

pub fn xor<T: Bitwise>(v: &Varying<T>, mask: &Mask) -> Result<T, LaneError> {
    fold(v, mask, T::NONE, T::lane_xor)
}

/// False over zero active lanes.
pub fn any(v: &Varying<bool>, mask: &Mask) -> Result<bool, LaneError> {
    or(v, mask)
}

/// True over zero active lanes.
pub fn all(v: &Varying<bool>, mask: &Mask) -> Result<bool, LaneError> {
    and(v, mask)
}

/// Lowest active lane holding `true`, or -1.
pub fn find_first_set(v: &Varying<bool>, mask: &Mask) -> Result<i64, LaneError> {
    same_width(v.width(), mask.width())?;
    Ok(mask
        .active_lanes()
        .find(|&i| v.as_slice()[i])
        .map_or(-1, |i| i as i64))
}

/// Bit i set iff `v[i]` is true and lane i is active.
pub fn bitmask(v: &Varying<bool>, mask: &Mask) -> Result<u64, LaneError> {
    v.to_mask().and(mask)?.to_bits()
}

/// The lanes in order. No cross-lane communication, so no mask.
pub fn from<T: Clone>(v: &Varying<T>) -> Vec<T> {
    v.as_slice().to_vec()
}
