//! Cross-lane permutations. Lane order matches bitmask order: lane 0 is bit 0,
//! so `shift_left` moves values toward higher lanes.
//!
//! The `*_masked` forms run under an execution mask: inactive destination
//! lanes keep their old value. Sources are read whether active or not, except
//! the broadcast lane, which must be active.

use super::{LaneError, Mask, Varying, same_width};

/// Every lane gets `v[lane]`.
pub fn broadcast<T: Clone>(v: &Varying<T>, lane: usize) -> Result<Varying<T>, LaneError> {
    let value = v.get(lane)?.clone();
    Ok(Varying::splat(value, v.width()))
}

/// Lane i gets `v[(i - offset) mod N]`.
pub fn rotate<T: Clone>(v: &Varying<T>, offset: i64) -> Varying<T> {
    let n = v.width();
    if n == 0 {
        return v.clone();
    }
    let off = wrap(offset, n);
    let lanes = v.as_slice();
    Varying::new((0..n).map(|i| lanes[(i + n - off) % n].clone()).collect())
}

/// Lane i gets `v[idx[i]]`. Indices outside `0..N` wrap (Euclidean remainder).
pub fn swizzle<T: Clone>(v: &Varying<T>, idx: &Varying<i64>) -> Result<Varying<T>, LaneError> {
    same_width(v.width(), idx.width())?;
    let n = v.width();
    let lanes = v.as_slice();
    Ok(idx.map(|i| lanes[wrap(*i, n)].clone()))
}

fn wrap(i: i64, n: usize) -> usize {
    // n > 0 and fits in i64 for any representable lane count
    i.rem_euclid(n as i64) as usize
}

fn shifted<T: Clone + Default>(v: &Varying<T>, source: impl Fn(usize) -> Option<usize>) -> Varying<T> {
    let lanes = v.as_slice();
    Varying::new(
        (0..v.width())
            .map(|i| source(i).and_then(|s| lanes.get(s)).cloned().unwrap_or_default())
            .collect(),
    )
}

/// Lane i gets `v[i - amount]`, zero-filled.
pub fn shift_left<T: Clone + Default>(v: &Varying<T>, amount: usize) -> Varying<T> {
    shifted(v, |i| i.checked_sub(amount))
}

/// Lane i gets `v[i + amount]`, zero-filled.
pub fn shift_right<T: Clone + Default>(v: &Varying<T>, amount: usize) -> Varying<T> {
    shifted(v, |i| i.checked_add(amount))
}

pub fn shift_left_by<T: Clone + Default>(v: &Varying<T>, amounts: &Varying<usize>) -> Result<Varying<T>, LaneError> {
    same_width(v.width(), amounts.width())?;
    let a = amounts.as_slice();
    Ok(shifted(v, |i| i.checked_sub(a[i])))
}

pub fn shift_right_by<T: Clone + Default>(v: &Varying<T>, amounts: &Varying<usize>) -> Result<Varying<T>, LaneError> {
    same_width(v.width(), amounts.width())?;
    let a = amounts.as_slice();
    Ok(shifted(v, |i| i.checked_add(a[i])))
}

pub fn broadcast_masked<T: Clone>(v: &Varying<T>, lane: usize, mask: &Mask) -> Result<Varying<T>, LaneError> {
    same_width(v.width(), mask.width())?;
    let all = broadcast(v, lane)?;
    if !mask.is_active(lane) {
        return Err(LaneError::InactiveLane { lane });
    }
    v.blend(&all, mask)
}

pub fn rotate_masked<T: Clone>(v: &Varying<T>, offset: i64, mask: &Mask) -> Result<Varying<T>, LaneError> {
    v.blend(&rotate(v, offset), mask)
}

pub fn swizzle_masked<T: Clone>(v: &Varying<T>, idx: &Varying<i64>, mask: &Mask) -> Result<Varying<T>, LaneError> {
    v.blend(&swizzle(v, idx)?, mask)
}

pub fn shift_left_masked<T: Clone + Default>(v: &Varying<T>, amount: usize, mask: &Mask) -> Result<Varying<T>, LaneError> {
    v.blend(&shift_left(v, amount), mask)
}

pub fn shift_right_masked<T: Clone + Default>(v: &Varying<T>, amount: usize, mask: &Mask) -> Result<Varying<T>, LaneError> {
    v.blend(&shift_right(v, amount), mask)
}
