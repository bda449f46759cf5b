use lanec::config::TargetConfig;
use lanec::convert::{GroupPlan, from_constrained, to_constrained};
use lanec::lanes::cross::{broadcast, broadcast_masked, rotate, rotate_masked, shift_left, shift_right, swizzle};
use lanec::lanes::{LaneError, Mask, Varying, reduce};
use lanec::typeck::types::Scalar;

fn sse4_int32_width() -> usize {
    TargetConfig::preset("sse4").unwrap().lane_width(Scalar::Int32) as usize
}

#[test]
fn add_of_splat_over_native_width() {
    let w = sse4_int32_width();
    assert_eq!(w, 4);
    let v = Varying::splat(3i32, w);
    assert_eq!(reduce::add(&v, &Mask::all(w)), Ok(12));
}

#[test]
fn reductions_over_empty_mask_are_identities() {
    let v = Varying::new(vec![true, true, false, true]);
    let off = Mask::none(4);
    assert_eq!(reduce::any(&v, &off), Ok(false));
    assert_eq!(reduce::all(&v, &off), Ok(true));
    assert_eq!(reduce::find_first_set(&v, &off), Ok(-1));

    let n = Varying::new(vec![5i64, -2, 9, 1]);
    assert_eq!(reduce::add(&n, &off), Ok(0));
    assert_eq!(reduce::mul(&n, &off), Ok(1));
    assert_eq!(reduce::max(&n, &off), Ok(i64::MIN));
    assert_eq!(reduce::min(&n, &off), Ok(i64::MAX));
}

#[test]
fn reductions_skip_inactive_lanes() {
    let n = Varying::new(vec![5i32, -2, 9, 1]);
    let m = Mask::from_lanes(&[true, true, false, true]);
    assert_eq!(reduce::max(&n, &m), Ok(5));
    assert_eq!(reduce::min(&n, &m), Ok(-2));
    assert_eq!(reduce::or(&Varying::new(vec![1u8, 2, 4, 8]), &m), Ok(11));

    let b = Varying::new(vec![false, false, true, true]);
    assert_eq!(reduce::find_first_set(&b, &m), Ok(3));
    assert_eq!(reduce::bitmask(&b, &m), Ok(0b1000));
}

#[test]
fn reduction_width_must_match_mask() {
    let v = Varying::splat(1i32, 4);
    assert_eq!(reduce::add(&v, &Mask::all(8)), Err(LaneError::WidthMismatch { left: 4, right: 8 }));
}

#[test]
fn from_constrained_even_split() {
    let v = Varying::new((0..12).collect::<Vec<i32>>());
    let groups = from_constrained(&v, sse4_int32_width()).unwrap();
    assert_eq!(groups.len(), 3);
    assert!(groups.iter().all(|g| g.mask.all_active()));
    assert_eq!(groups[2].values.as_slice(), &[8, 9, 10, 11]);
}

#[test]
fn from_constrained_tail_group() {
    let v = Varying::new((0..10).collect::<Vec<i32>>());
    let groups = from_constrained(&v, 4).unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[2].mask, Mask::prefix(4, 2));
    assert_eq!(groups[2].values.as_slice(), &[8, 9, 0, 0]);
    assert_eq!(to_constrained(&groups).unwrap(), v);
}

#[test]
fn group_plan_follows_target() {
    let avx2 = TargetConfig::default();
    let plan = GroupPlan::for_target(10, Scalar::Float32, &avx2).unwrap();
    assert_eq!(plan, GroupPlan { native_width: 8, groups: 2, tail_active: 2 });
    assert!(plan.needs_split());

    let plan = GroupPlan::for_target(8, Scalar::Float32, &avx2).unwrap();
    assert!(!plan.needs_split());
    assert_eq!(GroupPlan::new(4, 0), Err(LaneError::ZeroNativeWidth));
}

#[test]
fn per_group_reduction_matches_whole() {
    let v = Varying::new((1..=10).collect::<Vec<i64>>());
    let total: i64 = from_constrained(&v, 4)
        .unwrap()
        .iter()
        .map(|g| reduce::add(&g.values, &g.mask).unwrap())
        .sum();
    assert_eq!(total, reduce::add(&v, &Mask::all(10)).unwrap());
}

#[test]
fn cross_lane_permutations() {
    let v = Varying::new(vec![10, 20, 30, 40]);
    assert_eq!(rotate(&v, 1).as_slice(), &[40, 10, 20, 30]);
    assert_eq!(rotate(&v, -1).as_slice(), &[20, 30, 40, 10]);
    assert_eq!(rotate(&v, i64::MIN), v);
    assert_eq!(shift_left(&v, 1).as_slice(), &[0, 10, 20, 30]);
    assert_eq!(shift_right(&v, 2).as_slice(), &[30, 40, 0, 0]);
    assert_eq!(broadcast(&v, 2).unwrap().as_slice(), &[30; 4]);
    assert_eq!(broadcast(&v, 4), Err(LaneError::LaneOutOfRange { lane: 4, width: 4 }));

    let idx = Varying::new(vec![3i64, 0, 5, -1]);
    assert_eq!(swizzle(&v, &idx).unwrap().as_slice(), &[40, 10, 20, 40]);
}

#[test]
fn permutes_under_a_branch_mask() {
    let v = Varying::new(vec![10, 20, 30, 40]);
    let branch = Varying::new(vec![1, -1, 2, -2]).map(|x| *x > 0).to_mask();
    assert_eq!(rotate_masked(&v, -1, &branch).unwrap().as_slice(), &[20, 20, 40, 40]);
    assert_eq!(broadcast_masked(&v, 0, &branch).unwrap().as_slice(), &[10, 20, 10, 40]);
    assert_eq!(broadcast_masked(&v, 3, &branch), Err(LaneError::InactiveLane { lane: 3 }));
}

#[test]
fn mask_and_boolean_vector_conversions() {
    let m = Mask::from_lanes(&[true, false, true, false]);
    assert_eq!(m.to_bits(), Ok(0b0101));
    assert_eq!(m.to_varying().to_mask(), m);
    assert_eq!(m.not(), Mask::from_lanes(&[false, true, false, true]));
    assert_eq!(Mask::all(65).to_bits(), Err(LaneError::MaskTooWide { width: 65 }));
}

#[test]
fn blend_keeps_inactive_lanes() {
    let old = Varying::new(vec![1, 2, 3, 4]);
    let new = Varying::splat(0, 4);
    let out = old.blend(&new, &Mask::from_lanes(&[false, true, true, false])).unwrap();
    assert_eq!(out.as_slice(), &[1, 0, 0, 4]);
}
