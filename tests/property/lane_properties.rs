//! Property-based tests for lane-width rules and the lane value library.

use proptest::prelude::*;

use lanec::config::MAX_REGISTER_BITS;
use lanec::convert::{from_constrained, to_constrained};
use lanec::lanes::cross::rotate;
use lanec::lanes::{Mask, Varying, reduce};
use lanec::span::Span;
use lanec::typeck::resolve::validate_constraint;
use lanec::typeck::types::{Scalar, Width};

fn arb_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        Just(Scalar::Bool),
        Just(Scalar::Int8),
        Just(Scalar::Int16),
        Just(Scalar::Int32),
        Just(Scalar::Int64),
        Just(Scalar::Uint8),
        Just(Scalar::Uint16),
        Just(Scalar::Uint32),
        Just(Scalar::Uint64),
        Just(Scalar::Float32),
        Just(Scalar::Float64),
    ]
}

fn arb_width() -> impl Strategy<Value = Width> {
    prop_oneof![Just(Width::Native), Just(Width::Universal), (1u32..64).prop_map(Width::Fixed)]
}

fn arb_lanes() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-1000i32..1000, 1..40)
}

proptest! {
    /// varying[N] T is well-formed iff N = 0 or N·bits(T) fits the widest register.
    #[test]
    fn constraint_well_formed(n in 0i64..1200, scalar in arb_scalar()) {
        let ok = validate_constraint(n, scalar, Span::dummy()).is_ok();
        prop_assert_eq!(ok, n == 0 || n * i64::from(scalar.bits()) <= i64::from(MAX_REGISTER_BITS));
    }

    #[test]
    fn negative_constraint_never_valid(n in i64::MIN..0, scalar in arb_scalar()) {
        prop_assert!(validate_constraint(n, scalar, Span::dummy()).is_err());
    }

    #[test]
    fn combine_is_commutative(a in arb_width(), b in arb_width()) {
        let ab = a.combine(b).ok();
        let ba = b.combine(a).ok();
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn add_of_splat(k in -10_000i64..10_000, w in 1usize..64) {
        let v = Varying::splat(k, w);
        prop_assert_eq!(reduce::add(&v, &Mask::all(w)).unwrap(), k * w as i64);
    }

    #[test]
    fn empty_mask_identities(bits in prop::collection::vec(any::<bool>(), 1..64)) {
        let v = Varying::new(bits);
        let off = Mask::none(v.width());
        prop_assert!(!reduce::any(&v, &off).unwrap());
        prop_assert!(reduce::all(&v, &off).unwrap());
        prop_assert_eq!(reduce::bitmask(&v, &off).unwrap(), 0);
    }

    /// FromConstrained then ToConstrained is the identity, with ⌈N/W⌉ groups.
    #[test]
    fn constrained_groups_round_trip(lanes in arb_lanes(), w in 1usize..17) {
        let v = Varying::new(lanes);
        let groups = from_constrained(&v, w).unwrap();
        prop_assert_eq!(groups.len(), v.width().div_ceil(w));
        prop_assert!(groups.iter().all(|g| g.values.width() == w));
        let active: usize = groups.iter().map(|g| g.mask.count()).sum();
        prop_assert_eq!(active, v.width());
        prop_assert_eq!(to_constrained(&groups).unwrap(), v);
    }

    #[test]
    fn rotate_inverts(lanes in arb_lanes(), k in any::<i64>()) {
        let v = Varying::new(lanes);
        let n = v.width() as i64;
        let back = n - k.rem_euclid(n);
        prop_assert_eq!(rotate(&rotate(&v, k), back), v);
    }
}
