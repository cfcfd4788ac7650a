//! Property-based tests for the match circuit using proptest

use ark_bn254::Fr;
use proptest::prelude::*;

use match_zk_prover::circuits::{auxiliary_input_size, expected_constraint_count, primary_input_size};
use match_zk_prover::types::parse_int_list;
use match_zk_prover::{
    build_match_r1cs, extract_ints, EqualityGadget, MatchCircuitBuilder, ProverError, RatioTuple,
};

// Any i, n and non-zero d with d | i * n, and r = i * n / d
fn true_tuple() -> impl Strategy<Value = RatioTuple<Fr>> {
    let divisor = prop_oneof![-40i64..=-1, 1i64..=40];
    (-10_000i64..10_000, -10_000i64..10_000, divisor).prop_filter_map(
        "d must divide i * n",
        |(i, n, d)| {
            let product = i * n;
            (product % d == 0).then(|| RatioTuple::from_ints(i, n, d, product / d))
        },
    )
}

#[test]
fn test_divisor_need_not_divide_i() {
    // 2 * (3 / 3) = 2 and 4 * (9 / 6) = 6
    let tuples = [RatioTuple::<Fr>::from_ints(2, 3, 3, 2), RatioTuple::from_ints(4, 9, 6, 6)];
    for gadget in [EqualityGadget::ProductToOne, EqualityGadget::ZeroTest] {
        assert!(MatchCircuitBuilder::new(gadget).build(&tuples).is_ok());
    }
}

fn gadget() -> impl Strategy<Value = EqualityGadget> {
    prop_oneof![Just(EqualityGadget::ProductToOne), Just(EqualityGadget::ZeroTest)]
}

proptest! {
    #[test]
    fn test_true_tuples_build(
        tuples in prop::collection::vec(true_tuple(), 1..12),
        gadget in gadget(),
    ) {
        let r1cs = MatchCircuitBuilder::new(gadget).build(&tuples).unwrap();
        let n = tuples.len();

        prop_assert!(r1cs.validate().is_ok());
        prop_assert_eq!(r1cs.primary_input.len(), primary_input_size(n));
        prop_assert_eq!(r1cs.auxiliary_input.len(), auxiliary_input_size(n));
        prop_assert_eq!(r1cs.constraint_system.num_constraints(), expected_constraint_count(n));
        prop_assert_eq!(r1cs.primary_input.last(), Some(&Fr::from(1u64)));
    }

    #[test]
    fn test_primary_input_is_tuple_components(tuples in prop::collection::vec(true_tuple(), 1..8)) {
        let r1cs = build_match_r1cs(&tuples).unwrap();
        let components: Vec<Fr> = tuples.iter().flat_map(RatioTuple::components).collect();
        prop_assert_eq!(&r1cs.primary_input[..components.len()], components.as_slice());
    }

    #[test]
    fn test_zero_test_rejects_any_false_tuple(
        mut tuples in prop::collection::vec(true_tuple(), 1..6),
        position in any::<prop::sample::Index>(),
        delta in 1i64..1_000,
    ) {
        let k = position.index(tuples.len());
        tuples[k].r += Fr::from(delta as u64);
        prop_assume!(!tuples[k].holds());

        let err = MatchCircuitBuilder::new(EqualityGadget::ZeroTest).build(&tuples).unwrap_err();
        prop_assert!(
            matches!(err, ProverError::RelationNotSatisfied { constraint } if constraint == 4 * k + 3),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_extract_ints_preserves_order(values in prop::array::uniform12(any::<i64>())) {
        let csv = values.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        prop_assert_eq!(extract_ints(&csv).unwrap(), values.to_vec());
    }

    #[test]
    fn test_extract_ints_wrong_count(values in prop::collection::vec(-100i64..100, 0..30)) {
        prop_assume!(values.len() != 12 && !values.is_empty());
        let csv = values.iter().map(i64::to_string).collect::<Vec<_>>().join(",");

        prop_assert_eq!(parse_int_list(&csv).unwrap(), values);
        let is_input_error = matches!(extract_ints(&csv), Err(ProverError::InputFormat { .. }));
        prop_assert!(is_input_error);
    }
}
