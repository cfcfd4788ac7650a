//! Rank-1 constraint system primitives and the satisfiability checker
//!
//! Variable layout follows the usual R1CS convention:
//!
//! ```text
//! index 0                     constant `one`
//! 1 ..= primary_input_size    primary (public) inputs
//! ..                          auxiliary (witness) values
//! ```

use std::collections::BTreeMap;

use ark_ff::PrimeField;
use thiserror::Error;

use crate::circuits::expected_constraint_count;

/// Index into the full assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(pub usize);

impl Variable {
    /// The constant-one slot
    pub const ONE: Variable = Variable(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Sparse weighted sum of variables.
///
/// Terms are kept in a `BTreeMap` so iteration order (and therefore backend
/// translation) is deterministic. Zero coefficients are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearCombination<F: PrimeField> {
    terms: BTreeMap<Variable, F>,
}

impl<F: PrimeField> LinearCombination<F> {
    pub fn zero() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    /// `1 * var`
    pub fn from_variable(var: Variable) -> Self {
        Self::zero().with_term(var, F::one())
    }

    /// `coeff * one`
    pub fn constant(coeff: F) -> Self {
        Self::zero().with_term(Variable::ONE, coeff)
    }

    /// Builder form of [`add_term`](Self::add_term)
    #[must_use]
    pub fn with_term(mut self, var: Variable, coeff: F) -> Self {
        self.add_term(var, coeff);
        self
    }

    /// Add `coeff * var`, merging with an existing term for `var`
    pub fn add_term(&mut self, var: Variable, coeff: F) {
        let merged = self.terms.get(&var).copied().unwrap_or_else(F::zero) + coeff;
        if merged.is_zero() {
            self.terms.remove(&var);
        } else {
            self.terms.insert(var, merged);
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (Variable, &F)> {
        self.terms.iter().map(|(var, coeff)| (*var, coeff))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate against a full assignment; `None` if a term points past its end
    pub fn evaluate(&self, assignment: &[F]) -> Option<F> {
        self.terms.iter().try_fold(F::zero(), |acc, (var, coeff)| {
            assignment.get(var.index()).map(|value| acc + *coeff * value)
        })
    }
}

/// One constraint `<A, z> * <B, z> = <C, z>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint<F: PrimeField> {
    pub a: LinearCombination<F>,
    pub b: LinearCombination<F>,
    pub c: LinearCombination<F>,
}

impl<F: PrimeField> Constraint<F> {
    pub fn new(a: LinearCombination<F>, b: LinearCombination<F>, c: LinearCombination<F>) -> Self {
        Self { a, b, c }
    }

    pub fn is_satisfied(&self, assignment: &[F]) -> bool {
        match (
            self.a.evaluate(assignment),
            self.b.evaluate(assignment),
            self.c.evaluate(assignment),
        ) {
            (Some(a), Some(b), Some(c)) => a * b == c,
            _ => false,
        }
    }
}

/// Ordered constraints plus the primary/auxiliary split.
///
/// `tuple_count` records how many ratio tuples the system encodes, which fixes
/// the expected number of constraints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintSystem<F: PrimeField> {
    pub constraints: Vec<Constraint<F>>,
    pub primary_input_size: usize,
    pub auxiliary_input_size: usize,
    pub tuple_count: usize,
}

impl<F: PrimeField> ConstraintSystem<F> {
    /// Length of the full assignment, including the constant slot
    pub fn num_variables(&self) -> usize {
        self.primary_input_size + self.auxiliary_input_size + 1
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Index of the first constraint the assignment violates
    #[cfg(not(feature = "parallel"))]
    pub fn first_unsatisfied(&self, assignment: &[F]) -> Option<usize> {
        self.constraints
            .iter()
            .position(|constraint| !constraint.is_satisfied(assignment))
    }

    /// Index of the first constraint the assignment violates
    #[cfg(feature = "parallel")]
    pub fn first_unsatisfied(&self, assignment: &[F]) -> Option<usize> {
        use rayon::prelude::*;

        self.constraints
            .par_iter()
            .position_first(|constraint| !constraint.is_satisfied(assignment))
    }
}

/// `[one, primary..., auxiliary...]`
pub fn full_assignment<F: PrimeField>(primary_input: &[F], auxiliary_input: &[F]) -> Vec<F> {
    let mut assignment = Vec::with_capacity(primary_input.len() + auxiliary_input.len() + 1);
    assignment.push(F::one());
    assignment.extend_from_slice(primary_input);
    assignment.extend_from_slice(auxiliary_input);
    assignment
}

/// Why an assignment was rejected by [`validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("assignment has {actual} variables, constraint system expects {expected}")]
    AssignmentLength { expected: usize, actual: usize },

    #[error("primary input has {actual} values, constraint system expects {expected}")]
    PrimaryInputLength { expected: usize, actual: usize },

    #[error("constraint system has {actual} constraints, expected {expected}")]
    ConstraintCount { expected: usize, actual: usize },

    #[error("constraint {index} is not satisfied")]
    Unsatisfied { index: usize },
}

impl ValidationError {
    /// Index of the violated constraint, if the failure was not structural
    pub fn unsatisfied_index(&self) -> Option<usize> {
        match self {
            Self::Unsatisfied { index } => Some(*index),
            _ => None,
        }
    }
}

/// Check structure and satisfiability of `cs` against an assignment.
///
/// Pure; reports the first violated constraint.
pub fn validate<F: PrimeField>(
    cs: &ConstraintSystem<F>,
    primary_input: &[F],
    auxiliary_input: &[F],
) -> Result<(), ValidationError> {
    let actual = primary_input.len() + auxiliary_input.len() + 1;
    if actual != cs.num_variables() {
        return Err(ValidationError::AssignmentLength {
            expected: cs.num_variables(),
            actual,
        });
    }

    if primary_input.len() != cs.primary_input_size {
        return Err(ValidationError::PrimaryInputLength {
            expected: cs.primary_input_size,
            actual: primary_input.len(),
        });
    }

    let expected = expected_constraint_count(cs.tuple_count);
    if cs.num_constraints() != expected {
        return Err(ValidationError::ConstraintCount {
            expected,
            actual: cs.num_constraints(),
        });
    }

    let assignment = full_assignment(primary_input, auxiliary_input);
    match cs.first_unsatisfied(&assignment) {
        Some(index) => Err(ValidationError::Unsatisfied { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn test_linear_combination_merges_terms() {
        let x = Variable(1);
        let lc = LinearCombination::<Fr>::from_variable(x)
            .with_term(x, Fr::from(2u64))
            .with_term(Variable::ONE, Fr::from(5u64));
        assert_eq!(lc.len(), 2);

        // 3x + 5 at x = 4
        let assignment = [Fr::from(1u64), Fr::from(4u64)];
        assert_eq!(lc.evaluate(&assignment), Some(Fr::from(17u64)));
    }

    #[test]
    fn test_cancelled_terms_are_dropped() {
        let x = Variable(1);
        let lc = LinearCombination::<Fr>::from_variable(x).with_term(x, -Fr::from(1u64));
        assert!(lc.is_empty());
        assert_eq!(lc.evaluate(&[Fr::from(1u64)]), Some(Fr::from(0u64)));
    }

    #[test]
    fn test_out_of_range_variable() {
        let lc = LinearCombination::<Fr>::from_variable(Variable(3));
        assert_eq!(lc.evaluate(&[Fr::from(1u64)]), None);

        let one = LinearCombination::constant(Fr::from(1u64));
        let constraint = Constraint::new(lc, one, LinearCombination::zero());
        assert!(!constraint.is_satisfied(&[Fr::from(1u64)]));
    }

    #[test]
    fn test_first_unsatisfied() {
        // x * y = z, then z * 1 = w
        let (x, y, z, w) = (Variable(1), Variable(2), Variable(3), Variable(4));
        let cs = ConstraintSystem {
            constraints: vec![
                Constraint::new(
                    LinearCombination::from_variable(x),
                    LinearCombination::from_variable(y),
                    LinearCombination::from_variable(z),
                ),
                Constraint::new(
                    LinearCombination::from_variable(z),
                    LinearCombination::constant(Fr::from(1u64)),
                    LinearCombination::from_variable(w),
                ),
            ],
            primary_input_size: 2,
            auxiliary_input_size: 2,
            tuple_count: 0,
        };
        assert_eq!(cs.num_variables(), 5);

        let good = full_assignment(&[Fr::from(3u64), Fr::from(4u64)], &[Fr::from(12u64), Fr::from(12u64)]);
        assert_eq!(cs.first_unsatisfied(&good), None);

        let bad = full_assignment(&[Fr::from(3u64), Fr::from(4u64)], &[Fr::from(12u64), Fr::from(13u64)]);
        assert_eq!(cs.first_unsatisfied(&bad), Some(1));
    }

    #[test]
    fn test_full_assignment_layout() {
        let z = full_assignment(&[Fr::from(7u64)], &[Fr::from(9u64)]);
        assert_eq!(z, vec![Fr::from(1u64), Fr::from(7u64), Fr::from(9u64)]);
    }
}
