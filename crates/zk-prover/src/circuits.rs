//! R1CS for the ratio match relation
//!
//! For every tuple `(i, n, d, r)` the circuit shows `i * n = d * r`, i.e.
//! `i * (n / d) = r`, and folds the per-tuple results into the public
//! output `out = 1`.
//!
//! Layout for `N` tuples:
//!
//! | index                 | variable                                  |
//! |-----------------------|-------------------------------------------|
//! | `0`                   | `one`                                     |
//! | `1 ..= 4N`            | `i_k, n_k, d_k, r_k` (public)             |
//! | `4N + 1`              | `out` (public, bound to `one`)            |
//! | next `4N`             | `in_k, dr_k, diff_k, flag_k` (witness)    |
//! | next `N - 1`          | `acc_1 .. acc_{N-1}` (witness)            |
//!
//! Constraints, per tuple:
//!
//! ```text
//! i_k * n_k          = in_k
//! d_k * r_k          = dr_k
//! (in_k - dr_k) * 1  = diff_k
//! equality gadget on diff_k / flag_k
//! ```
//!
//! followed by `acc_j = acc_{j-1} * flag_j` (`acc_0 = flag_0`) and
//! `acc_{N-1} * 1 = out`.

use std::fmt;
use std::str::FromStr;

use ark_ff::PrimeField;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystemRef, LinearCombination as ArkLinearCombination,
    SynthesisError, Variable as ArkVariable,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ProverError, Result};
use crate::r1cs::{validate, Constraint, ConstraintSystem, LinearCombination, ValidationError, Variable};
use crate::types::RatioTuple;

/// Public inputs per tuple
pub const TUPLE_WIDTH: usize = 4;

/// `4N + 1`: the tuple components plus `out`
pub const fn primary_input_size(tuples: usize) -> usize {
    TUPLE_WIDTH * tuples + 1
}

/// `4N + (N - 1)`: per-tuple intermediates plus accumulators
pub const fn auxiliary_input_size(tuples: usize) -> usize {
    (TUPLE_WIDTH * tuples + tuples).saturating_sub(1)
}

/// `4N` per-tuple constraints, `N - 1` combining constraints and the output binding
pub const fn expected_constraint_count(tuples: usize) -> usize {
    TUPLE_WIDTH * tuples + tuples
}

/// How `diff_k = in_k - dr_k` is tied to the accumulated output.
///
/// Both gadgets allocate the same variables and emit the same number of
/// constraints, but they produce different key topologies: keys generated with
/// one gadget cannot prove or verify circuits built with the other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualityGadget {
    /// `(diff_k + 1) * 1 = flag_k`, all flags multiplied together must equal `one`.
    ///
    /// Accepts non-zero diffs whose `diff + 1` factors multiply to one, so it
    /// is not a sound zero test.
    #[default]
    ProductToOne,
    /// `diff_k * flag_k = 0`. The flag product being `one` makes every flag
    /// non-zero, which forces every `diff_k = 0`.
    ZeroTest,
}

impl EqualityGadget {
    pub fn name(self) -> &'static str {
        match self {
            Self::ProductToOne => "product-to-one",
            Self::ZeroTest => "zero-test",
        }
    }
}

impl fmt::Display for EqualityGadget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EqualityGadget {
    type Err = ProverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product-to-one" | "product" => Ok(Self::ProductToOne),
            "zero-test" | "zero" => Ok(Self::ZeroTest),
            other => Err(ProverError::Config {
                key: "gadget".into(),
                value: other.into(),
                expected: "product-to-one | zero-test".into(),
            }),
        }
    }
}

/// Constraint system for a concrete set of tuples, with its assignment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchR1cs<F: PrimeField> {
    pub constraint_system: ConstraintSystem<F>,
    pub primary_input: Vec<F>,
    pub auxiliary_input: Vec<F>,
}

impl<F: PrimeField> MatchR1cs<F> {
    pub fn tuple_count(&self) -> usize {
        self.constraint_system.tuple_count
    }

    /// Re-run the validator against the carried assignment
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate(
            &self.constraint_system,
            &self.primary_input,
            &self.auxiliary_input,
        )
    }
}

/// Builds [`MatchR1cs`] instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchCircuitBuilder {
    gadget: EqualityGadget,
}

impl MatchCircuitBuilder {
    pub fn new(gadget: EqualityGadget) -> Self {
        Self { gadget }
    }

    pub fn gadget(&self) -> EqualityGadget {
        self.gadget
    }

    /// Allocate variables, emit constraints and compute the witness in one pass.
    ///
    /// Fails with [`ProverError::RelationNotSatisfied`] when the tuples do not
    /// satisfy the relation, and with [`ProverError::ConstraintBuild`] if the
    /// result fails its self-check for any other reason.
    pub fn build<F: PrimeField>(&self, tuples: &[RatioTuple<F>]) -> Result<MatchR1cs<F>> {
        if tuples.is_empty() {
            return Err(ProverError::input("", "at least one ratio tuple is required"));
        }

        let count = tuples.len();
        let one = Variable::ONE;
        let mut w = WitnessComputer::with_capacity(
            primary_input_size(count) + auxiliary_input_size(count) + 1,
            expected_constraint_count(count),
        );

        let tuple_vars: Vec<[Variable; TUPLE_WIDTH]> = tuples
            .iter()
            .map(|tuple| tuple.components().map(|value| w.alloc(value)))
            .collect();
        let out = w.alloc(F::one());

        let mut flags = Vec::with_capacity(count);
        for [i, n, d, r] in tuple_vars {
            let value = w.value(i) * w.value(n);
            let in_k = w.alloc(value);
            w.enforce(lc(i), lc(n), lc(in_k));

            let value = w.value(d) * w.value(r);
            let dr_k = w.alloc(value);
            w.enforce(lc(d), lc(r), lc(dr_k));

            let value = w.value(in_k) - w.value(dr_k);
            let diff_k = w.alloc(value);
            w.enforce(lc(in_k).with_term(dr_k, -F::one()), lc(one), lc(diff_k));

            let value = w.value(diff_k) + F::one();
            let flag_k = w.alloc(value);
            match self.gadget {
                EqualityGadget::ProductToOne => {
                    w.enforce(lc(diff_k).with_term(one, F::one()), lc(one), lc(flag_k));
                }
                EqualityGadget::ZeroTest => {
                    w.enforce(lc(diff_k), lc(flag_k), LinearCombination::zero());
                }
            }
            flags.push(flag_k);
        }

        let mut acc = flags[0];
        for &flag in &flags[1..] {
            let value = w.value(acc) * w.value(flag);
            let next = w.alloc(value);
            w.enforce(lc(acc), lc(flag), lc(next));
            acc = next;
        }
        w.enforce(lc(acc), lc(one), lc(out));

        let r1cs = w.finish(count);
        debug!(
            tuples = count,
            gadget = %self.gadget,
            constraints = r1cs.constraint_system.num_constraints(),
            variables = r1cs.constraint_system.num_variables(),
            "Built match R1CS"
        );

        match r1cs.validate() {
            Ok(()) => Ok(r1cs),
            Err(ValidationError::Unsatisfied { index }) if is_relation_constraint(count, index) => {
                Err(ProverError::RelationNotSatisfied { constraint: index })
            }
            Err(e) => {
                error!("Match R1CS failed its own check: {e}");
                Err(ProverError::ConstraintBuild {
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Build with the default [`EqualityGadget`]
pub fn build_match_r1cs<F: PrimeField>(tuples: &[RatioTuple<F>]) -> Result<MatchR1cs<F>> {
    MatchCircuitBuilder::default().build(tuples)
}

/// Constraints whose failure means the tuples are wrong rather than the builder:
/// the equality gadget of each tuple, the combining chain and the output binding.
fn is_relation_constraint(tuples: usize, index: usize) -> bool {
    index >= TUPLE_WIDTH * tuples || index % TUPLE_WIDTH == TUPLE_WIDTH - 1
}

fn lc<F: PrimeField>(var: Variable) -> LinearCombination<F> {
    LinearCombination::from_variable(var)
}

/// Appends values and constraints in lockstep
struct WitnessComputer<F: PrimeField> {
    assignment: Vec<F>,
    constraints: Vec<Constraint<F>>,
}

impl<F: PrimeField> WitnessComputer<F> {
    fn with_capacity(variables: usize, constraints: usize) -> Self {
        let mut assignment = Vec::with_capacity(variables);
        assignment.push(F::one());
        Self {
            assignment,
            constraints: Vec::with_capacity(constraints),
        }
    }

    fn alloc(&mut self, value: F) -> Variable {
        self.assignment.push(value);
        Variable(self.assignment.len() - 1)
    }

    fn value(&self, var: Variable) -> F {
        self.assignment[var.index()]
    }

    fn enforce(&mut self, a: LinearCombination<F>, b: LinearCombination<F>, c: LinearCombination<F>) {
        self.constraints.push(Constraint::new(a, b, c));
    }

    fn finish(mut self, tuples: usize) -> MatchR1cs<F> {
        let primary_size = primary_input_size(tuples);
        let auxiliary_input = self.assignment.split_off(primary_size + 1);
        let primary_input = self.assignment.split_off(1);

        MatchR1cs {
            constraint_system: ConstraintSystem {
                constraints: self.constraints,
                primary_input_size: primary_size,
                auxiliary_input_size: auxiliary_input.len(),
                tuple_count: tuples,
            },
            primary_input,
            auxiliary_input,
        }
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for MatchR1cs<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> std::result::Result<(), SynthesisError> {
        let mut vars = Vec::with_capacity(self.constraint_system.num_variables());
        vars.push(ArkVariable::One);
        for value in self.primary_input {
            vars.push(cs.new_input_variable(|| Ok(value))?);
        }
        for value in self.auxiliary_input {
            vars.push(cs.new_witness_variable(|| Ok(value))?);
        }

        for constraint in &self.constraint_system.constraints {
            cs.enforce_constraint(
                to_ark(&constraint.a, &vars)?,
                to_ark(&constraint.b, &vars)?,
                to_ark(&constraint.c, &vars)?,
            )?;
        }

        Ok(())
    }
}

fn to_ark<F: PrimeField>(
    lc: &LinearCombination<F>,
    vars: &[ArkVariable],
) -> std::result::Result<ArkLinearCombination<F>, SynthesisError> {
    lc.terms()
        .map(|(var, coeff)| {
            vars.get(var.index())
                .map(|ark_var| (*coeff, *ark_var))
                .ok_or(SynthesisError::AssignmentMissing)
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(ArkLinearCombination)
}
