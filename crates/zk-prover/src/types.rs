//! Input types for the match circuit

use ark_ff::PrimeField;

use crate::circuits::TUPLE_WIDTH;
use crate::error::{ProverError, Result};

/// Number of tuples the command line surface works with
pub const CLI_TUPLE_COUNT: usize = 3;

/// Integers in a command line tuple list: `i0,n0,d0,r0,i1,...,r2`
pub const CSV_INT_COUNT: usize = CLI_TUPLE_COUNT * TUPLE_WIDTH;

/// One ratio relation `i * (n / d) = r`, checked as `i * n = d * r`.
///
/// All four components become public inputs of the circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatioTuple<F> {
    pub i: F,
    pub n: F,
    pub d: F,
    pub r: F,
}

impl<F: PrimeField> RatioTuple<F> {
    pub fn new(i: F, n: F, d: F, r: F) -> Self {
        Self { i, n, d, r }
    }

    /// Build from signed integers; negatives map to the field negation
    pub fn from_ints(i: i64, n: i64, d: i64, r: i64) -> Self {
        Self::new(int_to_field(i), int_to_field(n), int_to_field(d), int_to_field(r))
    }

    /// Circuit allocation order
    pub fn components(&self) -> [F; TUPLE_WIDTH] {
        [self.i, self.n, self.d, self.r]
    }

    /// Whether `i * n == d * r` holds over the field
    pub fn holds(&self) -> bool {
        self.i * self.n == self.d * self.r
    }
}

/// Signed integer to field element
pub fn int_to_field<F: PrimeField>(value: i64) -> F {
    let magnitude = F::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Parse `[+-]?[0-9]+`, rejecting anything else (including whitespace)
fn parse_int(token: &str) -> Option<i64> {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Parse a comma separated list of signed integers of any length
pub fn parse_int_list(input: &str) -> Result<Vec<i64>> {
    input
        .split(',')
        .map(|token| {
            parse_int(token)
                .ok_or_else(|| ProverError::input(input, format!("not a valid integer: `{token}`")))
        })
        .collect()
}

/// Parse exactly [`CSV_INT_COUNT`] comma separated integers, in order
pub fn extract_ints(input: &str) -> Result<Vec<i64>> {
    let ints = parse_int_list(input)?;
    if ints.len() != CSV_INT_COUNT {
        return Err(ProverError::input(
            input,
            format!(
                "{CSV_INT_COUNT} comma separated integers required, got {}",
                ints.len()
            ),
        ));
    }
    Ok(ints)
}

/// Group integers into tuples of [`TUPLE_WIDTH`]
pub fn tuples_from_ints<F: PrimeField>(ints: &[i64]) -> Result<Vec<RatioTuple<F>>> {
    if ints.is_empty() || ints.len() % TUPLE_WIDTH != 0 {
        let rendered = ints.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        return Err(ProverError::input(
            rendered,
            format!("expected a non-empty multiple of {TUPLE_WIDTH} integers, got {}", ints.len()),
        ));
    }

    Ok(ints
        .chunks_exact(TUPLE_WIDTH)
        .map(|c| RatioTuple::from_ints(c[0], c[1], c[2], c[3]))
        .collect())
}

/// Parse the command line tuple list into [`CLI_TUPLE_COUNT`] tuples
pub fn parse_tuples<F: PrimeField>(input: &str) -> Result<Vec<RatioTuple<F>>> {
    tuples_from_ints(&extract_ints(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn test_extract_ints_order() {
        let ints = extract_ints("10,4,2,20,11,13,11,13,17,19,17,19").unwrap();
        assert_eq!(ints, vec![10, 4, 2, 20, 11, 13, 11, 13, 17, 19, 17, 19]);
    }

    #[test]
    fn test_extract_ints_signed() {
        let ints = extract_ints("-5,+2,1,-10,2,5,2,5,3,7,3,7").unwrap();
        assert_eq!(ints[0], -5);
        assert_eq!(ints[1], 2);
        assert_eq!(ints[3], -10);
    }

    #[test]
    fn test_extract_ints_rejects_bad_tokens() {
        for input in [
            "10,4,2,20,11,13,11,13,17,19,17,x",
            "10,4,2,20,11,13,11,13,17,19,17,1.5",
            "10, 4,2,20,11,13,11,13,17,19,17,19",
            "10,4,2,20,11,13,11,13,17,19,17,",
            "10,4,2,20,11,13,11,13,17,19,17,-",
            "",
        ] {
            let err = extract_ints(input).unwrap_err();
            assert!(matches!(err, ProverError::InputFormat { .. }), "{input}");
        }
    }

    #[test]
    fn test_extract_ints_rejects_wrong_count() {
        for input in ["1,2,3,4", "1,2,3,4,5,6,7,8,9,10,11,12,13"] {
            match extract_ints(input).unwrap_err() {
                ProverError::InputFormat { input: raw, reason } => {
                    assert_eq!(raw, input);
                    assert!(reason.contains("12 comma separated integers"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_negative_maps_to_negation() {
        let minus_three: Fr = int_to_field(-3);
        assert_eq!(minus_three + Fr::from(3u64), Fr::from(0u64));
    }

    #[test]
    fn test_tuples_from_ints() {
        let tuples: Vec<RatioTuple<Fr>> =
            parse_tuples("5,2,1,10,2,5,2,5,3,7,3,7").unwrap();
        assert_eq!(tuples.len(), 3);
        assert!(tuples.iter().all(RatioTuple::holds));
        assert_eq!(tuples[1], RatioTuple::from_ints(2, 5, 2, 5));

        assert!(tuples_from_ints::<Fr>(&[1, 2, 3]).is_err());
        assert!(tuples_from_ints::<Fr>(&[]).is_err());
    }

    #[test]
    fn test_holds() {
        assert!(RatioTuple::<Fr>::from_ints(10, 4, 2, 20).holds());
        assert!(!RatioTuple::<Fr>::from_ints(10, 4, 2, 21).holds());
        // both sides negative
        assert!(RatioTuple::<Fr>::from_ints(-6, 2, 3, -4).holds());
    }
}
