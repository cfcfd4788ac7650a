//! Proof types and encodings
//!
//! Everything that leaves the process (keys, proofs, primary inputs) is the
//! backend's canonical binary serialization, base64 encoded (standard
//! alphabet, padded), with no header or version tag.

use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_groth16::Proof as Groth16Proof;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress, SerializationError, Validate};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ProverError, Result};

/// Failure to turn base64 text back into a canonical value
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("malformed base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed canonical encoding: {0}")]
    Canonical(#[from] SerializationError),
}

/// Serialize `value` canonically and base64 encode it
pub fn to_base64<T: CanonicalSerialize>(value: &T, compress: Compress) -> Result<String> {
    let mut bytes = Vec::with_capacity(value.serialized_size(compress));
    value.serialize_with_mode(&mut bytes, compress)?;
    Ok(STANDARD.encode(bytes))
}

/// Inverse of [`to_base64`]; surrounding whitespace is ignored
pub fn from_base64<T: CanonicalDeserialize>(
    encoded: &str,
    compress: Compress,
) -> std::result::Result<T, EncodingError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(T::deserialize_with_mode(bytes.as_slice(), compress, Validate::Yes)?)
}

/// A Groth16 proof
#[derive(Clone, Debug, PartialEq)]
pub struct Proof<E: Pairing = Bn254> {
    /// The underlying arkworks proof
    pub inner: Groth16Proof<E>,
}

impl<E: Pairing> Proof<E> {
    /// Create from arkworks proof
    pub fn new(inner: Groth16Proof<E>) -> Self {
        Self { inner }
    }

    /// Serialize to compressed bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.inner.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    /// Hex string, used for log fingerprints
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    pub fn to_base64(&self) -> Result<String> {
        to_base64(&self.inner, Compress::Yes)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        from_base64(encoded, Compress::Yes)
            .map(Self::new)
            .map_err(|e| ProverError::input(encoded, format!("proof: {e}")))
    }
}

/// Public half of the assignment: the tuple components followed by `out`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryInput<F: PrimeField> {
    values: Vec<F>,
}

impl<F: PrimeField> PrimaryInput<F> {
    pub fn new(values: Vec<F>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[F] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The trailing output slot
    pub fn out(&self) -> Option<&F> {
        self.values.last()
    }

    pub fn to_base64(&self) -> Result<String> {
        to_base64(&self.values, Compress::Yes)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        from_base64(encoded, Compress::Yes)
            .map(Self::new)
            .map_err(|e| ProverError::input(encoded, format!("primary input: {e}")))
    }
}

/// What a prover hands to a verifier out of band
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifacts {
    /// Base64 proof
    pub proof: String,
    /// Base64 primary input, so the verifier does not need the raw tuples
    pub primary_input: String,
}

impl ProofArtifacts {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn test_primary_input_roundtrip() {
        let input = PrimaryInput::new(vec![Fr::from(5u64), -Fr::from(2u64), Fr::from(1u64)]);
        let encoded = input.to_base64().unwrap();
        let decoded = PrimaryInput::<Fr>::from_base64(&encoded).unwrap();
        assert_eq!(decoded, input);
        assert_eq!(decoded.out(), Some(&Fr::from(1u64)));
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        let input = PrimaryInput::new(vec![Fr::from(9u64)]);
        let encoded = format!("{}\n", input.to_base64().unwrap());
        assert_eq!(PrimaryInput::<Fr>::from_base64(&encoded).unwrap(), input);
    }

    #[test]
    fn test_malformed_base64() {
        let err = PrimaryInput::<Fr>::from_base64("not*base64").unwrap_err();
        assert!(matches!(err, ProverError::InputFormat { .. }));

        let err = Proof::<Bn254>::from_base64("@@@@").unwrap_err();
        assert!(matches!(err, ProverError::InputFormat { .. }));
    }

    #[test]
    fn test_base64_is_compressed_bytes() {
        let proof = Proof::<Bn254>::new(Groth16Proof::default());
        let encoded = proof.to_base64().unwrap();
        assert_eq!(STANDARD.decode(&encoded).unwrap(), proof.to_bytes().unwrap());
        assert_eq!(Proof::<Bn254>::from_base64(&encoded).unwrap(), proof);
    }

    #[test]
    fn test_truncated_payload() {
        // valid base64, but too short for a proof
        let err = Proof::<Bn254>::from_base64(&STANDARD.encode([1u8, 2, 3])).unwrap_err();
        match err {
            ProverError::InputFormat { reason, .. } => assert!(reason.starts_with("proof:")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_artifacts_json() {
        let artifacts = ProofArtifacts {
            proof: "cHJvb2Y=".into(),
            primary_input: "aW5wdXQ=".into(),
        };
        let json = artifacts.to_json().unwrap();
        assert!(json.contains("\"primary_input\""));
        assert_eq!(ProofArtifacts::from_json(&json).unwrap(), artifacts);
    }
}
