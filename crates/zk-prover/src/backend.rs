//! Groth16 backend adapter
//!
//! Key generation, proving and verification are delegated to `ark-groth16`.
//! Callers go through [`ensure_ready`] first; it is idempotent and runs its
//! initialization once per process regardless of which operation comes first.

use std::marker::PhantomData;
use std::sync::OnceLock;
use std::time::Instant;

use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_snark::SNARK;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info};

use crate::circuits::MatchR1cs;
use crate::error::{ProverError, Result};
use crate::proof::Proof;

/// Process-wide backend facts, fixed at first use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    pub proof_system: &'static str,
    /// Worker threads available to the backend
    pub threads: usize,
}

static BACKEND: OnceLock<BackendInfo> = OnceLock::new();

/// Initialize backend state on first call, return it on every call
pub fn ensure_ready() -> &'static BackendInfo {
    BACKEND.get_or_init(|| {
        #[cfg(feature = "parallel")]
        let threads = rayon::current_num_threads();
        #[cfg(not(feature = "parallel"))]
        let threads = 1;

        let info = BackendInfo {
            proof_system: "groth16",
            threads,
        };
        info!(proof_system = info.proof_system, threads, "SNARK backend ready");
        info
    })
}

/// Proving and verification keys for one constraint-system shape
#[derive(Clone, Debug, PartialEq)]
pub struct KeyPair<E: Pairing = Bn254> {
    pub proving_key: ProvingKey<E>,
    pub verifying_key: VerifyingKey<E>,
}

/// Number of public inputs a verifying key accepts
pub fn public_input_arity<E: Pairing>(vk: &VerifyingKey<E>) -> usize {
    vk.gamma_abc_g1.len().saturating_sub(1)
}

/// Thin wrapper over `Groth16<E>`
pub struct Groth16Backend<E: Pairing = Bn254> {
    _engine: PhantomData<E>,
}

impl<E: Pairing> Groth16Backend<E> {
    /// Circuit-specific setup
    pub fn generate<R: RngCore + CryptoRng>(
        circuit: MatchR1cs<E::ScalarField>,
        rng: &mut R,
    ) -> Result<KeyPair<E>> {
        let start = Instant::now();
        let (proving_key, verifying_key) = Groth16::<E>::circuit_specific_setup(circuit, rng)
            .map_err(|e| ProverError::Backend {
                reason: format!("setup: {e}"),
            })?;
        debug!("Groth16 setup in {:?}", start.elapsed());

        Ok(KeyPair {
            proving_key,
            verifying_key,
        })
    }

    pub fn prove<R: RngCore + CryptoRng>(
        proving_key: &ProvingKey<E>,
        circuit: MatchR1cs<E::ScalarField>,
        rng: &mut R,
    ) -> Result<Proof<E>> {
        let start = Instant::now();
        let proof = Groth16::<E>::prove(proving_key, circuit, rng).map_err(|e| {
            ProverError::Backend {
                reason: format!("prove: {e}"),
            }
        })?;
        debug!("Groth16 prove in {:?}", start.elapsed());

        Ok(Proof::new(proof))
    }

    /// `Ok(false)` for a well-formed proof that does not verify
    pub fn verify(
        verifying_key: &VerifyingKey<E>,
        public_inputs: &[E::ScalarField],
        proof: &Proof<E>,
    ) -> Result<bool> {
        Groth16::<E>::verify(verifying_key, public_inputs, &proof.inner).map_err(|e| {
            ProverError::Backend {
                reason: format!("verify: {e}"),
            }
        })
    }
}
