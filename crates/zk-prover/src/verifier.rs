//! Proof verification

use std::marker::PhantomData;
use std::path::PathBuf;

use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use ark_ff::One;
use tracing::{info, instrument, warn};

use crate::backend::{ensure_ready, public_input_arity, Groth16Backend};
use crate::config::ProverConfig;
use crate::error::{ProverError, Result};
use crate::keystore::KeyStore;
use crate::proof::{PrimaryInput, Proof};
use crate::prover::KeyLifecycleManager;

/// Verifier side: needs only the verification key file and the artifacts
/// produced by the prover, never the tuples themselves.
#[derive(Clone, Debug)]
pub struct MatchVerifier<E: Pairing = Bn254> {
    store: KeyStore,
    _engine: PhantomData<E>,
}

impl<E: Pairing> MatchVerifier<E> {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self::with_store(KeyStore::new(prefix))
    }

    pub fn with_store(store: KeyStore) -> Self {
        Self {
            store,
            _engine: PhantomData,
        }
    }

    /// Verify base64 artifacts.
    ///
    /// A proof that does not check out is `Ok(false)`. Errors are reserved for
    /// missing or corrupt keys and malformed inputs, all detected before the
    /// backend is called.
    #[instrument(skip_all, fields(prefix = %self.store.prefix().display()))]
    pub fn verify(&self, encoded_proof: &str, encoded_primary_input: &str) -> Result<bool> {
        ensure_ready();
        let verifying_key = self.store.load_verifying_key::<E>()?;
        let proof = Proof::<E>::from_base64(encoded_proof)?;
        let primary_input = PrimaryInput::<E::ScalarField>::from_base64(encoded_primary_input)?;

        let expected = public_input_arity(&verifying_key);
        if primary_input.len() != expected {
            return Err(ProverError::input(
                encoded_primary_input,
                format!(
                    "primary input has {} values, verification key expects {expected}",
                    primary_input.len()
                ),
            ));
        }

        self.verify_decoded(&verifying_key, &primary_input, &proof)
    }

    fn verify_decoded(
        &self,
        verifying_key: &ark_groth16::VerifyingKey<E>,
        primary_input: &PrimaryInput<E::ScalarField>,
        proof: &Proof<E>,
    ) -> Result<bool> {
        // `out` is public; a proof for any other value says nothing about the tuples
        if !primary_input.out().is_some_and(|out| out.is_one()) {
            warn!("Rejected: output slot of primary input is not one");
            return Ok(false);
        }

        let is_valid = Groth16Backend::<E>::verify(verifying_key, primary_input.as_slice(), proof)?;
        if is_valid {
            info!("Proof verified");
        } else {
            warn!("Proof rejected");
        }

        Ok(is_valid)
    }
}

impl<E: Pairing> KeyLifecycleManager<E> {
    /// Verify artifacts against the verification key under this manager's prefix
    pub fn verify(&self, encoded_proof: &str, encoded_primary_input: &str) -> Result<bool> {
        MatchVerifier::<E>::with_store(self.key_store().clone())
            .verify(encoded_proof, encoded_primary_input)
    }
}

/// Verify base64 artifacts against the keys under `config.key_prefix`
pub fn verify_match(config: &ProverConfig, encoded_proof: &str, encoded_primary_input: &str) -> Result<bool> {
    MatchVerifier::<Bn254>::new(config.key_prefix.clone()).verify(encoded_proof, encoded_primary_input)
}
