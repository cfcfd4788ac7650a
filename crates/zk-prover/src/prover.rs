//! Key generation and proof generation

use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Instant;

use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use rand::{thread_rng, CryptoRng, RngCore};
use tracing::{debug, info, instrument};

use crate::backend::{ensure_ready, public_input_arity, Groth16Backend, KeyPair};
use crate::circuits::{EqualityGadget, MatchCircuitBuilder, MatchR1cs, TUPLE_WIDTH};
use crate::config::ProverConfig;
use crate::error::{ProverError, Result};
use crate::keystore::KeyStore;
use crate::proof::{PrimaryInput, ProofArtifacts};
use crate::types::{parse_tuples, RatioTuple};

/// Drives generate / prove / verify for one key prefix.
///
/// ```text
/// Uninitialized --generate_keys--> KeysGenerated --prove--> Proved --verify--> Verified | Rejected
/// ```
///
/// Keys are bound to the circuit shape (tuple count and gadget), so one
/// generation serves any number of proofs over different tuple values.
/// Proving or verifying before keys exist fails with a key file error.
#[derive(Clone, Debug)]
pub struct KeyLifecycleManager<E: Pairing = Bn254> {
    store: KeyStore,
    builder: MatchCircuitBuilder,
    _engine: PhantomData<E>,
}

impl<E: Pairing> KeyLifecycleManager<E> {
    /// Manager for keys under `prefix`, using the default gadget
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            store: KeyStore::new(prefix),
            builder: MatchCircuitBuilder::default(),
            _engine: PhantomData,
        }
    }

    pub fn from_config(config: &ProverConfig) -> Self {
        Self::new(config.key_prefix.clone()).with_gadget(config.gadget)
    }

    #[must_use]
    pub fn with_gadget(mut self, gadget: EqualityGadget) -> Self {
        self.builder = MatchCircuitBuilder::new(gadget);
        self
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.store
    }

    pub fn gadget(&self) -> EqualityGadget {
        self.builder.gadget()
    }

    fn build(&self, tuples: &[RatioTuple<E::ScalarField>]) -> Result<MatchR1cs<E::ScalarField>> {
        let start = Instant::now();
        let r1cs = self.builder.build(tuples)?;
        debug!("Circuit built and checked in {:?}", start.elapsed());
        Ok(r1cs)
    }

    /// Generate keys for the shape of `tuples` and persist them
    pub fn generate_keys(&self, tuples: &[RatioTuple<E::ScalarField>]) -> Result<KeyPair<E>> {
        self.generate_keys_with_rng(tuples, &mut thread_rng())
    }

    #[instrument(skip_all, fields(tuples = tuples.len(), prefix = %self.store.prefix().display()))]
    pub fn generate_keys_with_rng<R: RngCore + CryptoRng>(
        &self,
        tuples: &[RatioTuple<E::ScalarField>],
        rng: &mut R,
    ) -> Result<KeyPair<E>> {
        ensure_ready();
        self.store.ensure_writable()?;

        info!("Generating constraint keys ({} gadget)", self.gadget());
        let start = Instant::now();

        let r1cs = self.build(tuples)?;
        let keys = Groth16Backend::<E>::generate(r1cs, rng)?;
        self.store.save(&keys)?;

        info!("Constraint keys created in {:?}", start.elapsed());
        Ok(keys)
    }

    /// Prove that `tuples` satisfy the relation, using the stored proving key.
    ///
    /// Every proof is checked against the key's own verification half before it
    /// is returned, so keys generated with the other [`EqualityGadget`] fail
    /// here with [`ProverError::KeyFile`] instead of yielding a proof that can
    /// never verify.
    pub fn prove(&self, tuples: &[RatioTuple<E::ScalarField>]) -> Result<ProofArtifacts> {
        self.prove_with_rng(tuples, &mut thread_rng())
    }

    #[instrument(skip_all, fields(tuples = tuples.len(), prefix = %self.store.prefix().display()))]
    pub fn prove_with_rng<R: RngCore + CryptoRng>(
        &self,
        tuples: &[RatioTuple<E::ScalarField>],
        rng: &mut R,
    ) -> Result<ProofArtifacts> {
        ensure_ready();
        let proving_key = self.store.load_proving_key::<E>()?;

        let r1cs = self.build(tuples)?;
        let expected = public_input_arity(&proving_key.vk);
        if r1cs.primary_input.len() != expected {
            return Err(ProverError::input(
                format!("{} tuples", tuples.len()),
                format!(
                    "keys at {} were generated for {} tuples",
                    self.store.prefix().display(),
                    expected.saturating_sub(1) / TUPLE_WIDTH
                ),
            ));
        }

        let start = Instant::now();
        let primary_input = PrimaryInput::new(r1cs.primary_input.clone());
        let proof = Groth16Backend::<E>::prove(&proving_key, r1cs, rng)?;

        // the circuit passed its own check, so a proof the key rejects means the
        // keys were generated for a different constraint layout
        if !Groth16Backend::<E>::verify(&proving_key.vk, primary_input.as_slice(), &proof)? {
            return Err(ProverError::key_file(
                self.store.proving_key_path().display().to_string(),
                format!("keys do not match the {} equality gadget", self.gadget()),
            ));
        }

        let artifacts = ProofArtifacts {
            proof: proof.to_base64()?,
            primary_input: primary_input.to_base64()?,
        };
        let fingerprint = proof.to_hex()?;
        info!(
            fingerprint = %&fingerprint[..16.min(fingerprint.len())],
            "Proof generated in {:?}",
            start.elapsed()
        );
        Ok(artifacts)
    }
}

/// Generate keys under `prefix` from a command line tuple list
pub fn generate_match_keys(config: &ProverConfig, csv: &str) -> Result<()> {
    let tuples = parse_tuples(csv)?;
    KeyLifecycleManager::<Bn254>::from_config(config).generate_keys(&tuples)?;
    Ok(())
}

/// Prove a command line tuple list against the keys under `prefix`
pub fn prove_match(config: &ProverConfig, csv: &str) -> Result<ProofArtifacts> {
    let tuples = parse_tuples(csv)?;
    KeyLifecycleManager::<Bn254>::from_config(config).prove(&tuples)
}
