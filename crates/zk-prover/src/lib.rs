//! # Match ZK-SNARK Prover
//!
//! Groth16 proofs that ratio relations `i * (n / d) = r` hold for a set of
//! tuples, without revealing how the prover arrived at them.
//!
//! ## Pipeline
//!
//! ```text
//! tuples -> MatchCircuitBuilder -> MatchR1cs (constraints + witness)
//!        -> validate -> KeyLifecycleManager -> base64 keys / proofs
//! ```
//!
//! The circuit is built by this crate as a plain R1CS ([`r1cs`], [`circuits`]);
//! key generation, proving and verification are delegated to `ark-groth16`
//! ([`backend`]).
//!
//! ## Example
//!
//! ```rust,ignore
//! use match_zk_prover::{parse_tuples, KeyLifecycleManager};
//!
//! let manager = KeyLifecycleManager::<ark_bn254::Bn254>::new("build/");
//! let tuples = parse_tuples("5,2,1,10,2,5,2,5,3,7,3,7")?;
//!
//! manager.generate_keys(&tuples)?;
//! let artifacts = manager.prove(&tuples)?;
//! assert!(manager.verify(&artifacts.proof, &artifacts.primary_input)?);
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod backend;
pub mod circuits;
pub mod config;
pub mod error;
pub mod keystore;
pub mod proof;
pub mod prover;
pub mod r1cs;
pub mod types;
pub mod verifier;

// Re-exports
pub use backend::{ensure_ready, KeyPair};
pub use circuits::{build_match_r1cs, EqualityGadget, MatchCircuitBuilder, MatchR1cs};
pub use config::ProverConfig;
pub use error::{ProverError, Result};
pub use keystore::{KeyStore, PROVING_KEY_SUFFIX, VERIFYING_KEY_SUFFIX};
pub use proof::{PrimaryInput, Proof, ProofArtifacts};
pub use prover::{generate_match_keys, prove_match, KeyLifecycleManager};
pub use r1cs::{validate, ValidationError};
pub use types::{extract_ints, parse_tuples, RatioTuple};
pub use verifier::{verify_match, MatchVerifier};
