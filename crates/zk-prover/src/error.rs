//! Error types for the match prover

use thiserror::Error;

/// Result type alias for prover operations
pub type Result<T> = std::result::Result<T, ProverError>;

/// Errors that can occur while building, proving or verifying.
///
/// A proof that fails verification is not an error: `verify` returns
/// `Ok(false)` for it.
#[derive(Error, Debug)]
pub enum ProverError {
    /// Malformed caller input: integer lists, base64 payloads, tuple counts
    #[error("Invalid input `{input}`: {reason}")]
    InputFormat { input: String, reason: String },

    /// The builder produced a constraint system that fails its own check
    #[error("Constraint system construction defect: {reason}")]
    ConstraintBuild { reason: String },

    /// The supplied tuples do not satisfy the ratio relation
    #[error("Ratio relation does not hold (constraint {constraint} unsatisfied)")]
    RelationNotSatisfied { constraint: usize },

    /// Missing, unreadable or corrupt key file
    #[error("Key file {path}: {reason}")]
    KeyFile { path: String, reason: String },

    /// Setup or proving failed inside the SNARK backend
    #[error("Backend failure: {reason}")]
    Backend { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {key} = {value} (expected {expected})")]
    Config {
        key: String,
        value: String,
        expected: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arkworks error
    #[error("Cryptographic error: {0}")]
    ArkError(String),
}

impl ProverError {
    pub(crate) fn input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn key_file(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::KeyFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<ark_serialize::SerializationError> for ProverError {
    fn from(e: ark_serialize::SerializationError) -> Self {
        Self::ArkError(e.to_string())
    }
}

impl From<ark_relations::r1cs::SynthesisError> for ProverError {
    fn from(e: ark_relations::r1cs::SynthesisError) -> Self {
        Self::Backend {
            reason: e.to_string(),
        }
    }
}
