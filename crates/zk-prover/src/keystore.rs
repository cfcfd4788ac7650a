//! On-disk key material
//!
//! Keys live in two files named by appending fixed suffixes to a caller
//! supplied prefix, so `keys/` gives `keys/match_zkSNARK.pk` and a prefix of
//! `/tmp/run1_` gives `/tmp/run1_match_zkSNARK.pk`. File contents are the
//! base64 text of the canonical (uncompressed) key serialization.
//!
//! Writes are not coordinated: two processes generating keys under the same
//! prefix race, and the last writer wins. Callers sharing a prefix must lock
//! around [`KeyStore::save`].

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use ark_ec::pairing::Pairing;
use ark_groth16::{ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, Compress};
use tracing::{debug, warn};

use crate::backend::KeyPair;
use crate::error::{ProverError, Result};
use crate::proof::{from_base64, to_base64};

/// Suffix of the proving key file
pub const PROVING_KEY_SUFFIX: &str = "match_zkSNARK.pk";

/// Suffix of the verification key file
pub const VERIFYING_KEY_SUFFIX: &str = "match_zkSNARK.vk";

/// Location of one key pair on disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyStore {
    prefix: PathBuf,
}

impl KeyStore {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn proving_key_path(&self) -> PathBuf {
        self.with_suffix(PROVING_KEY_SUFFIX)
    }

    pub fn verifying_key_path(&self) -> PathBuf {
        self.with_suffix(VERIFYING_KEY_SUFFIX)
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path = OsString::from(self.prefix.as_os_str());
        path.push(suffix);
        PathBuf::from(path)
    }

    /// Both key files exist
    pub fn keys_present(&self) -> bool {
        self.proving_key_path().is_file() && self.verifying_key_path().is_file()
    }

    /// Fail unless the key files' directory exists
    pub fn ensure_writable(&self) -> Result<()> {
        let path = self.proving_key_path();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if dir.is_dir() {
            Ok(())
        } else {
            Err(ProverError::key_file(
                path.display().to_string(),
                format!("directory {} does not exist", dir.display()),
            ))
        }
    }

    /// Write both keys as base64 text.
    ///
    /// Both keys are encoded before anything touches the disk. If the
    /// verification key cannot be written the new proving key is removed, so
    /// the prefix never holds a proving key without its verification key.
    pub fn save<E: Pairing>(&self, keys: &KeyPair<E>) -> Result<()> {
        let proving_key = to_base64(&keys.proving_key, Compress::No)?;
        let verifying_key = to_base64(&keys.verifying_key, Compress::No)?;

        let pk_path = self.proving_key_path();
        self.write(&pk_path, &proving_key)?;
        if let Err(e) = self.write(&self.verifying_key_path(), &verifying_key) {
            if let Err(cleanup) = fs::remove_file(&pk_path) {
                warn!("Could not remove {}: {cleanup}", pk_path.display());
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn load_proving_key<E: Pairing>(&self) -> Result<ProvingKey<E>> {
        self.read(&self.proving_key_path())
    }

    pub fn load_verifying_key<E: Pairing>(&self) -> Result<VerifyingKey<E>> {
        self.read(&self.verifying_key_path())
    }

    fn write(&self, path: &Path, encoded: &str) -> Result<()> {
        fs::write(path, encoded).map_err(|e| ProverError::key_file(path.display().to_string(), e))?;
        debug!("Wrote {} bytes of base64 to {}", encoded.len(), path.display());
        Ok(())
    }

    fn read<T: CanonicalDeserialize>(&self, path: &Path) -> Result<T> {
        let encoded =
            fs::read_to_string(path).map_err(|e| ProverError::key_file(path.display().to_string(), e))?;
        debug!("Loading key from: {}", path.display());

        from_base64(&encoded, Compress::No)
            .map_err(|e| ProverError::key_file(path.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_paths_append_suffix() {
        let store = KeyStore::new("build/");
        assert_eq!(store.proving_key_path(), PathBuf::from("build/match_zkSNARK.pk"));
        assert_eq!(store.verifying_key_path(), PathBuf::from("build/match_zkSNARK.vk"));

        let store = KeyStore::new("/tmp/run1_");
        assert_eq!(store.proving_key_path(), PathBuf::from("/tmp/run1_match_zkSNARK.pk"));
    }

    #[test]
    fn test_ensure_writable() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefix = dir.path().as_os_str().to_owned();
        prefix.push("/");
        assert!(KeyStore::new(prefix).ensure_writable().is_ok());
        assert!(KeyStore::new("").ensure_writable().is_ok());

        let missing = dir.path().join("missing").join("keys_");
        let err = KeyStore::new(missing).ensure_writable().unwrap_err();
        assert!(matches!(err, ProverError::KeyFile { .. }));
    }

    #[test]
    fn test_missing_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("none_"));
        assert!(!store.keys_present());

        let err = store.load_verifying_key::<ark_bn254::Bn254>().unwrap_err();
        match err {
            ProverError::KeyFile { path, .. } => assert!(path.ends_with("none_match_zkSNARK.vk")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("bad_"));
        fs::write(store.verifying_key_path(), "this is not base64!").unwrap();

        let err = store.load_verifying_key::<ark_bn254::Bn254>().unwrap_err();
        assert!(matches!(err, ProverError::KeyFile { .. }));
    }

    #[test]
    fn test_failed_verifying_key_write_leaves_no_proving_key() {
        use ark_bn254::{Bn254, Fr};
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        use crate::backend::Groth16Backend;
        use crate::circuits::build_match_r1cs;
        use crate::types::RatioTuple;

        let r1cs = build_match_r1cs(&[RatioTuple::<Fr>::from_ints(10, 4, 2, 20)]).unwrap();
        let keys = Groth16Backend::<Bn254>::generate(r1cs, &mut StdRng::seed_from_u64(3)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("blocked_"));
        // a directory where the verification key file should go
        fs::create_dir(store.verifying_key_path()).unwrap();

        let err = store.save(&keys).unwrap_err();
        assert!(matches!(err, ProverError::KeyFile { .. }));
        assert!(!store.proving_key_path().exists());
        assert!(!store.keys_present());
    }
}
